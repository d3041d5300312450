//! SAML 2.0 assertion validation for relying parties.
//!
//! This crate decides whether a SAML assertion received from an identity
//! provider should be trusted:
//!
//! - **Assertion pipeline** - ID, version, issue instant, issuer, signature,
//!   subject confirmation, conditions and statements, in that order
//! - **Signature trust** - profile checks and pluggable trust engines
//! - **Pluggable sub-validators** - subject confirmation methods, conditions
//!   and statements dispatched by element name or schema type
//! - **Authentication statements** - force-authn and SSO session age policy
//!
//! # Architecture
//!
//! - [`types`] - The assertion object model handed over by the XML layer
//! - [`signature`] - Signature form checks and trust evaluation
//! - [`validation`] - Validation context, pipeline and sub-validators
//! - [`config`] - Deployment settings from TOML or environment
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rp_saml::config::ValidatorSettings;
//! use rp_saml::signature::{Credential, ExplicitKeyTrustEngine, StaticCredentialResolver};
//! use rp_saml::validation::{AssertionValidator, ValidationContext};
//!
//! let settings = ValidatorSettings::from_env()?;
//! let engine = ExplicitKeyTrustEngine::new(StaticCredentialResolver::new(vec![
//!     Credential::from_certificate_pem("https://idp.example.org", IDP_CERT)?,
//! ]));
//! let validator = AssertionValidator::with_defaults(
//!     Some(Arc::new(engine)),
//!     Some(Arc::new(settings.prevalidator())),
//! );
//!
//! let mut ctx = ValidationContext::new(settings.to_params());
//! let result = validator.validate(&assertion, &mut ctx);
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Profiles](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod signature;
pub mod types;
pub mod validation;

pub use error::{SamlError, SamlResult};
pub use types::*;
pub use validation::{AssertionValidator, ValidationContext, ValidationParams, ValidationResult};
