//! # rp-crypto
//!
//! Signature verification primitives for SAML relying parties, backed by
//! aws-lc-rs.
//!
//! XML-DSig still uses SHA-256 (and occasionally SHA-1) based algorithms, so
//! this crate exposes the full set of verification algorithms an identity
//! provider may sign with. Deciding whether a deprecated algorithm is
//! acceptable is left to the caller; see
//! [`VerificationAlgorithm::is_deprecated`].
//!
//! Only verification is provided, together with the reference digests it
//! depends on. Relying parties never sign assertions.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod hash;
pub mod keys;
pub mod signature;

pub use algorithm::{HashAlgorithm, VerificationAlgorithm};
pub use hash::{digests_match, hash};
pub use keys::{certificate_der_from_pem, public_key_from_certificate};
pub use signature::{verify_signature, SignatureError};
