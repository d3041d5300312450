//! SAML 2.0 token object model.
//!
//! These types are what the external XML layer produces after unmarshalling
//! an assertion. They carry no validation logic of their own; see
//! [`crate::validation`].

mod assertion;
mod authn_request;
mod conditions;
mod constants;
mod name_id;
mod qname;
mod statements;

pub use assertion::*;
pub use authn_request::*;
pub use conditions::*;
pub use constants::*;
pub use name_id::*;
pub use qname::*;
pub use statements::*;
