//! Assertion validation engine.
//!
//! Every validator answers with a tri-state [`ValidationResult`] and leaves
//! a human readable reason on the [`ValidationContext`] when the answer is
//! not [`ValidationResult::Valid`].
//!
//! The main entry point is [`AssertionValidator`], which runs an ordered
//! pipeline of checks and stops at the first one that does not pass. Subject
//! confirmations, conditions and statements are delegated to pluggable
//! sub-validators held in [`ValidatorRegistry`] instances.
//!
//! # Example
//!
//! ```rust,ignore
//! use rp_saml::validation::{AssertionValidator, ValidationContext, ValidationParams};
//!
//! let validator = AssertionValidator::with_defaults(Some(trust_engine), Some(prevalidator));
//! let mut ctx = ValidationContext::new(
//!     ValidationParams::new().with_expected_issuer("https://idp.example.org"),
//! );
//! if !validator.validate(&assertion, &mut ctx).is_valid() {
//!     tracing::warn!(reason = ?ctx.message(), "Assertion rejected");
//! }
//! ```

mod assertion;
mod authn_statement;
mod conditions;
mod context;
mod params;
pub mod policy;
mod registry;
mod replay;
mod signable;
mod subject_confirmation;
pub mod support;

pub use assertion::*;
pub use authn_statement::*;
pub use conditions::*;
pub use context::*;
pub use params::*;
pub use registry::*;
pub use replay::*;
pub use signable::*;
pub use subject_confirmation::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationResult {
    /// The object satisfies every applicable rule.
    Valid,
    /// The object violates a rule and must be rejected.
    Invalid,
    /// No decision could be reached, usually because of a configuration gap.
    Indeterminate,
}

impl ValidationResult {
    /// Returns true for [`ValidationResult::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the result name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
            Self::Indeterminate => "INDETERMINATE",
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validates objects of type `T`.
///
/// Implementations hold no per-call state and may be shared across threads.
pub trait ObjectValidator<T: ?Sized>: Send + Sync {
    /// Validates `object`, reading policy from and writing outputs to `ctx`.
    fn validate(&self, object: &T, ctx: &mut ValidationContext) -> ValidationResult;
}
