//! SAML error types.
//!
//! A validator reports an *invalid* or *indeterminate* assertion through a
//! [`ValidationResult`](crate::validation::ValidationResult). A [`SamlError`]
//! is reserved for failures that are not a verdict on the assertion: a
//! broken collaborator, undecodable key material, or bad configuration.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML processing errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// XML signature is malformed or could not be processed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Invalid assertion.
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),

    /// The trust engine could not evaluate a signature.
    #[error("trust engine error: {0}")]
    TrustEngine(String),

    /// A replay cache operation failed.
    #[error("replay cache error: {0}")]
    ReplayCache(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Cryptographic operation error.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Invalid validator configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SamlError {
    /// Returns true if the error originates from signature or key handling.
    #[must_use]
    pub const fn is_signature_error(&self) -> bool {
        matches!(
            self,
            Self::SignatureInvalid(_) | Self::TrustEngine(_) | Self::Crypto(_)
        )
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<rp_crypto::SignatureError> for SamlError {
    fn from(err: rp_crypto::SignatureError) -> Self {
        Self::Crypto(err.to_string())
    }
}

impl From<toml::de::Error> for SamlError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
