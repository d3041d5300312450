//! Signature form checks performed before trust evaluation.

use tracing::debug;

use crate::error::{SamlError, SamlResult};

use super::XmlSignature;

/// Checks that a signature is structurally acceptable.
///
/// A prevalidator says nothing about who made the signature; that is the
/// [`TrustEngine`](super::TrustEngine)'s job.
pub trait SignaturePrevalidator: Send + Sync {
    /// Validates the form of `signature`, which signs the object with ID
    /// `object_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SignatureInvalid`] describing the first defect.
    fn validate(&self, signature: &XmlSignature, object_id: &str) -> SamlResult<()>;
}

/// Enforces the SAML 2.0 XML Signature profile.
///
/// - the reference must be empty or point at the signed object's ID;
/// - canonicalization must be exclusive C14N;
/// - SHA-1 based algorithms are rejected unless allowed.
#[derive(Debug, Clone, Default)]
pub struct SamlSignatureProfileValidator {
    allow_sha1: bool,
}

impl SamlSignatureProfileValidator {
    /// Creates a profile validator that rejects SHA-1.
    #[must_use]
    pub const fn new() -> Self {
        Self { allow_sha1: false }
    }

    /// Allows SHA-1 based signatures (not recommended).
    #[must_use]
    pub const fn allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }
}

impl SignaturePrevalidator for SamlSignatureProfileValidator {
    fn validate(&self, signature: &XmlSignature, object_id: &str) -> SamlResult<()> {
        let reference = signature.reference_uri.as_str();
        if !reference.is_empty() {
            match reference.strip_prefix('#') {
                Some(id) if id == object_id => {}
                Some(id) => {
                    return Err(SamlError::SignatureInvalid(format!(
                        "Signature reference '{id}' does not match object ID '{object_id}'"
                    )));
                }
                None => {
                    return Err(SamlError::SignatureInvalid(format!(
                        "Signature reference '{reference}' is not a same-document reference"
                    )));
                }
            }
        }

        if !signature.canonicalization.is_exclusive() {
            return Err(SamlError::SignatureInvalid(format!(
                "Canonicalization '{}' is not exclusive C14N",
                signature.canonicalization.uri()
            )));
        }

        if signature.algorithm.is_deprecated() && !self.allow_sha1 {
            return Err(SamlError::SignatureInvalid(
                "SHA-1 signatures are not allowed".to_string(),
            ));
        }

        debug!(object_id, algorithm = signature.algorithm.uri(), "Signature profile check passed");
        Ok(())
    }
}
