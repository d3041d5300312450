//! Signature trust evaluation.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{SamlError, SamlResult};

use super::{CriteriaSet, UsageType, XmlSignature};

/// Decides whether a signature was made by a trusted key.
///
/// Implementations are shared across concurrent validations and must be
/// safe for concurrent read-only use.
pub trait TrustEngine: Send + Sync {
    /// Evaluates `signature` against `criteria`.
    ///
    /// Returns `Ok(false)` when the signature is not trusted.
    ///
    /// # Errors
    ///
    /// Returns an error when trust cannot be evaluated at all, for example
    /// because no credential is known for the signer, or when the reference
    /// digest does not cover the referenced content.
    fn validate(&self, signature: &XmlSignature, criteria: &CriteriaSet) -> SamlResult<bool>;
}

/// A trusted verification key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Entity the key belongs to. `None` matches any entity.
    pub entity_id: Option<String>,
    /// Declared usage of the key.
    pub usage: UsageType,
    /// Public key in the form [`rp_crypto::verify_signature`] expects.
    pub public_key: Vec<u8>,
}

impl Credential {
    /// Creates a signing credential from a raw public key.
    #[must_use]
    pub fn from_public_key(entity_id: impl Into<String>, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            entity_id: Some(entity_id.into()),
            usage: UsageType::Signing,
            public_key: public_key.into(),
        }
    }

    /// Creates a signing credential from a DER encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate cannot be parsed.
    pub fn from_certificate_der(entity_id: impl Into<String>, cert_der: &[u8]) -> SamlResult<Self> {
        let public_key = rp_crypto::public_key_from_certificate(cert_der)?;
        Ok(Self::from_public_key(entity_id, public_key))
    }

    /// Creates a signing credential from a PEM encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the PEM or the certificate cannot be parsed.
    pub fn from_certificate_pem(entity_id: impl Into<String>, pem: &str) -> SamlResult<Self> {
        let der = rp_crypto::certificate_der_from_pem(pem)?;
        Self::from_certificate_der(entity_id, &der)
    }

    /// Overrides the declared usage.
    #[must_use]
    pub const fn with_usage(mut self, usage: UsageType) -> Self {
        self.usage = usage;
        self
    }

    /// Returns true if this credential satisfies `criteria`.
    #[must_use]
    pub fn matches(&self, criteria: &CriteriaSet) -> bool {
        let entity_matches = match (&self.entity_id, criteria.entity_id()) {
            (Some(own), Some(wanted)) => own == wanted,
            _ => true,
        };
        let usage_matches = criteria
            .usage()
            .map_or(true, |required| self.usage.permits(required));
        entity_matches && usage_matches
    }
}

/// Resolves trusted credentials for a set of criteria.
pub trait CredentialResolver: Send + Sync {
    /// Returns the credentials matching `criteria`, possibly none.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying credential source fails.
    fn resolve(&self, criteria: &CriteriaSet) -> SamlResult<Vec<Credential>>;
}

/// A fixed list of credentials.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialResolver {
    credentials: Vec<Credential>,
}

impl StaticCredentialResolver {
    /// Creates a resolver over the given credentials.
    #[must_use]
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Adds a credential.
    #[must_use]
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credentials.push(credential);
        self
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn resolve(&self, criteria: &CriteriaSet) -> SamlResult<Vec<Credential>> {
        Ok(self
            .credentials
            .iter()
            .filter(|credential| credential.matches(criteria))
            .cloned()
            .collect())
    }
}

/// Trusts a signature only if its reference digest matches the referenced
/// content and it verifies under an explicitly configured key.
#[derive(Clone)]
pub struct ExplicitKeyTrustEngine {
    resolver: Arc<dyn CredentialResolver>,
}

impl std::fmt::Debug for ExplicitKeyTrustEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplicitKeyTrustEngine").finish_non_exhaustive()
    }
}

impl ExplicitKeyTrustEngine {
    /// Creates a trust engine backed by `resolver`.
    pub fn new(resolver: impl CredentialResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Creates a trust engine sharing an existing resolver.
    #[must_use]
    pub fn from_shared(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { resolver }
    }
}

impl TrustEngine for ExplicitKeyTrustEngine {
    fn validate(&self, signature: &XmlSignature, criteria: &CriteriaSet) -> SamlResult<bool> {
        let credentials = self.resolver.resolve(criteria)?;
        if credentials.is_empty() {
            return Err(SamlError::TrustEngine(format!(
                "No trusted credentials for entity '{}'",
                criteria.entity_id().unwrap_or("<unspecified>")
            )));
        }

        signature.verify_digest()?;

        let signature_value = signature.signature_bytes()?;
        let signed_info = signature.signed_info_bytes();
        let algorithm = signature.algorithm.verification_algorithm();

        for credential in &credentials {
            match rp_crypto::verify_signature(
                &credential.public_key,
                &signed_info,
                &signature_value,
                algorithm,
            ) {
                Ok(true) => {
                    debug!(entity_id = ?credential.entity_id, "Signature verified");
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => warn!(entity_id = ?credential.entity_id, error = %e, "Skipping unusable credential"),
            }
        }

        debug!(
            candidates = credentials.len(),
            "Signature did not verify under any trusted credential"
        );
        Ok(false)
    }
}
