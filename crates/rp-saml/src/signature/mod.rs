//! XML Signature trust evaluation for SAML.
//!
//! The XML layer hands over each signature as an [`XmlSignature`]. Deciding
//! whether it is acceptable happens in two independent steps:
//!
//! - a [`SignaturePrevalidator`] checks the signature's *form* (reference,
//!   transforms, algorithms) against the SAML signature profile;
//! - a [`TrustEngine`] decides whether the signature was made by a key
//!   trusted for the criteria in a [`CriteriaSet`].
//!
//! # Signature Algorithms
//!
//! - RSA-SHA256, RSA-SHA384, RSA-SHA512
//! - ECDSA-SHA256, ECDSA-SHA384, ECDSA-SHA512
//!
//! Legacy RSA-SHA1 is understood but rejected by the profile validator
//! unless explicitly allowed.

mod criteria;
mod prevalidator;
mod trust;

pub use criteria::*;
pub use prevalidator::*;
pub use trust::*;

use std::borrow::Cow;

use base64::Engine;
use rp_crypto::{HashAlgorithm, VerificationAlgorithm};
use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};
use crate::types::{canonicalization_algorithms, digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
    /// Legacy RSA with SHA-1 (not recommended).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::EcdsaSha256 => signature_algorithms::ECDSA_SHA256,
            Self::EcdsaSha384 => signature_algorithms::ECDSA_SHA384,
            Self::EcdsaSha512 => signature_algorithms::ECDSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Returns the corresponding digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 | Self::EcdsaSha256 => digest_algorithms::SHA256,
            Self::RsaSha384 | Self::EcdsaSha384 => digest_algorithms::SHA384,
            Self::RsaSha512 | Self::EcdsaSha512 => digest_algorithms::SHA512,
            Self::RsaSha1 => digest_algorithms::SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::ECDSA_SHA256 => Some(Self::EcdsaSha256),
            signature_algorithms::ECDSA_SHA384 => Some(Self::EcdsaSha384),
            signature_algorithms::ECDSA_SHA512 => Some(Self::EcdsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Maps this XML-DSig algorithm to the verification primitive.
    #[must_use]
    pub const fn verification_algorithm(&self) -> VerificationAlgorithm {
        match self {
            Self::RsaSha256 => VerificationAlgorithm::RsaPkcs1Sha256,
            Self::RsaSha384 => VerificationAlgorithm::RsaPkcs1Sha384,
            Self::RsaSha512 => VerificationAlgorithm::RsaPkcs1Sha512,
            Self::EcdsaSha256 => VerificationAlgorithm::EcdsaP256Sha256,
            Self::EcdsaSha384 => VerificationAlgorithm::EcdsaP384Sha384,
            Self::EcdsaSha512 => VerificationAlgorithm::EcdsaP521Sha512,
            Self::RsaSha1 => VerificationAlgorithm::RsaPkcs1Sha1,
        }
    }

    /// Returns the digest algorithm paired with this signature algorithm.
    #[must_use]
    pub const fn hash_algorithm(&self) -> HashAlgorithm {
        self.verification_algorithm().hash_algorithm()
    }

    /// Computes the base64 `DigestValue` of canonical reference content.
    #[must_use]
    pub fn digest_value(&self, content: &[u8]) -> String {
        let digest = rp_crypto::hash(self.hash_algorithm(), content);
        base64::engine::general_purpose::STANDARD.encode(digest)
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }
}

impl TryFrom<String> for SignatureAlgorithm {
    type Error = SamlError;

    fn try_from(uri: String) -> Result<Self, Self::Error> {
        Self::from_uri(&uri)
            .ok_or_else(|| SamlError::SignatureInvalid(format!("unknown signature algorithm: {uri}")))
    }
}

impl From<SignatureAlgorithm> for String {
    fn from(algorithm: SignatureAlgorithm) -> Self {
        algorithm.uri().to_string()
    }
}

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments (recommended).
    #[default]
    ExclusiveC14N,
    /// Exclusive C14N with comments.
    ExclusiveC14NWithComments,
    /// C14N without comments.
    C14N,
    /// C14N with comments.
    C14NWithComments,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => canonicalization_algorithms::EXCLUSIVE_C14N,
            Self::ExclusiveC14NWithComments => {
                canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS
            }
            Self::C14N => canonicalization_algorithms::C14N,
            Self::C14NWithComments => canonicalization_algorithms::C14N_WITH_COMMENTS,
        }
    }

    /// Parses a canonicalization algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            canonicalization_algorithms::EXCLUSIVE_C14N => Some(Self::ExclusiveC14N),
            canonicalization_algorithms::EXCLUSIVE_C14N_WITH_COMMENTS => {
                Some(Self::ExclusiveC14NWithComments)
            }
            canonicalization_algorithms::C14N => Some(Self::C14N),
            canonicalization_algorithms::C14N_WITH_COMMENTS => Some(Self::C14NWithComments),
            _ => None,
        }
    }

    /// Returns true for the exclusive canonicalization variants.
    #[must_use]
    pub const fn is_exclusive(&self) -> bool {
        matches!(self, Self::ExclusiveC14N | Self::ExclusiveC14NWithComments)
    }
}

impl TryFrom<String> for CanonicalizationAlgorithm {
    type Error = SamlError;

    fn try_from(uri: String) -> Result<Self, Self::Error> {
        Self::from_uri(&uri).ok_or_else(|| {
            SamlError::SignatureInvalid(format!("unknown canonicalization algorithm: {uri}"))
        })
    }
}

impl From<CanonicalizationAlgorithm> for String {
    fn from(algorithm: CanonicalizationAlgorithm) -> Self {
        algorithm.uri().to_string()
    }
}

/// XML Signature structure.
///
/// Represents the `<ds:Signature>` element of a signed SAML object, as
/// extracted by the XML layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlSignature {
    /// The signature algorithm used.
    pub algorithm: SignatureAlgorithm,
    /// The canonicalization algorithm used.
    #[serde(default)]
    pub canonicalization: CanonicalizationAlgorithm,
    /// The reference URI (typically `#` followed by the signed element's ID).
    pub reference_uri: String,
    /// The digest value (base64 encoded).
    pub digest_value: String,
    /// The signature value (base64 encoded).
    pub signature_value: String,
    /// Optional X.509 certificate from `KeyInfo` (base64 encoded, DER format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x509_certificate: Option<String>,
    /// The canonicalized `SignedInfo` element, when the XML layer provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_info: Option<String>,
    /// The canonicalized element the reference points to, with the
    /// enveloped signature removed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_content: Option<String>,
}

impl XmlSignature {
    /// Creates a signature over the element with the given ID.
    #[must_use]
    pub fn new(
        algorithm: SignatureAlgorithm,
        reference_id: &str,
        digest_value: impl Into<String>,
        signature_value: impl Into<String>,
    ) -> Self {
        Self {
            algorithm,
            canonicalization: CanonicalizationAlgorithm::ExclusiveC14N,
            reference_uri: format!("#{reference_id}"),
            digest_value: digest_value.into(),
            signature_value: signature_value.into(),
            x509_certificate: None,
            signed_info: None,
            referenced_content: None,
        }
    }

    /// Attaches the canonical content the reference digest covers.
    #[must_use]
    pub fn with_referenced_content(mut self, content: impl Into<String>) -> Self {
        self.referenced_content = Some(content.into());
        self
    }

    /// Checks the reference `DigestValue` against the referenced content.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::SignatureInvalid`] if there is no referenced
    /// content, the digest is not valid base64, or the digests differ.
    pub fn verify_digest(&self) -> SamlResult<()> {
        let content = self.referenced_content.as_deref().ok_or_else(|| {
            SamlError::SignatureInvalid("No referenced content to digest".to_string())
        })?;
        let compact: String = self.digest_value.chars().filter(|c| !c.is_whitespace()).collect();
        let expected = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| SamlError::SignatureInvalid(format!("Invalid digest encoding: {e}")))?;
        let actual = rp_crypto::hash(self.algorithm.hash_algorithm(), content.as_bytes());

        if !rp_crypto::digests_match(&expected, &actual) {
            return Err(SamlError::SignatureInvalid("Digest value mismatch".to_string()));
        }
        Ok(())
    }

    /// Returns the bytes the signature value was computed over.
    ///
    /// Uses the canonical `SignedInfo` provided by the XML layer, or
    /// rebuilds it from the signature's fields.
    #[must_use]
    pub fn signed_info_bytes(&self) -> Cow<'_, [u8]> {
        match self.signed_info {
            Some(ref signed_info) => Cow::Borrowed(signed_info.as_bytes()),
            None => Cow::Owned(rebuild_signed_info(self).into_bytes()),
        }
    }

    /// Decodes the signature value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not valid base64.
    pub fn signature_bytes(&self) -> SamlResult<Vec<u8>> {
        let compact: String = self
            .signature_value
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| SamlError::SignatureInvalid(format!("Invalid signature encoding: {e}")))
    }
}

/// Rebuilds the canonical SignedInfo element for an enveloped signature.
#[must_use]
pub fn rebuild_signed_info(signature: &XmlSignature) -> String {
    format!(
        concat!(
            r#"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#,
            r#"<ds:CanonicalizationMethod Algorithm="{}"></ds:CanonicalizationMethod>"#,
            r#"<ds:SignatureMethod Algorithm="{}"></ds:SignatureMethod>"#,
            r#"<ds:Reference URI="{}">"#,
            r#"<ds:Transforms>"#,
            r#"<ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"></ds:Transform>"#,
            r#"<ds:Transform Algorithm="{}"></ds:Transform>"#,
            r#"</ds:Transforms>"#,
            r#"<ds:DigestMethod Algorithm="{}"></ds:DigestMethod>"#,
            r#"<ds:DigestValue>{}</ds:DigestValue>"#,
            r#"</ds:Reference>"#,
            r#"</ds:SignedInfo>"#,
        ),
        signature.canonicalization.uri(),
        signature.algorithm.uri(),
        signature.reference_uri,
        signature.canonicalization.uri(),
        signature.algorithm.digest_uri(),
        signature.digest_value
    )
}
