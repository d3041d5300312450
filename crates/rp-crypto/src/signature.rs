//! Digital signature verification.

use aws_lc_rs::signature::{
    self, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED, ECDSA_P384_SHA384_FIXED,
    ECDSA_P521_SHA512_FIXED, RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
    RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
};
use thiserror::Error;

use crate::algorithm::VerificationAlgorithm;

/// Error type for signature operations.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// Invalid key format.
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// Invalid certificate.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Invalid signature encoding.
    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(String),
}

/// Verifies a signature over `data`.
///
/// `public_key` is either a DER `RSAPublicKey` (RSA) or an uncompressed EC
/// point (ECDSA), which is what [`crate::public_key_from_certificate`]
/// returns.
///
/// Returns `Ok(false)` when the signature does not verify under the key.
///
/// # Errors
///
/// Returns an error if the key or signature is empty.
pub fn verify_signature(
    public_key: &[u8],
    data: &[u8],
    sig: &[u8],
    algorithm: VerificationAlgorithm,
) -> Result<bool, SignatureError> {
    if public_key.is_empty() {
        return Err(SignatureError::InvalidKey("empty public key".to_string()));
    }
    if sig.is_empty() {
        return Err(SignatureError::InvalidEncoding("empty signature value".to_string()));
    }

    let verification_alg: &dyn signature::VerificationAlgorithm = match algorithm {
        VerificationAlgorithm::RsaPkcs1Sha1 => &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
        VerificationAlgorithm::RsaPkcs1Sha256 => &RSA_PKCS1_2048_8192_SHA256,
        VerificationAlgorithm::RsaPkcs1Sha384 => &RSA_PKCS1_2048_8192_SHA384,
        VerificationAlgorithm::RsaPkcs1Sha512 => &RSA_PKCS1_2048_8192_SHA512,
        VerificationAlgorithm::EcdsaP256Sha256 => &ECDSA_P256_SHA256_FIXED,
        VerificationAlgorithm::EcdsaP384Sha384 => &ECDSA_P384_SHA384_FIXED,
        VerificationAlgorithm::EcdsaP521Sha512 => &ECDSA_P521_SHA512_FIXED,
    };

    let public_key = UnparsedPublicKey::new(verification_alg, public_key);

    match public_key.verify(data, sig) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}
