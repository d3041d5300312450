//! Public key material handling.
//!
//! Identity providers publish their signing keys as X.509 certificates,
//! usually PEM encoded in metadata or configuration files.

use base64::Engine;
use x509_parser::prelude::*;

use crate::signature::SignatureError;

/// Extracts the DER body of the first `CERTIFICATE` block in a PEM string.
///
/// # Errors
///
/// Returns an error if no certificate block is present or the body is not
/// valid base64.
pub fn certificate_der_from_pem(pem: &str) -> Result<Vec<u8>, SignatureError> {
    const BEGIN: &str = "-----BEGIN CERTIFICATE-----";
    const END: &str = "-----END CERTIFICATE-----";

    let start = pem
        .find(BEGIN)
        .ok_or_else(|| SignatureError::InvalidCertificate("no PEM certificate block".to_string()))?
        + BEGIN.len();
    let end = pem[start..]
        .find(END)
        .ok_or_else(|| SignatureError::InvalidCertificate("unterminated PEM block".to_string()))?
        + start;

    let b64_data: String = pem[start..end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD
        .decode(b64_data)
        .map_err(|e| SignatureError::InvalidCertificate(format!("invalid PEM body: {e}")))
}

/// Extracts the subject public key from a DER X.509 certificate.
///
/// The returned bytes are in the form [`crate::verify_signature`] expects:
/// a DER `RSAPublicKey` for RSA keys, an uncompressed point for EC keys.
///
/// # Errors
///
/// Returns an error if the certificate cannot be parsed.
pub fn public_key_from_certificate(cert_der: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| SignatureError::InvalidCertificate(format!("failed to parse certificate: {e}")))?;

    Ok(cert.public_key().subject_public_key.data.to_vec())
}
