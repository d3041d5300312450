//! Reference digests.

use aws_lc_rs::{constant_time, digest};

use crate::algorithm::HashAlgorithm;

/// Computes a hash of the input data.
#[must_use]
pub fn hash(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        HashAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        HashAlgorithm::Sha256 => &digest::SHA256,
        HashAlgorithm::Sha384 => &digest::SHA384,
        HashAlgorithm::Sha512 => &digest::SHA512,
    };

    digest::digest(alg, data).as_ref().to_vec()
}

/// Compares two digests in constant time.
#[must_use]
pub fn digests_match(expected: &[u8], actual: &[u8]) -> bool {
    constant_time::verify_slices_are_equal(expected, actual).is_ok()
}
