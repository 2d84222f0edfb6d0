use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Digest verification failed: expected {}, got {}",
        hex::encode(.expected),
        hex::encode(.actual)
    )]
    DigestMismatch { expected: Vec<u8>, actual: Vec<u8> },

    #[error("Unsupported digest {0}: only sha256 digests are supported")]
    UnsupportedAlgorithm(String),

    #[error("Malformed digest {0}")]
    MalformedDigest(String),
}

/// Expected content digest of a release asset, as published by the release
/// API in `sha256:<hex>` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetDigest(Vec<u8>);

impl AssetDigest {
    pub fn parse(raw: &str) -> Result<Self, VerificationError> {
        let Some((algorithm, hex_digest)) = raw.split_once(':') else {
            return Err(VerificationError::MalformedDigest(raw.to_string()));
        };
        if algorithm != "sha256" {
            return Err(VerificationError::UnsupportedAlgorithm(
                algorithm.to_string(),
            ));
        }
        let bytes = hex::decode(hex_digest)
            .map_err(|_| VerificationError::MalformedDigest(raw.to_string()))?;
        if bytes.len() != 32 {
            return Err(VerificationError::MalformedDigest(raw.to_string()));
        }
        Ok(Self(bytes))
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

pub struct AssetDigestVerifier {
    hasher: Sha256,
    expected_digest: Vec<u8>,
}

impl AssetDigestVerifier {
    #[inline]
    pub fn new(expected: &AssetDigest) -> Self {
        Self {
            hasher: Sha256::new(),
            expected_digest: expected.0.clone(),
        }
    }

    #[inline]
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        Digest::update(&mut self.hasher, data.as_ref());
    }

    pub fn verify(self) -> Result<(), VerificationError> {
        let actual_digest = self.hasher.finalize().to_vec();

        if actual_digest == self.expected_digest {
            Ok(())
        } else {
            Err(VerificationError::DigestMismatch {
                expected: self.expected_digest.clone(),
                actual: actual_digest,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str =
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_parse_valid_sha256_digest() {
        let digest = AssetDigest::parse(EMPTY_SHA256).unwrap();
        assert_eq!(
            digest.digest_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        let err = AssetDigest::parse("sha512:deadbeef").unwrap_err();
        assert!(matches!(err, VerificationError::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        let err = AssetDigest::parse("deadbeef").unwrap_err();
        assert!(matches!(err, VerificationError::MalformedDigest(_)));
    }

    #[test]
    fn test_parse_rejects_truncated_digest() {
        let err = AssetDigest::parse("sha256:deadbeef").unwrap_err();
        assert!(matches!(err, VerificationError::MalformedDigest(_)));
    }

    #[test]
    fn test_verifier_accepts_matching_content() {
        let digest = AssetDigest::parse(
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        )
        .unwrap();
        let mut verifier = AssetDigestVerifier::new(&digest);
        verifier.update(b"hello");
        assert!(verifier.verify().is_ok());
    }

    #[test]
    fn test_verifier_rejects_mismatched_content() {
        let digest = AssetDigest::parse(EMPTY_SHA256).unwrap();
        let mut verifier = AssetDigestVerifier::new(&digest);
        verifier.update(b"not empty");
        assert!(matches!(
            verifier.verify(),
            Err(VerificationError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_verifier_is_incremental() {
        let digest = AssetDigest::parse(
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
        )
        .unwrap();
        let mut verifier = AssetDigestVerifier::new(&digest);
        verifier.update(b"he");
        verifier.update(b"llo");
        assert!(verifier.verify().is_ok());
    }
}
