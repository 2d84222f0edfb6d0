mod asset_digest;

pub use asset_digest::{AssetDigest, AssetDigestVerifier, VerificationError};
