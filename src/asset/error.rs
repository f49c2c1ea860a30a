//! Error types for asset loading and lookup

use thiserror::Error;

use super::AssetKey;

/// Failure of the asset source to produce an image.
///
/// Cloneable so that one failed load can be recorded in every batch that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// No asset exists under this key
    #[error("Asset '{key}' not found")]
    NotFound { key: AssetKey },
    /// The asset exists but could not be read
    #[error("Failed to read asset '{key}': {message}")]
    Io { key: AssetKey, message: String },
    /// The asset bytes are not a decodable image
    #[error("Failed to decode asset '{key}': {message}")]
    Decode { key: AssetKey, message: String },
    /// The decoded image does not have its category's canonical size
    #[error("Asset '{key}' is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}", actual_w = .actual.0, actual_h = .actual.1, expected_w = .expected.0, expected_h = .expected.1)]
    DimensionMismatch { key: AssetKey, actual: (u32, u32), expected: (u32, u32) },
}

impl LoadError {
    /// The key whose load failed.
    pub fn key(&self) -> &AssetKey {
        match self {
            LoadError::NotFound { key }
            | LoadError::Io { key, .. }
            | LoadError::Decode { key, .. }
            | LoadError::DimensionMismatch { key, .. } => key,
        }
    }
}

/// Error returned by [`ImageStore`](super::ImageStore) requests and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Lookup of an image that was never retained
    #[error("Image '{key}' is not loaded; retain it before use")]
    NotLoaded { key: AssetKey },
    /// Category missing from the catalog
    #[error("Unknown image category '{category}'")]
    UnknownCategory { category: String },
    /// Identifier not enumerated in its category
    #[error("'{identifier}' is not a known identifier in category '{category}'")]
    UnknownIdentifier { category: String, identifier: String },
    /// Retain requested on a cache-only category
    #[error("Category '{category}' is cache-only and cannot be retained")]
    NotRetainable { category: String },
}
