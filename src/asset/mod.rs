//! Image assets: sources, bulk loading and the two-tier image store.
//!
//! This module provides:
//! - `AssetSource`, the interface to whatever fetches and decodes images
//! - `DirectorySource` and `MemorySource` implementations
//! - `ImageStore`, which issues loads in batches, tracks each batch with its
//!   own pending counter and keeps decoded handles for retained categories
//!
//! Two retention tiers exist. A cache-only load warms the source's cache and
//! keeps nothing; a retained load also stores an [`ImageHandle`] that later
//! lookups return synchronously.

mod batch;
mod error;
mod source;
mod store;

use std::ops::Deref;
use std::sync::Arc;

use crate::pixel::PixelBuffer;

pub use batch::{BatchId, BatchReport, CompletionCallback};
pub use error::{LoadError, StoreError};
pub use source::{AssetSource, DirectorySource, MemorySource};
pub use store::{AssetList, Dispatcher, ImageStore};

/// Identity of an image: its category and the identifier within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    pub category: String,
    pub identifier: String,
}

impl AssetKey {
    pub fn new(category: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self { category: category.into(), identifier: identifier.into() }
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.identifier)
    }
}

/// Read-only view of a retained image.
///
/// Handles are cheap to clone; every clone shares the same buffer, which
/// the store owns and never mutates.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    key: AssetKey,
    buffer: Arc<PixelBuffer>,
}

impl ImageHandle {
    pub(crate) fn new(key: AssetKey, buffer: PixelBuffer) -> Self {
        Self { key, buffer: Arc::new(buffer) }
    }

    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Check whether two handles share the same stored image.
    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl Deref for ImageHandle {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        &self.buffer
    }
}
