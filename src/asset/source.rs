//! Asset sources: where decoded images come from.
//!
//! The store never assumes a transport or file layout; it only talks to an
//! [`AssetSource`]. Sources are shared with loader threads, so they must be
//! `Send + Sync`.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{AssetKey, LoadError};
use crate::pixel::PixelBuffer;

/// Produces decoded images for asset keys.
pub trait AssetSource: Send + Sync {
    /// Fetch and decode the image stored under `key`.
    fn load(&self, key: &AssetKey) -> Result<PixelBuffer, LoadError>;

    /// Warm whatever cache the source keeps for `key` without handing back
    /// a decoded image.
    ///
    /// The default implementation decodes and discards.
    fn prefetch(&self, key: &AssetKey) -> Result<(), LoadError> {
        self.load(key).map(|_| ())
    }
}

/// Loads images from `<root>/<category>/<identifier>.<extension>`.
///
/// Raw file bytes are cached after the first read, so a prefetch followed
/// by a load touches the filesystem once.
#[derive(Debug)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
    bytes: Mutex<HashMap<AssetKey, Arc<Vec<u8>>>>,
}

impl DirectorySource {
    /// Create a source reading PNG files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), extension: "png".to_string(), bytes: Mutex::new(HashMap::new()) }
    }

    /// Use a file extension other than `png`.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &AssetKey) -> PathBuf {
        self.root.join(&key.category).join(format!("{}.{}", key.identifier, self.extension))
    }

    /// Number of files whose bytes are cached.
    pub fn cached_count(&self) -> usize {
        self.bytes.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    fn read_bytes(&self, key: &AssetKey) -> Result<Arc<Vec<u8>>, LoadError> {
        if let Ok(cache) = self.bytes.lock() {
            if let Some(bytes) = cache.get(key) {
                return Ok(Arc::clone(bytes));
            }
        }

        if is_unsafe_component(&key.category) || is_unsafe_component(&key.identifier) {
            return Err(LoadError::Io {
                key: key.clone(),
                message: "key contains a path separator or parent reference".to_string(),
            });
        }

        let path = self.path_for(key);
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound { key: key.clone() },
            _ => LoadError::Io { key: key.clone(), message: format!("{}: {}", path.display(), e) },
        })?;
        let bytes = Arc::new(bytes);

        if let Ok(mut cache) = self.bytes.lock() {
            cache.entry(key.clone()).or_insert_with(|| Arc::clone(&bytes));
        }
        Ok(bytes)
    }
}

fn is_unsafe_component(part: &str) -> bool {
    part.contains('/') || part.contains('\\') || part == ".."
}

impl AssetSource for DirectorySource {
    fn load(&self, key: &AssetKey) -> Result<PixelBuffer, LoadError> {
        let bytes = self.read_bytes(key)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| LoadError::Decode { key: key.clone(), message: e.to_string() })?;
        Ok(PixelBuffer::from_image(image.to_rgba8()))
    }

    fn prefetch(&self, key: &AssetKey) -> Result<(), LoadError> {
        self.read_bytes(key).map(|_| ())
    }
}

/// In-memory source that counts every request it serves.
#[derive(Debug, Default)]
pub struct MemorySource {
    images: HashMap<AssetKey, PixelBuffer>,
    loads: AtomicUsize,
    prefetches: AtomicUsize,
    per_key: Mutex<HashMap<AssetKey, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image.
    pub fn insert(&mut self, key: AssetKey, buffer: PixelBuffer) {
        self.images.insert(key, buffer);
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, category: &str, identifier: &str, buffer: PixelBuffer) -> Self {
        self.insert(AssetKey::new(category, identifier), buffer);
        self
    }

    /// Total number of `load` calls served.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Total number of `prefetch` calls served.
    pub fn prefetch_count(&self) -> usize {
        self.prefetches.load(Ordering::SeqCst)
    }

    /// Number of `load` and `prefetch` calls made for one key.
    pub fn requests_for(&self, key: &AssetKey) -> usize {
        self.per_key.lock().map(|m| m.get(key).copied().unwrap_or(0)).unwrap_or(0)
    }

    fn record(&self, key: &AssetKey) {
        if let Ok(mut per_key) = self.per_key.lock() {
            *per_key.entry(key.clone()).or_insert(0) += 1;
        }
    }
}

impl AssetSource for MemorySource {
    fn load(&self, key: &AssetKey) -> Result<PixelBuffer, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.record(key);
        self.images.get(key).cloned().ok_or_else(|| LoadError::NotFound { key: key.clone() })
    }

    fn prefetch(&self, key: &AssetKey) -> Result<(), LoadError> {
        self.prefetches.fetch_add(1, Ordering::SeqCst);
        self.record(key);
        if self.images.contains_key(key) {
            Ok(())
        } else {
            Err(LoadError::NotFound { key: key.clone() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, category: &str, name: &str, color: [u8; 4]) {
        let folder = dir.join(category);
        fs::create_dir_all(&folder).expect("should create category folder");
        RgbaImage::from_pixel(2, 2, Rgba(color))
            .save(folder.join(format!("{}.png", name)))
            .expect("should write png");
    }

    #[test]
    fn test_directory_source_path_layout() {
        let source = DirectorySource::new("/assets/images");
        assert_eq!(
            source.path_for(&AssetKey::new("floors", "3")),
            PathBuf::from("/assets/images/floors/3.png")
        );
    }

    #[test]
    fn test_directory_source_loads_png() {
        let temp = TempDir::new().expect("should create temp dir");
        write_png(temp.path(), "floors", "1", [10, 20, 30, 255]);

        let source = DirectorySource::new(temp.path());
        let buffer = source.load(&AssetKey::new("floors", "1")).expect("should load");
        assert_eq!(buffer.dimensions(), (2, 2));
        assert_eq!(buffer.get(1, 1).unwrap(), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_directory_source_missing_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let source = DirectorySource::new(temp.path());
        let key = AssetKey::new("floors", "9");
        assert_eq!(source.load(&key), Err(LoadError::NotFound { key }));
    }

    #[test]
    fn test_directory_source_prefetch_caches_bytes() {
        let temp = TempDir::new().expect("should create temp dir");
        write_png(temp.path(), "objects", "barrel", [1, 2, 3, 255]);
        let source = DirectorySource::new(temp.path());
        let key = AssetKey::new("objects", "barrel");

        source.prefetch(&key).expect("should prefetch");
        assert_eq!(source.cached_count(), 1);

        // Served from the byte cache even after the file is gone
        fs::remove_file(source.path_for(&key)).expect("should remove file");
        assert!(source.load(&key).is_ok());
    }

    #[test]
    fn test_directory_source_rejects_traversal() {
        let temp = TempDir::new().expect("should create temp dir");
        let source = DirectorySource::new(temp.path());
        let result = source.load(&AssetKey::new("floors", ".."));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_directory_source_decode_error() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::create_dir_all(temp.path().join("floors")).unwrap();
        fs::write(temp.path().join("floors").join("1.png"), b"not a png").unwrap();
        let source = DirectorySource::new(temp.path());
        let result = source.load(&AssetKey::new("floors", "1"));
        assert!(matches!(result, Err(LoadError::Decode { .. })));
    }

    #[test]
    fn test_memory_source_counts_requests() {
        let source = MemorySource::new().with("floors", "1", PixelBuffer::new(2, 2));
        let key = AssetKey::new("floors", "1");
        assert!(source.load(&key).is_ok());
        assert!(source.prefetch(&key).is_ok());
        assert!(source.load(&AssetKey::new("floors", "2")).is_err());
        assert_eq!(source.load_count(), 2);
        assert_eq!(source.prefetch_count(), 1);
        assert_eq!(source.requests_for(&key), 2);
    }
}
