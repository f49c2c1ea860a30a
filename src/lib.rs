//! Tileblend - floor transition tiles composed from a bulk-loaded image store
//!
//! This library provides functionality to:
//! - Load images in bulk with one completion callback per request
//! - Keep decoded floor images for synchronous lookup
//! - Blend a floor tile's edges into its neighbors and cache the result
//! - Render whole tile maps from cached transitions

pub mod asset;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod map;
pub mod pixel;
pub mod progress;
pub mod tile;
pub mod transition;

pub use asset::{AssetKey, AssetSource, BatchId, BatchReport, ImageHandle, ImageStore, StoreError};
pub use catalog::{Catalog, CategorySpec};
pub use pixel::{PixelBuffer, Rect};
pub use tile::{Direction, Neighbors, TileId};
pub use transition::{BlendParams, TransitionEngine, TransitionError};
