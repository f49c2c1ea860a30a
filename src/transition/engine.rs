//! Transition engine: cache lookup with compositing on miss.

use log::{debug, trace};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use super::blend::{blend_edge, BlendParams};
use super::{CacheStats, TransitionCache, TransitionError, TransitionKey};
use crate::asset::{AssetKey, ImageHandle, ImageStore};
use crate::catalog::FLOORS;
use crate::pixel::PixelBuffer;
use crate::tile::{Direction, Neighbors, TileId};

/// Produces transition tiles and memoizes them for the session.
///
/// Composition takes `&mut self`, so one engine is only ever driven by one
/// caller at a time. Two engines do not share a cache.
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    params: BlendParams,
    floor_category: String,
    cache: TransitionCache,
    rng: ChaCha8Rng,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new(BlendParams::default())
    }
}

impl TransitionEngine {
    /// Create an engine seeded from system entropy.
    pub fn new(params: BlendParams) -> Self {
        Self {
            params,
            floor_category: FLOORS.to_string(),
            cache: TransitionCache::new(),
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Reseed the random source so a session composes reproducible tiles.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Read tile images from a category other than `floors`.
    pub fn with_floor_category(mut self, category: impl Into<String>) -> Self {
        self.floor_category = category.into();
        self
    }

    pub fn params(&self) -> &BlendParams {
        &self.params
    }

    pub fn floor_category(&self) -> &str {
        &self.floor_category
    }

    pub fn cache(&self) -> &TransitionCache {
        &self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Tiles whose images must be retained before this transition can be
    /// composed: the center and every neighbor that differs from it.
    pub fn source_tiles(&self, center: TileId, neighbors: Neighbors) -> Vec<TileId> {
        let key = TransitionKey::new(center, neighbors);
        let mut tiles = vec![center];
        for (_, id) in key.differing() {
            if !tiles.contains(&id) {
                tiles.push(id);
            }
        }
        tiles
    }

    /// Asset keys of [`TransitionEngine::source_tiles`].
    pub fn source_keys(&self, center: TileId, neighbors: Neighbors) -> Vec<AssetKey> {
        self.source_tiles(center, neighbors)
            .into_iter()
            .map(|t| AssetKey::new(&self.floor_category, t.identifier()))
            .collect()
    }

    /// Return the transition tile for `center` surrounded by `neighbors`.
    ///
    /// A cached tile is returned as the same shared buffer every time, with
    /// no new random draws. On a miss the tile is composed from the retained
    /// source images in `store` and cached.
    pub fn get_transition(
        &mut self,
        store: &ImageStore,
        center: TileId,
        neighbors: Neighbors,
    ) -> Result<Arc<PixelBuffer>, TransitionError> {
        let key = TransitionKey::new(center, neighbors);
        if let Some(tile) = self.cache.get(&key) {
            trace!("transition {} served from cache", key);
            return Ok(tile);
        }

        let tile = self.compose(store, &key)?;
        debug!("transition {} composed ({} cached)", key, self.cache.len() + 1);
        Ok(self.cache.insert(key, tile))
    }

    fn compose(
        &mut self,
        store: &ImageStore,
        key: &TransitionKey,
    ) -> Result<PixelBuffer, TransitionError> {
        let base = self.source(store, key.center, None)?;

        // Resolve every source before drawing anything
        let mut neighbors = Vec::with_capacity(4);
        for (direction, id) in key.differing() {
            let neighbor = self.source(store, id, Some(direction))?;
            if neighbor.dimensions() != base.dimensions() {
                return Err(TransitionError::DimensionMismatch {
                    center: key.center,
                    neighbor: id,
                    center_size: base.dimensions(),
                    neighbor_size: neighbor.dimensions(),
                });
            }
            neighbors.push((direction, neighbor));
        }

        let mut result = PixelBuffer::new(base.width(), base.height());
        result.copy_region(base.buffer(), base.bounds(), base.bounds())?;

        for (direction, neighbor) in &neighbors {
            let substituted =
                blend_edge(&mut result, neighbor.buffer(), *direction, &self.params, &mut self.rng)?;
            trace!("{} edge of {}: {} pixels from {}", direction, key, substituted, neighbor.key());
        }
        Ok(result)
    }

    fn source(
        &self,
        store: &ImageStore,
        tile: TileId,
        direction: Option<Direction>,
    ) -> Result<ImageHandle, TransitionError> {
        store
            .get(&self.floor_category, &tile.identifier())
            .map_err(|_| TransitionError::SourceNotRetained { tile, direction })
    }
}
