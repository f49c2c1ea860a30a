//! Tile maps rendered cell by cell from transition tiles.
//!
//! A map file is TOML with a `rows` array of tile ids:
//!
//! ```toml
//! rows = [
//!     [1, 1, 2],
//!     [1, 2, 2],
//! ]
//! ```

use log::info;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::asset::ImageStore;
use crate::pixel::{PixelBuffer, Rect};
use crate::tile::{Neighbors, TileId};
use crate::transition::{TransitionEngine, TransitionError};

/// Error reading a map file
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Failed to read map: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse map: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Map row {row} has {actual} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },
}

#[derive(Debug, Deserialize)]
struct MapFile {
    rows: Vec<Vec<u32>>,
}

/// A rectangular grid of tile ids, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
}

impl TileMap {
    /// Build a map from rows of tile ids. Every row must be the same length.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, MapError> {
        let width = rows.first().map_or(0, Vec::len);
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != width {
                return Err(MapError::Ragged { row, expected: width, actual: cells.len() });
            }
            tiles.extend(cells.iter().copied().map(TileId));
        }
        Ok(Self { width: width as u32, height: rows.len() as u32, tiles })
    }

    pub fn from_toml(source: &str) -> Result<Self, MapError> {
        let file: MapFile = toml::from_str(source)?;
        Self::from_rows(file.rows)
    }

    pub fn load(path: &Path) -> Result<Self, MapError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile at a cell, or `None` outside the map.
    pub fn tile(&self, x: i64, y: i64) -> Option<TileId> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        self.tiles.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// The four neighbors of a cell. Cells off the map count as the center
    /// tile, so map borders are left unblended.
    pub fn neighbors(&self, x: u32, y: u32) -> Option<Neighbors> {
        let center = self.tile(x as i64, y as i64)?;
        let (x, y) = (x as i64, y as i64);
        let at = |dx: i64, dy: i64| self.tile(x + dx, y + dy).unwrap_or(center);
        Some(Neighbors::new(at(0, -1), at(1, 0), at(0, 1), at(-1, 0)))
    }

    /// Every tile id used by the map, in ascending order.
    pub fn distinct_tiles(&self) -> Vec<TileId> {
        self.tiles.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Compose the whole map into one image.
    ///
    /// Every tile id must already be retained in `store`. Cells sharing a
    /// center and neighborhood reuse one cached transition.
    pub fn render(
        &self,
        engine: &mut TransitionEngine,
        store: &ImageStore,
    ) -> Result<PixelBuffer, TransitionError> {
        let mut output: Option<PixelBuffer> = None;

        for y in 0..self.height {
            for x in 0..self.width {
                let (Some(center), Some(neighbors)) =
                    (self.tile(x as i64, y as i64), self.neighbors(x, y))
                else {
                    continue;
                };
                let tile = engine.get_transition(store, center, neighbors)?;
                let (tw, th) = tile.dimensions();
                let canvas = output
                    .get_or_insert_with(|| PixelBuffer::new(tw * self.width, th * self.height));
                canvas.copy_region(&tile, tile.bounds(), Rect::new(x * tw, y * th, tw, th))?;
            }
        }

        let stats = engine.stats();
        info!(
            "rendered {}x{} map with {} transitions ({} cache hits)",
            self.width, self.height, stats.entries, stats.hits
        );
        Ok(output.unwrap_or_else(|| PixelBuffer::new(0, 0)))
    }
}
