//! Tile identities, edge directions and neighbor sets.

use serde::{Deserialize, Serialize};
use std::ops::Index;

use crate::pixel::Rect;

/// Opaque id of a terrain/floor variant.
///
/// The meaning of an id belongs to the asset catalog; inside the floor
/// category its asset identifier is the decimal form of the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl TileId {
    /// Identifier of this tile's image within the floor category.
    pub fn identifier(self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TileId {
    fn from(id: u32) -> Self {
        TileId(id)
    }
}

/// One of the four orthogonal edges of a tile.
///
/// The declaration order is the processing order for blending: later
/// directions overwrite earlier ones where their bands overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in fixed order.
    pub const ALL: [Direction; 4] =
        [Direction::North, Direction::East, Direction::South, Direction::West];

    /// Position of this direction in [`Direction::ALL`].
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Parse a direction from its name or initial.
    pub fn from_str(s: &str) -> Option<Direction> {
        match s.to_lowercase().as_str() {
            "north" | "n" => Some(Direction::North),
            "east" | "e" => Some(Direction::East),
            "south" | "s" => Some(Direction::South),
            "west" | "w" => Some(Direction::West),
            _ => None,
        }
    }

    /// The strip of a `width`x`height` tile lying within `depth` pixels of
    /// this edge. Depth is clamped to the tile size.
    pub fn band(self, width: u32, height: u32, depth: u32) -> Rect {
        match self {
            Direction::North => Rect::new(0, 0, width, depth.min(height)),
            Direction::East => {
                let depth = depth.min(width);
                Rect::new(width - depth, 0, depth, height)
            }
            Direction::South => {
                let depth = depth.min(height);
                Rect::new(0, height - depth, width, depth)
            }
            Direction::West => Rect::new(0, 0, depth.min(width), height),
        }
    }

    /// Distance of `(x, y)` from this edge; 0 is the outermost row or column.
    pub fn depth_of(self, x: u32, y: u32, width: u32, height: u32) -> u32 {
        match self {
            Direction::North => y,
            Direction::East => width - 1 - x,
            Direction::South => height - 1 - y,
            Direction::West => x,
        }
    }

    /// The coordinate in the neighbor across this edge that sits at the same
    /// depth on the other side of the boundary.
    pub fn mirror(self, x: u32, y: u32, width: u32, height: u32) -> (u32, u32) {
        match self {
            Direction::North | Direction::South => (x, height - 1 - y),
            Direction::East | Direction::West => (width - 1 - x, y),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        };
        write!(f, "{}", name)
    }
}

/// The four orthogonal neighbors of a tile, indexed by [`Direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Neighbors([TileId; 4]);

impl Neighbors {
    pub fn new(north: TileId, east: TileId, south: TileId, west: TileId) -> Self {
        Self([north, east, south, west])
    }

    /// All four neighbors are the same tile.
    pub fn uniform(id: TileId) -> Self {
        Self([id; 4])
    }

    pub fn as_array(&self) -> [TileId; 4] {
        self.0
    }

    /// Iterate `(direction, neighbor)` pairs in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, TileId)> + '_ {
        Direction::ALL.iter().map(move |&d| (d, self.0[d.index()]))
    }
}

impl From<[TileId; 4]> for Neighbors {
    fn from(ids: [TileId; 4]) -> Self {
        Self(ids)
    }
}

impl From<[u32; 4]> for Neighbors {
    fn from(ids: [u32; 4]) -> Self {
        Self(ids.map(TileId))
    }
}

impl Index<Direction> for Neighbors {
    type Output = TileId;

    fn index(&self, direction: Direction) -> &TileId {
        &self.0[direction.index()]
    }
}
