//! Error types for transition compositing

use thiserror::Error;

use crate::pixel::PixelError;
use crate::tile::{Direction, TileId};

/// Error when composing a transition tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The center tile or a differing neighbor was never retained
    #[error("Tile {tile} ({role}) has no retained source image; retain it before composing transitions", role = role_name(.direction))]
    SourceNotRetained {
        tile: TileId,
        /// `None` for the center tile
        direction: Option<Direction>,
    },
    /// A neighbor's source image differs in size from the center's
    #[error("Tile {neighbor} ({}x{}) cannot blend into tile {center} ({}x{})", .neighbor_size.0, .neighbor_size.1, .center_size.0, .center_size.1)]
    DimensionMismatch {
        center: TileId,
        neighbor: TileId,
        center_size: (u32, u32),
        neighbor_size: (u32, u32),
    },
    /// Pixel access failed while blending
    #[error(transparent)]
    Pixel(#[from] PixelError),
}

fn role_name(direction: &Option<Direction>) -> String {
    match direction {
        Some(d) => format!("{} neighbor", d),
        None => "center".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_role() {
        let center = TransitionError::SourceNotRetained { tile: TileId(3), direction: None };
        assert!(center.to_string().contains("(center)"));

        let east = TransitionError::SourceNotRetained { tile: TileId(4), direction: Some(Direction::East) };
        assert!(east.to_string().contains("(east neighbor)"));
    }

    #[test]
    fn test_dimension_message() {
        let err = TransitionError::DimensionMismatch {
            center: TileId(1),
            neighbor: TileId(2),
            center_size: (32, 32),
            neighbor_size: (16, 32),
        };
        assert_eq!(err.to_string(), "Tile 2 (16x32) cannot blend into tile 1 (32x32)");
    }
}
