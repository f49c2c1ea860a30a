//! Stochastic edge blending.
//!
//! Each edge band is a few pixels deep. For every pixel in the band one
//! uniform sample in `0..100` is drawn; if it falls below the chance for the
//! pixel's depth, the neighbor's pixel mirrored across the shared edge
//! replaces the base pixel. Chances fall off with depth so the neighbor's
//! influence fades toward the tile's interior.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pixel::{PixelBuffer, PixelError};
use crate::tile::Direction;

/// Substitution chance per band, outermost first, in percent.
pub const DEFAULT_CHANCES: [u8; 4] = [80, 60, 40, 20];

/// Tunable parameters of the edge blend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlendParams {
    /// Percent chance of substitution at each depth, outermost first.
    /// The band is as deep as this list is long.
    pub chances: Vec<u8>,
}

impl Default for BlendParams {
    fn default() -> Self {
        Self { chances: DEFAULT_CHANCES.to_vec() }
    }
}

impl BlendParams {
    pub fn new(chances: Vec<u8>) -> Self {
        Self { chances }
    }

    /// Depth of the blended band in pixels.
    pub fn band_width(&self) -> u32 {
        self.chances.len() as u32
    }

    /// Substitution chance at `depth`; zero past the band.
    pub fn chance_at(&self, depth: u32) -> u8 {
        self.chances.get(depth as usize).copied().unwrap_or(0)
    }

    /// Check the chance table, returning one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.chances.is_empty() {
            errors.push("must list at least one chance".to_string());
        }
        for (depth, &chance) in self.chances.iter().enumerate() {
            if chance > 100 {
                errors.push(format!("chance {} at depth {} exceeds 100", chance, depth));
            }
        }
        if self.chances.windows(2).any(|w| w[1] > w[0]) {
            errors.push("chances must not increase toward the tile center".to_string());
        }
        errors
    }
}

/// Blend `neighbor` into the `direction` edge band of `result`.
///
/// Only pixels inside the band are touched. Returns the number of pixels
/// taken from the neighbor. Both buffers must have the same size.
pub fn blend_edge<R>(
    result: &mut PixelBuffer,
    neighbor: &PixelBuffer,
    direction: Direction,
    params: &BlendParams,
    rng: &mut R,
) -> Result<usize, PixelError>
where
    R: Rng,
{
    let (width, height) = result.dimensions();
    let band = direction.band(width, height, params.band_width());

    let mut substituted = 0;
    for (x, y) in band.points() {
        let chance = params.chance_at(direction.depth_of(x, y, width, height));
        if rng.gen_range(0..100u8) >= chance {
            continue;
        }
        let (mx, my) = direction.mirror(x, y, width, height);
        result.set(x, y, neighbor.get(mx, my)?)?;
        substituted += 1;
    }
    Ok(substituted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const GRASS: Rgba<u8> = Rgba([0, 200, 0, 255]);
    const SAND: Rgba<u8> = Rgba([230, 210, 120, 255]);

    #[test]
    fn test_default_params() {
        let params = BlendParams::default();
        assert_eq!(params.band_width(), 4);
        assert_eq!(params.chance_at(0), 80);
        assert_eq!(params.chance_at(3), 20);
        assert_eq!(params.chance_at(4), 0);
        assert!(params.validate().is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert_eq!(BlendParams::new(vec![]).validate().len(), 1);
        assert_eq!(BlendParams::new(vec![120, 50]).validate().len(), 1);
        assert_eq!(BlendParams::new(vec![20, 40]).validate().len(), 1);
    }

    #[test]
    fn test_blend_confined_to_band() {
        let mut result = PixelBuffer::filled(32, 32, GRASS);
        let neighbor = PixelBuffer::filled(32, 32, SAND);
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        blend_edge(&mut result, &neighbor, Direction::East, &BlendParams::default(), &mut rng)
            .unwrap();

        for y in 0..32 {
            for x in 0..28 {
                assert_eq!(result.get(x, y).unwrap(), GRASS, "pixel ({}, {}) changed", x, y);
            }
        }
    }

    #[test]
    fn test_full_chance_replaces_whole_band() {
        let mut result = PixelBuffer::filled(8, 8, GRASS);
        let neighbor = PixelBuffer::filled(8, 8, SAND);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let n = blend_edge(&mut result, &neighbor, Direction::North, &BlendParams::new(vec![100, 100]), &mut rng)
            .unwrap();

        assert_eq!(n, 16);
        assert_eq!(result.get(5, 1).unwrap(), SAND);
        assert_eq!(result.get(5, 2).unwrap(), GRASS);
    }

    #[test]
    fn test_zero_chance_changes_nothing() {
        let mut result = PixelBuffer::filled(8, 8, GRASS);
        let neighbor = PixelBuffer::filled(8, 8, SAND);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let n = blend_edge(&mut result, &neighbor, Direction::West, &BlendParams::new(vec![0, 0]), &mut rng)
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(result, PixelBuffer::filled(8, 8, GRASS));
    }

    #[test]
    fn test_takes_mirrored_neighbor_pixel() {
        let mut result = PixelBuffer::filled(4, 4, GRASS);
        let mut neighbor = PixelBuffer::filled(4, 4, GRASS);
        // Bottom row of the northern neighbor touches our top row
        for x in 0..4 {
            neighbor.set(x, 3, SAND).unwrap();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        blend_edge(&mut result, &neighbor, Direction::North, &BlendParams::new(vec![100]), &mut rng)
            .unwrap();

        for x in 0..4 {
            assert_eq!(result.get(x, 0).unwrap(), SAND);
        }
    }

    #[test]
    fn test_outer_rows_substitute_more_often() {
        let mut result = PixelBuffer::filled(64, 64, GRASS);
        let neighbor = PixelBuffer::filled(64, 64, SAND);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        blend_edge(&mut result, &neighbor, Direction::South, &BlendParams::default(), &mut rng)
            .unwrap();

        let sand_in_row =
            |y: u32| (0..64).filter(|&x| result.get(x, y).unwrap() == SAND).count();
        assert!(sand_in_row(63) > sand_in_row(60));
    }
}
