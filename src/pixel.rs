//! Fixed-size RGBA pixel buffers with bounds-checked access.
//!
//! A [`PixelBuffer`] wraps an [`RgbaImage`] and never changes size after
//! construction. Every coordinate is checked: reading or writing outside the
//! buffer is an error, never a silent clamp.

use image::{Rgba, RgbaImage};
use thiserror::Error;

/// An RGBA color quadruple.
pub type Color = Rgba<u8>;

/// Fully transparent black.
pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);

/// Error raised by pixel access outside a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelError {
    /// Single pixel coordinate outside the buffer
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    /// Rectangle that does not fit inside the buffer
    #[error("Region {rect} does not fit in the {width}x{height} buffer")]
    RegionOutOfBounds { rect: Rect, width: u32, height: u32 },
    /// Source and destination rectangles of a copy differ in size
    #[error("Cannot copy a {src_w}x{src_h} region into a {dst_w}x{dst_h} region", src_w = .src.0, src_h = .src.1, dst_w = .dst.0, dst_h = .dst.1)]
    RegionSizeMismatch { src: (u32, u32), dst: (u32, u32) },
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check whether a pixel coordinate lies inside the rectangle.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Iterate over every coordinate in row-major order.
    pub fn points(&self) -> impl Iterator<Item = (u32, u32)> {
        let Rect { x, y, width, height } = *self;
        (y..y + height).flat_map(move |py| (x..x + width).map(move |px| (px, py)))
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A fixed-size 2D grid of RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    /// Create a buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self { image: RgbaImage::from_pixel(width, height, color) }
    }

    /// Wrap a decoded image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// The rectangle covering the whole buffer.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Borrow the underlying image, e.g. for encoding.
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Read the pixel at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> Result<Color, PixelError> {
        self.check(x, y)?;
        Ok(*self.image.get_pixel(x, y))
    }

    /// Overwrite the pixel at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, color: Color) -> Result<(), PixelError> {
        self.check(x, y)?;
        self.image.put_pixel(x, y, color);
        Ok(())
    }

    /// Copy `src_rect` of `src` into `dst_rect` of this buffer.
    ///
    /// Both rectangles must have the same size and lie fully inside their
    /// buffers. Nothing is written when the copy is rejected.
    pub fn copy_region(
        &mut self,
        src: &PixelBuffer,
        src_rect: Rect,
        dst_rect: Rect,
    ) -> Result<(), PixelError> {
        if (src_rect.width, src_rect.height) != (dst_rect.width, dst_rect.height) {
            return Err(PixelError::RegionSizeMismatch {
                src: (src_rect.width, src_rect.height),
                dst: (dst_rect.width, dst_rect.height),
            });
        }
        src.check_rect(src_rect)?;
        self.check_rect(dst_rect)?;

        for dy in 0..src_rect.height {
            for dx in 0..src_rect.width {
                let pixel = *src.image.get_pixel(src_rect.x + dx, src_rect.y + dy);
                self.image.put_pixel(dst_rect.x + dx, dst_rect.y + dy, pixel);
            }
        }
        Ok(())
    }

    fn check(&self, x: u32, y: u32) -> Result<(), PixelError> {
        let (width, height) = self.dimensions();
        if x >= width || y >= height {
            return Err(PixelError::OutOfBounds { x, y, width, height });
        }
        Ok(())
    }

    fn check_rect(&self, rect: Rect) -> Result<(), PixelError> {
        let (width, height) = self.dimensions();
        // checked_add guards against u32 overflow on huge rectangles
        let fits = rect.x.checked_add(rect.width).is_some_and(|r| r <= width)
            && rect.y.checked_add(rect.height).is_some_and(|b| b <= height);
        if !fits {
            return Err(PixelError::RegionOutOfBounds { rect, width, height });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Rgba([255, 0, 0, 255]);
    const BLUE: Color = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_new_buffer_is_transparent() {
        let buf = PixelBuffer::new(4, 3);
        assert_eq!(buf.dimensions(), (4, 3));
        assert_eq!(buf.get(3, 2).unwrap(), TRANSPARENT);
    }

    #[test]
    fn test_set_then_get() {
        let mut buf = PixelBuffer::new(4, 4);
        buf.set(1, 2, RED).unwrap();
        assert_eq!(buf.get(1, 2).unwrap(), RED);
        assert_eq!(buf.get(2, 1).unwrap(), TRANSPARENT);
    }

    #[test]
    fn test_get_out_of_bounds() {
        let buf = PixelBuffer::new(4, 4);
        assert_eq!(
            buf.get(4, 0),
            Err(PixelError::OutOfBounds { x: 4, y: 0, width: 4, height: 4 })
        );
        assert!(buf.get(0, 4).is_err());
    }

    #[test]
    fn test_set_out_of_bounds_leaves_buffer_untouched() {
        let mut buf = PixelBuffer::filled(2, 2, BLUE);
        let before = buf.clone();
        assert!(buf.set(2, 2, RED).is_err());
        assert_eq!(buf, before);
    }

    #[test]
    fn test_copy_region() {
        let mut src = PixelBuffer::filled(4, 4, BLUE);
        src.set(1, 1, RED).unwrap();
        let mut dst = PixelBuffer::new(4, 4);

        dst.copy_region(&src, Rect::new(1, 1, 2, 2), Rect::new(2, 0, 2, 2)).unwrap();

        assert_eq!(dst.get(2, 0).unwrap(), RED);
        assert_eq!(dst.get(3, 1).unwrap(), BLUE);
        assert_eq!(dst.get(0, 0).unwrap(), TRANSPARENT);
        assert_eq!(dst.get(2, 2).unwrap(), TRANSPARENT);
    }

    #[test]
    fn test_copy_region_size_mismatch() {
        let src = PixelBuffer::new(4, 4);
        let mut dst = PixelBuffer::new(4, 4);
        let err = dst.copy_region(&src, Rect::new(0, 0, 2, 2), Rect::new(0, 0, 3, 2));
        assert_eq!(err, Err(PixelError::RegionSizeMismatch { src: (2, 2), dst: (3, 2) }));
    }

    #[test]
    fn test_copy_region_rejects_overflowing_rect() {
        let src = PixelBuffer::filled(4, 4, RED);
        let mut dst = PixelBuffer::new(4, 4);
        let err = dst.copy_region(&src, Rect::new(0, 0, 2, 2), Rect::new(3, 3, 2, 2));
        assert!(matches!(err, Err(PixelError::RegionOutOfBounds { .. })));
        assert_eq!(dst, PixelBuffer::new(4, 4));
    }

    #[test]
    fn test_rect_points_row_major() {
        let points: Vec<_> = Rect::new(1, 2, 2, 2).points().collect();
        assert_eq!(points, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(28, 0, 4, 32);
        assert!(rect.contains(28, 0));
        assert!(rect.contains(31, 31));
        assert!(!rect.contains(27, 5));
        assert!(!rect.contains(31, 32));
    }
}
