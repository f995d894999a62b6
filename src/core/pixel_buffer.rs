use super::dimensions::{SurfaceDimensions, CHANNELS};
use super::error::{EngineError, Result};

/// One pixel read back from the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

/// CPU-side RGBA8 pixel buffer, row-major, uploaded wholesale every frame
///
/// The per-pixel accessors do not validate coordinates. An `x` past the end of
/// a row writes into the next row; an index past the end of the whole buffer
/// panics. The `unsafe` accessors drop even that last check.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    dims: SurfaceDimensions,
}

impl PixelBuffer {
    /// Zero-filled (transparent black) buffer
    pub fn new(dims: SurfaceDimensions) -> Self {
        Self {
            pixels: vec![0; dims.byte_count()],
            dims,
        }
    }

    /// Buffer with no storage, held by an engine that never acquired a surface.
    /// Every per-pixel access on it panics.
    pub fn unallocated() -> Self {
        Self {
            pixels: Vec::new(),
            dims: SurfaceDimensions { width: 0, height: 0 },
        }
    }

    /// Write all four channels of pixel (x, y)
    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, red: u8, green: u8, blue: u8, alpha: u8) {
        let idx = self.dims.index_of(x, y);
        self.pixels[idx..idx + CHANNELS].copy_from_slice(&[red, green, blue, alpha]);
    }

    /// Read pixel (x, y)
    #[inline(always)]
    pub fn get_pixel(&self, x: u32, y: u32) -> Pixel {
        let idx = self.dims.index_of(x, y);
        let p = &self.pixels[idx..idx + CHANNELS];
        Pixel { x, y, red: p[0], green: p[1], blue: p[2], alpha: p[3] }
    }

    /// Write pixel (x, y) with no checks at all
    ///
    /// # Safety
    ///
    /// `(y * width + x + 1) * 4` must not exceed the buffer length.
    #[inline(always)]
    pub unsafe fn set_pixel_unchecked(&mut self, x: u32, y: u32, red: u8, green: u8, blue: u8, alpha: u8) {
        let idx = self.dims.index_of(x, y);
        let dst = self.pixels.as_mut_ptr().add(idx);
        *dst = red;
        *dst.add(1) = green;
        *dst.add(2) = blue;
        *dst.add(3) = alpha;
    }

    /// Read pixel (x, y) with no checks at all
    ///
    /// # Safety
    ///
    /// Same precondition as [`PixelBuffer::set_pixel_unchecked`].
    #[inline(always)]
    pub unsafe fn get_pixel_unchecked(&self, x: u32, y: u32) -> Pixel {
        let idx = self.dims.index_of(x, y);
        let p = self.pixels.get_unchecked(idx..idx + CHANNELS);
        Pixel { x, y, red: p[0], green: p[1], blue: p[2], alpha: p[3] }
    }

    /// Replace the whole buffer. The only checked entry point.
    pub fn load(&mut self, source: &[u8]) -> Result<()> {
        if source.len() != self.pixels.len() {
            return Err(EngineError::DimensionMismatch {
                expected: self.pixels.len(),
                actual: source.len(),
            });
        }
        self.pixels.copy_from_slice(source);
        Ok(())
    }

    /// Fill every pixel with one color
    pub fn clear(&mut self, red: u8, green: u8, blue: u8, alpha: u8) {
        for px in self.pixels.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&[red, green, blue, alpha]);
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn dimensions(&self) -> SurfaceDimensions {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::new(SurfaceDimensions::new(width, height).unwrap())
    }

    #[test]
    fn buffer_creation() {
        let buf = buffer(100, 100);
        assert_eq!(buf.len(), 100 * 100 * 4);
        assert!(buf.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic]
    fn unallocated_buffer_rejects_access() {
        let buf = PixelBuffer::unallocated();
        assert!(buf.is_empty());
        buf.get_pixel(0, 0);
    }

    #[test]
    fn set_then_get() {
        let mut buf = buffer(10, 10);
        buf.set_pixel(5, 5, 100, 150, 200, 128);

        let idx = (5 * 10 + 5) * 4;
        assert_eq!(&buf.pixels()[idx..idx + 4], &[100, 150, 200, 128]);
        assert_eq!(
            buf.get_pixel(5, 5),
            Pixel { x: 5, y: 5, red: 100, green: 150, blue: 200, alpha: 128 }
        );
    }

    #[test]
    fn x_overflow_bleeds_into_next_row() {
        let mut buf = buffer(4, 4);
        buf.set_pixel(4, 0, 1, 2, 3, 4);

        let wrapped = buf.get_pixel(0, 1);
        assert_eq!((wrapped.red, wrapped.green, wrapped.blue, wrapped.alpha), (1, 2, 3, 4));
    }

    #[test]
    #[should_panic]
    fn past_buffer_end_panics() {
        let mut buf = buffer(4, 4);
        buf.set_pixel(0, 4, 255, 255, 255, 255);
    }

    #[test]
    fn unchecked_accessors_match_checked() {
        let mut buf = buffer(8, 8);
        unsafe {
            buf.set_pixel_unchecked(7, 7, 9, 8, 7, 6);
            assert_eq!(buf.get_pixel_unchecked(7, 7), buf.get_pixel(7, 7));
        }
        assert_eq!(buf.get_pixel(7, 7).red, 9);
    }

    #[test]
    fn load_rejects_wrong_length() {
        let mut buf = buffer(2, 2);
        buf.set_pixel(1, 1, 42, 42, 42, 42);
        let before = buf.pixels().to_vec();

        let err = buf.load(&[0u8; 15]).unwrap_err();
        assert_eq!(err, EngineError::DimensionMismatch { expected: 16, actual: 15 });
        assert_eq!(buf.pixels(), &before[..]);
    }

    #[test]
    fn load_copies_exactly() {
        let mut buf = buffer(2, 2);
        let source: Vec<u8> = (0..16).collect();
        buf.load(&source).unwrap();
        assert_eq!(buf.pixels(), &source[..]);
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut buf = buffer(3, 3);
        buf.clear(255, 128, 64, 255);
        for px in buf.pixels().chunks_exact(4) {
            assert_eq!(px, &[255, 128, 64, 255]);
        }
    }
}
