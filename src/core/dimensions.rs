use super::error::EnvironmentError;

/// Bytes per RGBA8 pixel
pub const CHANNELS: usize = 4;

/// Fixed size of the drawing surface in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDimensions {
    pub width: u32,
    pub height: u32,
}

impl SurfaceDimensions {
    /// Both sides must be non-zero
    pub fn new(width: u32, height: u32) -> Result<Self, EnvironmentError> {
        if width == 0 || height == 0 {
            return Err(EnvironmentError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_count(&self) -> usize {
        self.pixel_count() * CHANNELS
    }

    /// Row stride of the packed buffer
    pub fn bytes_per_row(&self) -> u32 {
        self.width * CHANNELS as u32
    }

    /// Byte offset of pixel (x, y). Does not check that x < width.
    #[inline(always)]
    pub fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }
}
