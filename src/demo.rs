//! Frame producer for the demo binary: grey noise written one pixel at a time

use crate::core::{GraphicsContext, PixelEngine};

/// Integer hash of (x, y, frame), stable across runs
#[inline(always)]
pub fn noise(x: u32, y: u32, frame: u32) -> u8 {
    let mut h = x
        .wrapping_mul(0x8da6_b343)
        ^ y.wrapping_mul(0xd816_3841)
        ^ frame.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2c1b_3c6d);
    h ^= h >> 12;
    (h >> 24) as u8
}

/// Writes a fresh noise frame into an engine's buffer
#[derive(Debug, Default)]
pub struct NoiseProducer {
    frame: u32,
}

impl NoiseProducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames produced so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Fill every pixel through `set_pixel`, then advance the frame counter
    pub fn produce<C: GraphicsContext>(&mut self, engine: &mut PixelEngine<C>) {
        let (width, height) = engine.dimensions();
        for y in 0..height {
            for x in 0..width {
                let v = noise(x, y, self.frame);
                engine.set_pixel(x, y, v, v, v, 255);
            }
        }
        self.frame = self.frame.wrapping_add(1);
    }
}
