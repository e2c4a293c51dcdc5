//! Owned RGBA pixel buffers
//!
//! The whole pipeline operates on one buffer representation: 8-bit RGBA,
//! row-major, 4 bytes per pixel. A freshly allocated pixmap is transparent
//! black; the resampler and the canvas compositor force alpha themselves
//! where the hardware pipeline does.

use thiserror::Error;

/// Errors related to pixel buffer construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixmapError {
    #[error("pixel data length {len} does not match {width}x{height} RGBA")]
    SizeMismatch { width: u32, height: u32, len: usize },
}

/// Raw RGBA8 image buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Create a transparent black pixmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Create a pixmap filled with a single RGBA color
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            data.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap an existing RGBA byte buffer
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, PixmapError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(PixmapError::SizeMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the pixmap, returning the raw byte buffer
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Read one channel (0=R, 1=G, 2=B, 3=A)
    #[inline]
    pub fn channel(&self, x: u32, y: u32, channel: usize) -> u8 {
        self.data[self.offset(x, y) + channel]
    }

    /// Store a raw channel value
    #[inline]
    pub fn set_channel(&mut self, x: u32, y: u32, channel: usize, value: u8) {
        let idx = self.offset(x, y) + channel;
        self.data[idx] = value;
    }

    /// Quantize a floating-point channel value into the buffer
    ///
    /// Rounds to nearest and clamps to [0, 255]. Every filtered value goes
    /// through this, so inter-pass buffers are always re-quantized integers.
    #[inline]
    pub fn set_channel_quantized(&mut self, x: u32, y: u32, channel: usize, value: f64) {
        let idx = self.offset(x, y) + channel;
        self.data[idx] = value.round().clamp(0.0, 255.0) as u8;
    }

    /// Read a whole pixel
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Store a whole pixel
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        let i = self.offset(x, y);
        self.data[i..i + 4].copy_from_slice(&pixel);
    }

    /// Copy this pixmap into `canvas` at the given offset
    ///
    /// Rows and columns falling outside the canvas are dropped. Copied
    /// pixels are forced opaque; the canvas outside the copied rectangle is
    /// left untouched (the caller pre-fills it with the border color).
    pub fn blit_into(&self, canvas: &mut Pixmap, left: u32, top: u32) {
        for y in 0..self.height {
            let cy = top + y;
            if cy >= canvas.height {
                break;
            }
            for x in 0..self.width {
                let cx = left + x;
                if cx >= canvas.width {
                    break;
                }
                let mut px = self.pixel(x, y);
                px[3] = 255;
                canvas.set_pixel(cx, cy, px);
            }
        }
    }
}
