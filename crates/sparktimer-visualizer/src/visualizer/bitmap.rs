//! Layer bitmap decoding
//!
//! Layer payloads store one bit per pixel with each byte bit-reversed
//! relative to the MSB-first display order. Decoding reverses every byte,
//! expands the rows into a grayscale raster and rotates it 90 degrees
//! clockwise for presentation.

use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};
use sparktimer_core::DecodeError;
use tracing::debug;

use crate::gcode::ParseResult;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// Bit reversal of every byte value, built at compile time
pub const BIT_REVERSE: [u8; 256] = build_bit_reverse_table();

const fn build_bit_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).reverse_bits();
        i += 1;
    }
    table
}

/// Reverse the bit order of one byte via [`BIT_REVERSE`]
#[inline]
pub fn reverse_bits(byte: u8) -> u8 {
    BIT_REVERSE[byte as usize]
}

/// Bytes per packed row for a raster `width` pixels wide
pub fn row_stride(width: usize) -> usize {
    width.div_ceil(8)
}

/// One decoded layer ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLayer {
    index: usize,
    width: u32,
    height: u32,
    stride: usize,
    packed: Vec<u8>,
    image: GrayImage,
}

impl DecodedLayer {
    /// 0-based layer index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Source raster width, before rotation
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Source raster height, before rotation
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bit-reversed packed rows, MSB-first, `height * stride` bytes
    pub fn packed_rows(&self) -> &[u8] {
        &self.packed
    }

    /// Rotated display image, `height` wide and `width` tall
    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Whether source pixel `(x, y)` is set, before rotation
    pub fn is_set(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let byte = self.packed[y as usize * self.stride + x as usize / 8];
        Some(byte & (0x80 >> (x % 8)) != 0)
    }

    /// Write the display image as a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), DecodeError> {
        let path = path.as_ref();
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| DecodeError::Image {
                reason: e.to_string(),
            })?;
        debug!("Layer {} written to {}", self.index, path.display());
        Ok(())
    }
}

/// Decode layer `index` of a completed parse
pub fn decode_layer(result: &ParseResult, index: usize) -> Result<DecodedLayer, DecodeError> {
    let raw = result.layer(index).ok_or(DecodeError::LayerOutOfRange {
        index,
        available: result.layers.len(),
    })?;
    decode_buffer(index, result.width, result.height, raw)
}

/// Decode one raw payload of a `width x height` raster
pub fn decode_buffer(
    index: usize,
    width: i32,
    height: i32,
    raw: &[u8],
) -> Result<DecodedLayer, DecodeError> {
    let invalid = DecodeError::InvalidDimensions { width, height };
    if width <= 0 || height <= 0 {
        return Err(invalid);
    }
    let (w, h) = (width as u32, height as u32);

    let stride = row_stride(w as usize);
    let expected = stride.checked_mul(h as usize).ok_or(invalid)?;
    if raw.len() < expected {
        return Err(DecodeError::BufferTooShort {
            expected,
            actual: raw.len(),
        });
    }

    let packed: Vec<u8> = raw[..expected].iter().map(|&b| reverse_bits(b)).collect();

    let raster = GrayImage::from_fn(w, h, |x, y| {
        let byte = packed[y as usize * stride + x as usize / 8];
        if byte & (0x80 >> (x % 8)) != 0 {
            WHITE
        } else {
            BLACK
        }
    });
    let image = image::imageops::rotate90(&raster);

    Ok(DecodedLayer {
        index,
        width: w,
        height: h,
        stride,
        packed,
        image,
    })
}
