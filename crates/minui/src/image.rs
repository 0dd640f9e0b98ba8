//! Image decoding boundary.
//!
//! The painter never validates image data itself: it hands the raw bytes
//! to an [`ImageDecoder`] and skips the draw if decoding fails.
//! [`BmpDecoder`] handles uncompressed 24- and 32-bit Windows bitmaps.

use thiserror::Error;

use minui_core::Color;

use crate::surface::Bitmap;

/// Reasons an encoded image was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The data does not start with the expected signature.
    #[error("unrecognized image signature")]
    BadSignature,

    /// The data ends before the declared headers or pixels.
    #[error("image data truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        available: usize,
    },

    /// The pixel format is not supported.
    #[error("unsupported pixel format: {bits} bits per pixel, compression {compression}")]
    Unsupported {
        /// Bits per pixel.
        bits: u16,
        /// Compression method.
        compression: u32,
    },

    /// Width or height is zero, negative or absurdly large.
    #[error("invalid image dimensions {width}x{height}")]
    BadDimensions {
        /// Declared width.
        width: i32,
        /// Declared height.
        height: i32,
    },
}

/// Turns encoded bytes into pixels.
pub trait ImageDecoder: Send + Sync {
    /// Decodes `data`, or explains why it can't.
    fn decode(&self, data: &[u8]) -> Result<Bitmap, ImageError>;
}

/// Decoder for uncompressed BMP files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BmpDecoder;

impl BmpDecoder {
    const FILE_HEADER: usize = 14;
    const INFO_HEADER: usize = 40;
    const MAX_DIMENSION: i32 = 1 << 14;
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_i32(data: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn require(data: &[u8], needed: usize) -> Result<(), ImageError> {
    if data.len() < needed {
        return Err(ImageError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

impl ImageDecoder for BmpDecoder {
    fn decode(&self, data: &[u8]) -> Result<Bitmap, ImageError> {
        if data.len() < 2 || &data[..2] != b"BM" {
            return Err(ImageError::BadSignature);
        }
        require(data, Self::FILE_HEADER + Self::INFO_HEADER)?;

        let offset = read_u32(data, 10) as usize;
        let width = read_i32(data, 18);
        let raw_height = read_i32(data, 22);
        let bits = read_u16(data, 28);
        let compression = read_u32(data, 30);

        if !(24..=32).contains(&bits) || bits % 8 != 0 || compression != 0 {
            return Err(ImageError::Unsupported { bits, compression });
        }

        let height = raw_height.checked_abs().unwrap_or(0);
        if width <= 0 || height == 0 || width > Self::MAX_DIMENSION || height > Self::MAX_DIMENSION {
            return Err(ImageError::BadDimensions { width, height: raw_height });
        }

        let bytes_per_pixel = usize::from(bits / 8);
        let stride = (width as usize * bytes_per_pixel + 3) & !3;
        require(data, offset + stride * height as usize)?;

        let bottom_up = raw_height > 0;
        let mut bitmap = Bitmap::new(width, height, Color::BLACK);
        for row in 0..height {
            let src_row = if bottom_up { height - 1 - row } else { row };
            let start = offset + src_row as usize * stride;
            for x in 0..width {
                let px = start + x as usize * bytes_per_pixel;
                bitmap.set(x, row, Color::rgb(data[px + 2], data[px + 1], data[px]));
            }
        }

        Ok(bitmap)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a bottom-up 24-bit BMP from rows given top to bottom.
    pub(crate) fn encode_bmp(width: i32, rows: &[Vec<Color>]) -> Vec<u8> {
        let height = rows.len() as i32;
        let stride = (width as usize * 3 + 3) & !3;
        let offset = 54u32;
        let size = offset as usize + stride * rows.len();

        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&(size as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&[0; 24]);

        for row in rows.iter().rev() {
            let mut line = Vec::with_capacity(stride);
            for c in row {
                line.extend_from_slice(&[c.b, c.g, c.r]);
            }
            line.resize(stride, 0);
            out.extend_from_slice(&line);
        }
        out
    }

    #[test]
    fn test_decode_bottom_up_24bit() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let data = encode_bmp(3, &[vec![red, red, red], vec![blue, blue, blue]]);

        let bmp = BmpDecoder.decode(&data).unwrap();
        assert_eq!((bmp.width(), bmp.height()), (3, 2));
        assert_eq!(bmp.get(0, 0), Some(red));
        assert_eq!(bmp.get(2, 1), Some(blue));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(BmpDecoder.decode(b"PNG..."), Err(ImageError::BadSignature));
        assert!(matches!(
            BmpDecoder.decode(b"BM\0\0"),
            Err(ImageError::Truncated { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_pixels() {
        let mut data = encode_bmp(2, &[vec![Color::WHITE, Color::WHITE]]);
        data.truncate(data.len() - 4);
        assert!(matches!(
            BmpDecoder.decode(&data),
            Err(ImageError::Truncated { .. })
        ));
    }
}
