//! Bitmap Module
//!
//! Decoded image pixels, the value type the image cache stores.

use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::cache::Sizer;
use crate::error::{CacheError, Result};

// == Pixel Format ==
/// Pixel layout of a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Alpha8,
    Rgb565,
    Argb4444,
    Argb8888,
    RgbaF16,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Alpha8 => 1,
            PixelFormat::Rgb565 | PixelFormat::Argb4444 => 2,
            PixelFormat::Argb8888 => 4,
            PixelFormat::RgbaF16 => 8,
        }
    }

    /// Wire tag used by the raw file format.
    pub fn tag(self) -> u8 {
        match self {
            PixelFormat::Alpha8 => 0,
            PixelFormat::Rgb565 => 1,
            PixelFormat::Argb4444 => 2,
            PixelFormat::Argb8888 => 3,
            PixelFormat::RgbaF16 => 4,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => PixelFormat::Alpha8,
            1 => PixelFormat::Rgb565,
            2 => PixelFormat::Argb4444,
            3 => PixelFormat::Argb8888,
            4 => PixelFormat::RgbaF16,
            other => {
                return Err(CacheError::InvalidBitmap(format!(
                    "Unknown pixel format tag {}",
                    other
                )))
            }
        })
    }
}

/// Length of the raw file header: width, height, format tag.
pub const RAW_HEADER_LEN: usize = 9;

/// Largest pixel buffer a bitmap may hold.
pub const MAX_BITMAP_BYTES: usize = 256 * 1024 * 1024;

// == Bitmap ==
/// Immutable decoded image. Cloning shares the pixel buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Bytes,
}

impl Bitmap {
    /// Wraps a pixel buffer, checking it matches `width * height * bpp`.
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: impl Into<Bytes>) -> Result<Self> {
        let pixels = pixels.into();
        let expected = expected_len(width, height, format)?;
        if pixels.len() != expected {
            return Err(CacheError::InvalidBitmap(format!(
                "{}x{} {:?} needs {} bytes, got {}",
                width,
                height,
                format,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// A bitmap with every pixel set to `pixel`, which must be one pixel wide.
    pub fn filled(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != format.bytes_per_pixel() {
            return Err(CacheError::InvalidBitmap(format!(
                "{:?} pixels are {} bytes, got {}",
                format,
                format.bytes_per_pixel(),
                pixel.len()
            )));
        }
        let count = expected_len(width, height, format)? / pixel.len();
        Self::new(width, height, format, pixel.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Memory held by the pixel buffer.
    pub fn byte_count(&self) -> usize {
        self.pixels.len()
    }

    /// Bytes in one row of pixels.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    // == Raw Codec ==
    /// Decodes the raw format: big-endian `u32` width, `u32` height, a format
    /// tag byte, then the pixel buffer. The pixels share `data`'s storage.
    pub fn decode_raw(mut data: Bytes) -> Result<Self> {
        if data.len() < RAW_HEADER_LEN {
            return Err(CacheError::InvalidBitmap(format!(
                "Raw bitmap needs a {} byte header, got {} bytes",
                RAW_HEADER_LEN,
                data.len()
            )));
        }
        let width = data.get_u32();
        let height = data.get_u32();
        let format = PixelFormat::from_tag(data.get_u8())?;
        Self::new(width, height, format, data)
    }

    /// Encodes into the format read by [`decode_raw`](Self::decode_raw).
    pub fn encode_raw(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(RAW_HEADER_LEN + self.pixels.len());
        out.put_u32(self.width);
        out.put_u32(self.height);
        out.put_u8(self.format.tag());
        out.put_slice(&self.pixels);
        out.freeze()
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Byte length of a `width` x `height` buffer in `format`, refusing anything
/// above [`MAX_BITMAP_BYTES`].
pub(crate) fn expected_len(width: u32, height: u32, format: PixelFormat) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
        .filter(|&len| len <= MAX_BITMAP_BYTES)
        .ok_or_else(|| {
            CacheError::InvalidBitmap(format!(
                "{}x{} {:?} exceeds the {} byte bitmap limit",
                width, height, format, MAX_BITMAP_BYTES
            ))
        })
}

// == Bitmap Sizer ==
/// Sizes bitmaps by their pixel buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapSizer;

impl Sizer<Bitmap> for BitmapSizer {
    fn size_of(&self, value: &Bitmap) -> usize {
        value.byte_count()
    }
}

impl Sizer<Arc<Bitmap>> for BitmapSizer {
    fn size_of(&self, value: &Arc<Bitmap>) -> usize {
        value.byte_count()
    }
}
