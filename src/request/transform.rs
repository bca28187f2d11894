//! Bitmap transformations applied after loading.

use crate::bitmap::{expected_len, Bitmap, PixelFormat};
use crate::error::{CacheError, Result};

// == Transformation ==
/// Turns one bitmap into another.
///
/// `key` must identify the output uniquely: two transformations with the same
/// key must produce the same pixels, since the key becomes part of the cache key.
pub trait Transformation: Send + Sync {
    fn key(&self) -> String;
    fn transform(&self, source: Bitmap) -> Result<Bitmap>;
}

// == Scale ==
/// Nearest-neighbour scaling to an exact size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    width: u32,
    height: u32,
}

impl Scale {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Transformation for Scale {
    fn key(&self) -> String {
        format!("resize:{}x{}", self.width, self.height)
    }

    fn transform(&self, source: Bitmap) -> Result<Bitmap> {
        if source.width() == self.width && source.height() == self.height {
            return Ok(source);
        }
        if source.width() == 0 || source.height() == 0 {
            return Err(CacheError::Load("Cannot scale an empty bitmap".to_string()));
        }

        let len = expected_len(self.width, self.height, source.format())?;
        let bpp = source.format().bytes_per_pixel();
        let stride = source.stride();
        let src = source.pixels();
        let mut out = Vec::with_capacity(len);

        for y in 0..self.height as usize {
            let sy = y * source.height() as usize / self.height as usize;
            for x in 0..self.width as usize {
                let sx = x * source.width() as usize / self.width as usize;
                let at = sy * stride + sx * bpp;
                out.extend_from_slice(&src[at..at + bpp]);
            }
        }

        Bitmap::new(self.width, self.height, source.format(), out)
    }
}

// == Center Crop ==
/// Crops the largest centered region with the target aspect ratio, then
/// scales it to the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CenterCrop {
    width: u32,
    height: u32,
}

impl CenterCrop {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Region `(x, y, w, h)` of a `src_w` x `src_h` image to keep.
    fn region(&self, src_w: u32, src_h: u32) -> (u32, u32, u32, u32) {
        let (src_w64, src_h64) = (src_w as u64, src_h as u64);
        let (dst_w, dst_h) = (self.width as u64, self.height as u64);

        let (w, h) = if src_w64 * dst_h > src_h64 * dst_w {
            ((src_h64 * dst_w / dst_h).max(1), src_h64)
        } else {
            (src_w64, (src_w64 * dst_h / dst_w).max(1))
        };
        let (w, h) = (w as u32, h as u32);
        ((src_w - w) / 2, (src_h - h) / 2, w, h)
    }
}

impl Transformation for CenterCrop {
    fn key(&self) -> String {
        format!("centerCrop:{}x{}", self.width, self.height)
    }

    fn transform(&self, source: Bitmap) -> Result<Bitmap> {
        if source.width() == 0 || source.height() == 0 {
            return Err(CacheError::Load("Cannot crop an empty bitmap".to_string()));
        }

        let (x, y, w, h) = self.region(source.width(), source.height());
        let bpp = source.format().bytes_per_pixel();
        let stride = source.stride();
        let row_len = w as usize * bpp;
        let mut out = Vec::with_capacity(row_len * h as usize);

        for row in y as usize..(y + h) as usize {
            let start = row * stride + x as usize * bpp;
            out.extend_from_slice(&source.pixels()[start..start + row_len]);
        }

        let cropped = Bitmap::new(w, h, source.format(), out)?;
        Scale::new(self.width, self.height).transform(cropped)
    }
}

// == Grayscale ==
/// Replaces color channels with luminance. Only ARGB_8888 is converted;
/// other formats pass through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grayscale;

impl Transformation for Grayscale {
    fn key(&self) -> String {
        "grayscale".to_string()
    }

    fn transform(&self, source: Bitmap) -> Result<Bitmap> {
        if source.format() != PixelFormat::Argb8888 {
            return Ok(source);
        }

        let mut out = source.pixels().to_vec();
        for pixel in out.chunks_exact_mut(4) {
            let (r, g, b) = (pixel[1] as u32, pixel[2] as u32, pixel[3] as u32);
            let luma = ((r * 299 + g * 587 + b * 114) / 1000) as u8;
            pixel[1] = luma;
            pixel[2] = luma;
            pixel[3] = luma;
        }

        Bitmap::new(source.width(), source.height(), source.format(), out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Bitmap {
        let pixels: Vec<u8> = (0..width * height).map(|i| i as u8).collect();
        Bitmap::new(width, height, PixelFormat::Alpha8, pixels).unwrap()
    }

    #[test]
    fn test_scale_down() {
        let scaled = Scale::new(2, 2).transform(gradient(4, 4)).unwrap();

        assert_eq!((scaled.width(), scaled.height()), (2, 2));
        assert_eq!(scaled.pixels(), &[0, 2, 8, 10]);
    }

    #[test]
    fn test_scale_up() {
        let scaled = Scale::new(4, 2).transform(gradient(2, 1)).unwrap();
        assert_eq!(scaled.pixels(), &[0, 0, 1, 1, 0, 0, 1, 1]);
    }

    #[test]
    fn test_scale_same_size_is_identity() {
        let source = gradient(3, 3);
        assert_eq!(Scale::new(3, 3).transform(source.clone()).unwrap(), source);
    }

    #[test]
    fn test_scale_refuses_huge_target() {
        let source = Bitmap::new(1, 1, PixelFormat::Argb8888, vec![0u8; 4]).unwrap();

        assert!(matches!(
            Scale::new(200_000, 200_000).transform(source.clone()),
            Err(CacheError::InvalidBitmap(_))
        ));
        assert!(matches!(
            CenterCrop::new(200_000, 100_000).transform(source),
            Err(CacheError::InvalidBitmap(_))
        ));
    }

    #[test]
    fn test_center_crop_wide_source() {
        // 4x2 source cropped to a square keeps the middle two columns
        let cropped = CenterCrop::new(2, 2).transform(gradient(4, 2)).unwrap();

        assert_eq!((cropped.width(), cropped.height()), (2, 2));
        assert_eq!(cropped.pixels(), &[1, 2, 5, 6]);
    }

    #[test]
    fn test_center_crop_tall_source() {
        let cropped = CenterCrop::new(1, 1).transform(gradient(1, 3)).unwrap();
        assert_eq!(cropped.pixels(), &[1]);
    }

    #[test]
    fn test_grayscale() {
        let source = Bitmap::new(1, 1, PixelFormat::Argb8888, vec![255, 255, 0, 0]).unwrap();
        let gray = Grayscale.transform(source).unwrap();

        // 255 * 0.299 = 76
        assert_eq!(gray.pixels(), &[255, 76, 76, 76]);
    }

    #[test]
    fn test_grayscale_passes_other_formats() {
        let source = gradient(2, 2);
        assert_eq!(Grayscale.transform(source.clone()).unwrap(), source);
    }

    #[test]
    fn test_keys() {
        assert_eq!(Scale::new(3, 4).key(), "resize:3x4");
        assert_eq!(CenterCrop::new(3, 4).key(), "centerCrop:3x4");
        assert_eq!(Grayscale.key(), "grayscale");
    }
}
