//! Grayscale source image buffer.

use super::ConfigError;

/// A single-channel 8-bit image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub width: usize,
    pub height: usize,
    /// Pixel values, `pixels[y * width + x]`.
    pub pixels: Vec<u8>,
}

impl SourceImage {
    /// Wrap a pixel buffer, checking that it matches the dimensions.
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if pixels.len() != width * height {
            return Err(ConfigError::BufferSizeMismatch {
                expected: width * height,
                found: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image filled with a single grey value.
    pub fn uniform(width: usize, height: usize, value: u8) -> Result<Self, ConfigError> {
        Self::new(width, height, vec![value; width * height])
    }

    /// Total number of pixels.
    #[inline]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Convert (x, y) to flat index.
    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels[self.idx(x, y)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_buffer() {
        let err = SourceImage::new(4, 4, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BufferSizeMismatch {
                expected: 16,
                found: 15
            }
        ));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(SourceImage::new(0, 4, Vec::new()).is_err());
    }

    #[test]
    fn test_indexing() {
        let image = SourceImage::new(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(image.get(2, 1), 5);
        assert_eq!(image.idx(1, 1), 4);
        assert_eq!(image.len(), 6);
    }
}
