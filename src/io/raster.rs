//! Grayscale raster load and save.

use std::path::Path;

use image::GrayImage;

use crate::schema::SourceImage;

use super::IoError;

/// Load any raster format the `image` crate understands, converted to 8-bit luma.
pub fn load_grayscale(path: &Path) -> Result<SourceImage, IoError> {
    let luma = image::open(path)?.to_luma8();
    let (width, height) = luma.dimensions();
    Ok(SourceImage::new(
        width as usize,
        height as usize,
        luma.into_raw(),
    )?)
}

/// Save a row-major grayscale buffer; the format follows the file extension.
pub fn save_grayscale(path: &Path, width: usize, height: usize, pixels: &[u8]) -> Result<(), IoError> {
    let expected = width * height;
    let buffer = GrayImage::from_raw(width as u32, height as u32, pixels.to_vec()).ok_or(
        IoError::BufferSize {
            expected,
            found: pixels.len(),
        },
    )?;
    buffer.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let pixels: Vec<u8> = (0..12).map(|i| i * 20).collect();

        save_grayscale(&path, 4, 3, &pixels).unwrap();
        let image = load_grayscale(&path).unwrap();
        assert_eq!((image.width, image.height), (4, 3));
        assert_eq!(image.pixels, pixels);
    }

    #[test]
    fn test_color_input_is_converted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        image::RgbImage::from_pixel(2, 2, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        let image = load_grayscale(&path).unwrap();
        assert_eq!(image.pixels, vec![255; 4]);
    }

    #[test]
    fn test_wrong_buffer_size() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_grayscale(&dir.path().join("x.png"), 4, 4, &[0; 3]).unwrap_err();
        assert!(matches!(err, IoError::BufferSize { expected: 16, found: 3 }));
    }
}
