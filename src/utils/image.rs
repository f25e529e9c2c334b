//! Image loading and colorspace helpers.

use crate::core::errors::OcrError;
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;

/// Loads an image from a file path.
pub fn load_image(path: &Path) -> Result<DynamicImage, OcrError> {
    image::open(path).map_err(OcrError::ImageLoad)
}

/// Decodes an image from an in-memory encoded buffer.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    image::load_from_memory(bytes).map_err(OcrError::ImageLoad)
}

/// Converts to 8-bit RGB, flattening any alpha channel.
pub fn dynamic_to_rgb(img: &DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Converts to 8-bit grayscale.
pub fn dynamic_to_gray(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_bytes_are_image_load_errors() {
        let result = load_image_from_bytes(&[0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(OcrError::ImageLoad(_))));
    }

    #[test]
    fn test_conversions_preserve_dimensions() {
        let img = DynamicImage::new_rgba8(12, 7);
        assert_eq!(dynamic_to_rgb(&img).dimensions(), (12, 7));
        assert_eq!(dynamic_to_gray(&img).dimensions(), (12, 7));
    }
}
