//! Detection preprocessing: aspect-preserving resize, stride padding, and
//! mean/variance normalization.

use crate::core::Tensor4D;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;

/// ImageNet channel means, scaled to the 0..255 pixel range.
const MEAN: [f32; 3] = [0.485 * 255.0, 0.456 * 255.0, 0.406 * 255.0];
/// ImageNet channel standard deviations, scaled to the 0..255 pixel range.
const STD: [f32; 3] = [0.229 * 255.0, 0.224 * 255.0, 0.225 * 255.0];

/// Result of the detection resize step.
#[derive(Debug)]
pub struct ResizedCanvas {
    /// Resized image zero-padded to stride-32 dimensions.
    pub canvas: RgbImage,
    /// Scale factor applied to the original image (resized / original).
    pub ratio: f32,
    /// Expected (width, height) of the detector's half-resolution score maps.
    pub heatmap_size: (u32, u32),
}

/// Resizes an image so its longest side is `mag_ratio * max(h, w)` capped at
/// `canvas_size`, then zero-pads the bottom/right edges up to the next
/// multiples of 32.
///
/// The returned ratio maps original coordinates into canvas coordinates;
/// polygons detected on the canvas are mapped back with its reciprocal.
pub fn resize_aspect_ratio(img: &RgbImage, canvas_size: u32, mag_ratio: f32) -> ResizedCanvas {
    let (width, height) = img.dimensions();
    let max_side = width.max(height).max(1) as f32;

    let mut target_size = mag_ratio * max_side;
    if target_size > canvas_size as f32 {
        target_size = canvas_size as f32;
    }
    let ratio = target_size / max_side;

    let target_w = ((width as f32 * ratio) as u32).max(1);
    let target_h = ((height as f32 * ratio) as u32).max(1);
    let resized = image::imageops::resize(img, target_w, target_h, FilterType::Triangle);

    let pad_to_32 = |v: u32| -> u32 {
        if v % 32 == 0 {
            v
        } else {
            v + (32 - v % 32)
        }
    };
    let canvas_w = pad_to_32(target_w);
    let canvas_h = pad_to_32(target_h);

    let mut canvas = RgbImage::new(canvas_w, canvas_h);
    image::imageops::replace(&mut canvas, &resized, 0, 0);

    ResizedCanvas {
        canvas,
        ratio,
        heatmap_size: (canvas_w / 2, canvas_h / 2),
    }
}

/// Normalizes an RGB canvas with ImageNet statistics into a CHW tensor with
/// batch dimension 1.
pub fn normalize_mean_variance(img: &RgbImage) -> Tensor4D {
    let (width, height) = img.dimensions();
    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in img.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel.0[c] as f32 - MEAN[c]) / STD[c];
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_resize_pads_to_multiple_of_32() {
        let img = RgbImage::new(100, 60);
        let resized = resize_aspect_ratio(&img, 2560, 1.0);
        assert_eq!(resized.canvas.width() % 32, 0);
        assert_eq!(resized.canvas.height() % 32, 0);
        assert_eq!(resized.canvas.dimensions(), (128, 64));
        assert_eq!(resized.heatmap_size, (64, 32));
        assert!((resized.ratio - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_caps_at_canvas_size() {
        let img = RgbImage::new(4000, 2000);
        let resized = resize_aspect_ratio(&img, 2560, 1.0);
        assert_eq!(resized.canvas.width(), 2560);
        assert!((resized.ratio - 2560.0 / 4000.0).abs() < 1e-6);
    }

    #[test]
    fn test_resize_preserves_exact_stride_dimensions() {
        let img = RgbImage::new(64, 32);
        let resized = resize_aspect_ratio(&img, 2560, 1.0);
        assert_eq!(resized.canvas.dimensions(), (64, 32));
    }

    #[test]
    fn test_resize_magnifies_small_images() {
        let img = RgbImage::new(100, 50);
        let resized = resize_aspect_ratio(&img, 2560, 2.0);
        // Longest side doubled, then padded.
        assert!((resized.ratio - 2.0).abs() < 1e-6);
        assert_eq!(resized.canvas.dimensions(), (224, 128));
    }

    #[test]
    fn test_padding_region_is_zero() {
        let mut img = RgbImage::new(100, 60);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([255, 255, 255]);
        }
        let resized = resize_aspect_ratio(&img, 2560, 1.0);
        // Bottom-right corner lies in the padded band.
        assert_eq!(resized.canvas.get_pixel(127, 63).0, [0, 0, 0]);
        assert_eq!(resized.canvas.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_normalize_shape_and_values() {
        let mut img = RgbImage::new(4, 2);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([124, 116, 104]);
        }
        let tensor = normalize_mean_variance(&img);
        assert_eq!(tensor.shape(), &[1, 3, 2, 4]);
        // 124 is close to 0.485*255 = 123.675, so the red channel sits near 0.
        assert!(tensor[[0, 0, 0, 0]].abs() < 0.01);
    }
}
