//! Perspective cropping and rectification of text regions.
//!
//! Each detected quad is warped to an upright rectangle sized from its edge
//! lengths, then rectified to the recognizer's fixed input geometry: resized
//! to the target height keeping aspect ratio, right-padded by replicating
//! the last column, and scaled into 0..1.

use crate::processors::geometry::Quad;
use image::GrayImage;
use nalgebra::{Matrix3, OMatrix, OVector, U8};
use ndarray::Array2;
use rayon::prelude::*;
use tracing::warn;

/// Projective transform mapping destination pixels back into the source
/// image.
#[derive(Debug, Clone, Copy)]
struct PerspectiveTransform {
    matrix: Matrix3<f64>,
}

impl PerspectiveTransform {
    /// Solves the 8-coefficient homography sending `from` corners onto `to`
    /// corners. Returns `None` when the corner configuration is degenerate.
    fn from_quads(from: [(f64, f64); 4], to: [(f64, f64); 4]) -> Option<Self> {
        let mut a = OMatrix::<f64, U8, U8>::zeros();
        let mut b = OVector::<f64, U8>::zeros();

        for i in 0..4 {
            let (x, y) = from[i];
            let (u, v) = to[i];

            a[(2 * i, 0)] = x;
            a[(2 * i, 1)] = y;
            a[(2 * i, 2)] = 1.0;
            a[(2 * i, 6)] = -x * u;
            a[(2 * i, 7)] = -y * u;
            b[2 * i] = u;

            a[(2 * i + 1, 3)] = x;
            a[(2 * i + 1, 4)] = y;
            a[(2 * i + 1, 5)] = 1.0;
            a[(2 * i + 1, 6)] = -x * v;
            a[(2 * i + 1, 7)] = -y * v;
            b[2 * i + 1] = v;
        }

        let coeffs = a.lu().solve(&b)?;
        Some(Self {
            matrix: Matrix3::new(
                coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4], coeffs[5], coeffs[6],
                coeffs[7], 1.0,
            ),
        })
    }

    #[inline]
    fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let w = self.matrix[(2, 0)] * x + self.matrix[(2, 1)] * y + self.matrix[(2, 2)];
        if w.abs() < 1e-12 {
            return None;
        }
        let u = (self.matrix[(0, 0)] * x + self.matrix[(0, 1)] * y + self.matrix[(0, 2)]) / w;
        let v = (self.matrix[(1, 0)] * x + self.matrix[(1, 1)] * y + self.matrix[(1, 2)]) / w;
        Some((u, v))
    }
}

#[inline]
fn sample_bilinear(img: &GrayImage, x: f64, y: f64) -> u8 {
    let (width, height) = img.dimensions();
    if x < 0.0 || y < 0.0 || x > (width - 1) as f64 || y > (height - 1) as f64 {
        return 0;
    }
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = img.get_pixel(x0, y0).0[0] as f64;
    let p10 = img.get_pixel(x1, y0).0[0] as f64;
    let p01 = img.get_pixel(x0, y1).0[0] as f64;
    let p11 = img.get_pixel(x1, y1).0[0] as f64;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}

/// Crops quads from grayscale pages and rectifies them to the recognizer's
/// fixed input size.
#[derive(Debug, Clone, Copy)]
pub struct CropRectifier {
    /// Fixed output height of rectified crops.
    pub target_h: u32,
    /// Fixed output width of rectified crops.
    pub max_w: u32,
}

impl CropRectifier {
    /// Creates a rectifier for the given recognizer input geometry.
    pub fn new(target_h: u32, max_w: u32) -> Self {
        Self { target_h, max_w }
    }

    /// Warps the quad out of the page into an upright grayscale patch.
    ///
    /// The patch is sized from the quad's opposing edge lengths. Degenerate
    /// quads (collinear corners, singular homography) yield `None` so a
    /// single bad region cannot abort the page.
    pub fn crop_quad(&self, img: &GrayImage, quad: &Quad) -> Option<GrayImage> {
        let [tl, tr, br, bl] = quad.points;

        let dest_w = br.distance(&bl).max(tr.distance(&tl)).round().max(1.0) as u32;
        let dest_h = tr.distance(&br).max(tl.distance(&bl)).round().max(1.0) as u32;

        let dst_corners = [
            (0.0, 0.0),
            (dest_w as f64, 0.0),
            (dest_w as f64, dest_h as f64),
            (0.0, dest_h as f64),
        ];
        let src_corners = quad.points.map(|p| (p.x as f64, p.y as f64));

        // Inverse mapping: destination rectangle back onto the source quad.
        let Some(transform) = PerspectiveTransform::from_quads(dst_corners, src_corners) else {
            warn!(
                width = dest_w,
                height = dest_h,
                "degenerate quad, skipping crop"
            );
            return None;
        };

        let mut buffer = vec![0u8; (dest_w * dest_h) as usize];
        buffer
            .par_chunks_mut(dest_w as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, out) in row.iter_mut().enumerate() {
                    if let Some((sx, sy)) = transform.apply(x as f64, y as f64) {
                        *out = sample_bilinear(img, sx, sy);
                    }
                }
            });

        GrayImage::from_raw(dest_w, dest_h, buffer)
    }

    /// Rectifies a cropped patch to `(target_h, max_w)`: aspect-preserving
    /// resize to the target height, right-pad by replicating the last
    /// column, and scale pixel values into 0..1.
    pub fn rectify(&self, crop: &GrayImage) -> Array2<f32> {
        let (w, h) = crop.dimensions();
        let ratio = w as f32 / h.max(1) as f32;
        let target_w = ((self.target_h as f32 * ratio).ceil() as u32)
            .max(1)
            .min(self.max_w);

        let resized = image::imageops::resize(
            crop,
            target_w,
            self.target_h,
            image::imageops::FilterType::Triangle,
        );

        let mut out = Array2::zeros((self.target_h as usize, self.max_w as usize));
        for y in 0..self.target_h {
            for x in 0..self.max_w {
                let sx = x.min(target_w - 1);
                out[[y as usize, x as usize]] = resized.get_pixel(sx, y).0[0] as f32 / 255.0;
            }
        }
        out
    }

    /// Crops and rectifies in one step.
    pub fn crop_and_rectify(&self, img: &GrayImage, quad: &Quad) -> Option<Array2<f32>> {
        self.crop_quad(img, quad).map(|crop| self.rectify(&crop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::geometry::Point;
    use image::Luma;

    fn gradient_page(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x % 256) as u8]))
    }

    #[test]
    fn test_axis_aligned_crop_is_exact() {
        let page = gradient_page(200, 100);
        let quad = Quad::axis_aligned(20.0, 10.0, 120.0, 60.0);
        let crop = CropRectifier::new(64, 256).crop_quad(&page, &quad).unwrap();
        assert_eq!(crop.dimensions(), (100, 50));
        // Every destination column maps straight back to source column x+20.
        assert_eq!(crop.get_pixel(0, 0).0[0], 20);
        assert_eq!(crop.get_pixel(50, 25).0[0], 70);
    }

    #[test]
    fn test_degenerate_quad_returns_none() {
        let page = gradient_page(50, 50);
        // All four corners collinear.
        let quad = Quad::new([
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(30.0, 0.0),
        ]);
        assert!(CropRectifier::new(64, 256).crop_quad(&page, &quad).is_none());
    }

    #[test]
    fn test_rectify_dimensions_and_scale() {
        let crop = GrayImage::from_pixel(100, 50, Luma([255]));
        let rectified = CropRectifier::new(64, 256).rectify(&crop);
        assert_eq!(rectified.dim(), (64, 256));
        // Aspect-preserved width is ceil(64 * 100/50) = 128; padding
        // replicates the last (white) column, so everything is 1.0.
        assert!((rectified[[0, 0]] - 1.0).abs() < 1e-6);
        assert!((rectified[[63, 255]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rectify_pads_with_last_column() {
        // Left half black, right half white; after resize the final column
        // is white and the pad band copies it.
        let crop = GrayImage::from_fn(100, 50, |x, _| {
            if x < 50 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let rectified = CropRectifier::new(64, 256).rectify(&crop);
        assert!((rectified[[10, 255]] - 1.0).abs() < 1e-6);
        assert!(rectified[[10, 0]] < 0.1);
    }

    #[test]
    fn test_rectify_caps_width_for_wide_crops() {
        let crop = GrayImage::from_pixel(4000, 50, Luma([128]));
        let rectified = CropRectifier::new(64, 256).rectify(&crop);
        assert_eq!(rectified.dim(), (64, 256));
    }

    #[test]
    fn test_rotated_quad_produces_edge_sized_patch() {
        let page = gradient_page(200, 200);
        // A 45-degree rotated rectangle with side lengths ~100 and ~50.
        let quad = Quad::new([
            Point::new(100.0, 30.0),
            Point::new(170.71, 100.71),
            Point::new(135.36, 136.06),
            Point::new(64.64, 65.36),
        ]);
        let crop = CropRectifier::new(64, 256).crop_quad(&page, &quad).unwrap();
        let (w, h) = crop.dimensions();
        assert!((w as i64 - 100).abs() <= 1);
        assert!((h as i64 - 50).abs() <= 1);
    }
}
