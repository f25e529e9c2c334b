//! Geometric primitives for region extraction and cropping.
//!
//! Provides the 2D point and quadrilateral types used throughout the
//! pipeline, plus the minimum-area rotated rectangle fit (convex hull +
//! rotating calipers) that the region extractor applies to component
//! contours.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A text-region quadrilateral with exactly four vertices.
///
/// Vertices live in whatever coordinate space the producer used (reduced
/// heat-map space out of the extractor, original-image space after
/// rescaling). Ordering is either axis-aligned (top-left, top-right,
/// bottom-right, bottom-left) for near-square regions or ascending `x + y`
/// pairing otherwise; both are non-self-intersecting by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    /// The four vertices.
    pub points: [Point; 4],
}

impl Quad {
    /// Creates a quad from four ordered vertices.
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Creates an axis-aligned quad from edge coordinates, ordered
    /// top-left, top-right, bottom-right, bottom-left.
    pub fn axis_aligned(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            points: [
                Point::new(left, top),
                Point::new(right, top),
                Point::new(right, bottom),
                Point::new(left, bottom),
            ],
        }
    }

    /// Orders four arbitrary corners by ascending `x + y`, paired as
    /// (smallest, 2nd-smallest, largest, 3rd) to produce a consistent
    /// clockwise-ish quad. This is the tie-break ordering inherited from the
    /// reference CRAFT post-processor.
    pub fn from_corners_by_diagonal(mut corners: [Point; 4]) -> Self {
        corners.sort_by(|a, b| {
            (a.x + a.y)
                .partial_cmp(&(b.x + b.y))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            points: [corners[0], corners[1], corners[3], corners[2]],
        }
    }

    /// Returns a copy with every vertex multiplied by `factor`.
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            points: self.points.map(|p| Point::new(p.x * factor, p.y * factor)),
        }
    }

    /// Axis-aligned bounding rectangle as (min_x, min_y, max_x, max_y).
    pub fn bounding_rect(&self) -> (f32, f32, f32, f32) {
        let (min_x, max_x) = self
            .points
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = self
            .points
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .into_option()
            .unwrap_or((0.0, 0.0));
        (min_x, min_y, max_x, max_y)
    }

    /// Width of the axis-aligned bounding rectangle.
    pub fn width(&self) -> f32 {
        let (min_x, _, max_x, _) = self.bounding_rect();
        max_x - min_x
    }

    /// Height of the axis-aligned bounding rectangle.
    pub fn height(&self) -> f32 {
        let (_, min_y, _, max_y) = self.bounding_rect();
        max_y - min_y
    }
}

/// A rotated rectangle fitted around a point set.
#[derive(Debug, Clone, Copy)]
pub struct RotatedRect {
    /// Center of the rectangle.
    pub center: Point,
    /// Extent along the rectangle's local x axis.
    pub width: f32,
    /// Extent along the rectangle's local y axis.
    pub height: f32,
    /// Rotation of the local x axis, in radians.
    pub angle: f32,
}

impl RotatedRect {
    /// Ratio of the long side to the short side. The epsilon guards thin
    /// degenerate rectangles against division by zero.
    pub fn long_short_ratio(&self) -> f32 {
        let long = self.width.max(self.height);
        let short = self.width.min(self.height);
        long / (short + 1e-5)
    }

    /// The four corner points, unordered beyond a consistent winding.
    pub fn corners(&self) -> [Point; 4] {
        let (sin_a, cos_a) = self.angle.sin_cos();
        let w2 = self.width / 2.0;
        let h2 = self.height / 2.0;
        [(-w2, -h2), (w2, -h2), (w2, h2), (-w2, h2)].map(|(x, y)| {
            Point::new(
                x * cos_a - y * sin_a + self.center.x,
                x * sin_a + y * cos_a + self.center.y,
            )
        })
    }
}

fn cross(o: &Point, a: &Point, b: &Point) -> f32 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull via Andrew's monotone chain, counter-clockwise.
fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| {
        (a.x, a.y)
            .partial_cmp(&(b.x, b.y))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.dedup();

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(&lower[lower.len() - 2], &lower[lower.len() - 1], &p) <= 0.0
        {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(&upper[upper.len() - 2], &upper[upper.len() - 1], &p) <= 0.0
        {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Fits the minimum-area rotated rectangle around a point set using
/// rotating calipers over the convex hull.
///
/// Degenerate inputs (fewer than three distinct points) fall back to the
/// axis-aligned bounding rectangle.
pub fn min_area_rect(points: &[Point]) -> RotatedRect {
    let axis_aligned_fallback = |points: &[Point]| -> RotatedRect {
        let (min_x, max_x) = points
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = points
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .into_option()
            .unwrap_or((0.0, 0.0));
        RotatedRect {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            width: max_x - min_x,
            height: max_y - min_y,
            angle: 0.0,
        }
    };

    let hull = convex_hull(points);
    if hull.len() < 3 {
        return axis_aligned_fallback(points);
    }

    let mut best_area = f32::MAX;
    let mut best = axis_aligned_fallback(points);

    let n = hull.len();
    for i in 0..n {
        let j = (i + 1) % n;
        let ex = hull[j].x - hull[i].x;
        let ey = hull[j].y - hull[i].y;
        let len = (ex * ex + ey * ey).sqrt();
        if len < f32::EPSILON {
            continue;
        }
        let (nx, ny) = (ex / len, ey / len);
        // Perpendicular axis of the candidate rectangle.
        let (px, py) = (-ny, nx);

        let mut min_n = f32::MAX;
        let mut max_n = f32::MIN;
        let mut min_p = f32::MAX;
        let mut max_p = f32::MIN;
        for point in &hull {
            let dn = nx * (point.x - hull[i].x) + ny * (point.y - hull[i].y);
            let dp = px * (point.x - hull[i].x) + py * (point.y - hull[i].y);
            min_n = min_n.min(dn);
            max_n = max_n.max(dn);
            min_p = min_p.min(dp);
            max_p = max_p.max(dp);
        }

        let width = max_n - min_n;
        let height = max_p - min_p;
        let area = width * height;
        if area < best_area {
            best_area = area;
            let cn = (min_n + max_n) / 2.0;
            let cp = (min_p + max_p) / 2.0;
            best = RotatedRect {
                center: Point::new(
                    hull[i].x + cn * nx + cp * px,
                    hull[i].y + cn * ny + cp * py,
                ),
                width,
                height,
                angle: f32::atan2(ny, nx),
            };
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_always_has_four_vertices() {
        let quad = Quad::axis_aligned(0.0, 0.0, 10.0, 5.0);
        assert_eq!(quad.points.len(), 4);
        assert_eq!(quad.points[0], Point::new(0.0, 0.0));
        assert_eq!(quad.points[2], Point::new(10.0, 5.0));
    }

    #[test]
    fn test_quad_scale_round_trip() {
        let quad = Quad::from_corners_by_diagonal([
            Point::new(3.0, 7.0),
            Point::new(11.0, 2.0),
            Point::new(13.0, 9.0),
            Point::new(1.0, 1.0),
        ]);
        let ratio = 0.4375;
        let restored = quad.scale(ratio).scale(1.0 / ratio);
        for (orig, back) in quad.points.iter().zip(restored.points.iter()) {
            assert!((orig.x - back.x).abs() < 1e-3);
            assert!((orig.y - back.y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_diagonal_ordering_pairs_corners() {
        // Corners of an axis-aligned rectangle in shuffled order.
        let quad = Quad::from_corners_by_diagonal([
            Point::new(10.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 5.0),
            Point::new(10.0, 0.0),
        ]);
        // Smallest x+y first, largest third.
        assert_eq!(quad.points[0], Point::new(0.0, 0.0));
        assert_eq!(quad.points[2], Point::new(10.0, 5.0));
    }

    #[test]
    fn test_min_area_rect_axis_aligned() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(8.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let rect = min_area_rect(&points);
        let (long, short) = (
            rect.width.max(rect.height),
            rect.width.min(rect.height),
        );
        assert!((long - 8.0).abs() < 1e-4);
        assert!((short - 4.0).abs() < 1e-4);
        assert!((rect.center.x - 4.0).abs() < 1e-4);
        assert!((rect.center.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_min_area_rect_rotated_square() {
        // A unit square rotated 45 degrees: diamond with corners on axes.
        let points = [
            Point::new(1.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(1.0, 2.0),
            Point::new(0.0, 1.0),
        ];
        let rect = min_area_rect(&points);
        let side = 2.0_f32.sqrt();
        assert!((rect.width - side).abs() < 1e-3);
        assert!((rect.height - side).abs() < 1e-3);
        assert!(rect.long_short_ratio() < 1.01);
    }

    #[test]
    fn test_min_area_rect_degenerate_line() {
        let points = [Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
        let rect = min_area_rect(&points);
        assert!((rect.width - 4.0).abs() < 1e-4);
        assert_eq!(rect.height, 0.0);
    }

    #[test]
    fn test_rotated_rect_corners_reconstruct_extents() {
        let rect = RotatedRect {
            center: Point::new(5.0, 5.0),
            width: 6.0,
            height: 2.0,
            angle: std::f32::consts::FRAC_PI_4,
        };
        let corners = rect.corners();
        assert_eq!(corners.len(), 4);
        // Opposite corners are a diagonal apart.
        let diag = (6.0_f32.powi(2) + 2.0_f32.powi(2)).sqrt();
        assert!((corners[0].distance(&corners[2]) - diag).abs() < 1e-3);
    }
}
