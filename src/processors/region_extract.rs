//! Text-region extraction from detector score maps.
//!
//! Converts the detector's half-resolution text/link score maps into
//! quadrilateral region proposals: binarize, label connected components,
//! suppress link-only pixels, dilate each component adaptively, then fit a
//! minimum-area rectangle around its largest outer contour. Components whose
//! fitted rectangle is close to square keep the axis-aligned bounding box of
//! the raw contour instead of the rotated fit.

use crate::processors::geometry::{min_area_rect, Point, Quad};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use ndarray::Array2;
use tracing::debug;

/// Components smaller than this many pixels are treated as noise.
const MIN_COMPONENT_AREA: usize = 10;

/// Fitted rectangles within this relative side-ratio distance of a square
/// fall back to the axis-aligned bounding box.
const SQUARE_RATIO_TOLERANCE: f32 = 0.1;

/// Per-pixel text and link score maps at the detector's output resolution.
#[derive(Debug)]
pub struct ScoreMaps {
    /// Character-region confidence, row-major (height, width).
    pub text: Array2<f32>,
    /// Inter-character affinity confidence, same shape as `text`.
    pub link: Array2<f32>,
}

/// Bounding statistics for one connected component.
#[derive(Debug, Clone, Copy)]
struct ComponentStats {
    area: usize,
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
}

impl ComponentStats {
    fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }
}

/// Extracts quadrilateral text regions from score maps.
#[derive(Debug, Clone, Copy)]
pub struct RegionExtractor {
    /// Minimum per-component peak text score.
    pub text_threshold: f32,
    /// Link map binarization threshold.
    pub link_threshold: f32,
    /// Text map binarization threshold.
    pub low_text: f32,
}

impl RegionExtractor {
    /// Creates an extractor with the given thresholds.
    pub fn new(text_threshold: f32, link_threshold: f32, low_text: f32) -> Self {
        Self {
            text_threshold,
            link_threshold,
            low_text,
        }
    }

    /// Extracts region quads in score-map coordinates.
    ///
    /// `dilation_factor` scales the adaptive per-component dilation; larger
    /// values merge nearby characters into wider regions.
    pub fn extract(&self, maps: &ScoreMaps, dilation_factor: f32) -> Vec<Quad> {
        let (height, width) = maps.text.dim();
        if height == 0 || width == 0 {
            return Vec::new();
        }

        let mut text_bin = vec![0u8; width * height];
        let mut link_bin = vec![0u8; width * height];
        let mut combined = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                let t = (maps.text[[y, x]] >= self.low_text) as u8;
                let l = (maps.link[[y, x]] >= self.link_threshold) as u8;
                text_bin[idx] = t;
                link_bin[idx] = l;
                combined[idx] = (t | l) as u8;
            }
        }

        let (labels, stats) = label_components(&combined, width, height);
        debug!(components = stats.len(), "labeled score map");

        let mut quads = Vec::new();
        for (label, stat) in stats.iter().enumerate() {
            let label = (label + 1) as u32;
            if stat.area < MIN_COMPONENT_AREA {
                continue;
            }

            // Peak text score over the component decides whether this blob
            // is text at all.
            let mut max_score = f32::MIN;
            for y in stat.min_y..=stat.max_y {
                for x in stat.min_x..=stat.max_x {
                    if labels[y * width + x] == label {
                        max_score = max_score.max(maps.text[[y, x]]);
                    }
                }
            }
            if max_score < self.text_threshold {
                continue;
            }

            if let Some(quad) = self.component_to_quad(
                stat,
                label,
                &labels,
                &text_bin,
                &link_bin,
                width,
                height,
                dilation_factor,
            ) {
                quads.push(quad);
            }
        }

        quads
    }

    #[allow(clippy::too_many_arguments)]
    fn component_to_quad(
        &self,
        stat: &ComponentStats,
        label: u32,
        labels: &[u32],
        text_bin: &[u8],
        link_bin: &[u8],
        width: usize,
        height: usize,
        dilation_factor: f32,
    ) -> Option<Quad> {
        let (w, h) = (stat.width(), stat.height());
        let niter = (2.0
            * dilation_factor
            * ((stat.area * w.min(h)) as f32 / (w * h) as f32).sqrt())
        .round() as usize;

        // Dilation only needs to reach `niter` beyond the component box.
        let sx = stat.min_x.saturating_sub(niter);
        let sy = stat.min_y.saturating_sub(niter);
        let ex = (stat.max_x + niter + 2).min(width);
        let ey = (stat.max_y + niter + 2).min(height);
        let (roi_w, roi_h) = (ex - sx, ey - sy);

        // Working mask: this component's pixels minus link-only pixels.
        let mut seg = vec![0u8; roi_w * roi_h];
        for y in stat.min_y..=stat.max_y {
            for x in stat.min_x..=stat.max_x {
                let idx = y * width + x;
                if labels[idx] == label && !(link_bin[idx] == 1 && text_bin[idx] == 0) {
                    seg[(y - sy) * roi_w + (x - sx)] = 1;
                }
            }
        }

        let dilated = dilate_square(&seg, roi_w, roi_h, 1 + niter);

        let mut roi_img = GrayImage::new(roi_w as u32, roi_h as u32);
        for (i, &v) in dilated.iter().enumerate() {
            if v != 0 {
                roi_img.put_pixel((i % roi_w) as u32, (i / roi_w) as u32, image::Luma([255u8]));
            }
        }

        let contour = largest_outer_contour(&roi_img)?;
        let points: Vec<Point> = contour
            .points
            .iter()
            .map(|p| Point::new((p.x as usize + sx) as f32, (p.y as usize + sy) as f32))
            .collect();
        if points.is_empty() {
            return None;
        }

        let rect = min_area_rect(&points);
        let ratio = rect.long_short_ratio();
        if (1.0 - ratio).abs() <= SQUARE_RATIO_TOLERANCE {
            // Near-square regions keep the axis-aligned contour bounds.
            let (mut l, mut t, mut r, mut b) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
            for p in &points {
                l = l.min(p.x);
                t = t.min(p.y);
                r = r.max(p.x);
                b = b.max(p.y);
            }
            Some(Quad::axis_aligned(l, t, r, b))
        } else {
            Some(Quad::from_corners_by_diagonal(rect.corners()))
        }
    }
}

/// Labels 4-connected foreground components. Returns the label map (0 is
/// background, components start at 1) and per-component statistics indexed by
/// `label - 1`.
fn label_components(mask: &[u8], width: usize, height: usize) -> (Vec<u32>, Vec<ComponentStats>) {
    let mut labels = vec![0u32; width * height];
    let mut stats = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if mask[start] == 0 || labels[start] != 0 {
            continue;
        }
        let label = stats.len() as u32 + 1;
        let mut stat = ComponentStats {
            area: 0,
            min_x: usize::MAX,
            min_y: usize::MAX,
            max_x: 0,
            max_y: 0,
        };

        labels[start] = label;
        stack.push(start);
        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % width, idx / width);
            stat.area += 1;
            stat.min_x = stat.min_x.min(x);
            stat.min_y = stat.min_y.min(y);
            stat.max_x = stat.max_x.max(x);
            stat.max_y = stat.max_y.max(y);

            let mut visit = |nx: usize, ny: usize| {
                let nidx = ny * width + nx;
                if mask[nidx] != 0 && labels[nidx] == 0 {
                    labels[nidx] = label;
                    stack.push(nidx);
                }
            };
            if x > 0 {
                visit(x - 1, y);
            }
            if x + 1 < width {
                visit(x + 1, y);
            }
            if y > 0 {
                visit(x, y - 1);
            }
            if y + 1 < height {
                visit(x, y + 1);
            }
        }

        stats.push(stat);
    }

    (labels, stats)
}

/// Binary dilation with a `kernel x kernel` square structuring element,
/// anchored at `kernel / 2` so even kernel sizes expand the mask one pixel
/// further toward the bottom-right.
fn dilate_square(mask: &[u8], width: usize, height: usize, kernel: usize) -> Vec<u8> {
    if kernel <= 1 {
        return mask.to_vec();
    }
    let anchor = kernel / 2;
    let lo = -(anchor as isize);
    let hi = (kernel - 1 - anchor) as isize;

    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            'probe: for dy in lo..=hi {
                let ny = y as isize + dy;
                if ny < 0 || ny >= height as isize {
                    continue;
                }
                for dx in lo..=hi {
                    let nx = x as isize + dx;
                    if nx < 0 || nx >= width as isize {
                        continue;
                    }
                    if mask[ny as usize * width + nx as usize] != 0 {
                        out[y * width + x] = 1;
                        break 'probe;
                    }
                }
            }
        }
    }
    out
}

/// Returns the outer contour enclosing the most area, by the shoelace
/// formula over its boundary points.
fn largest_outer_contour(img: &GrayImage) -> Option<Contour<u32>> {
    find_contours::<u32>(img)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .max_by(|a, b| {
            contour_area(a)
                .partial_cmp(&contour_area(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn contour_area(contour: &Contour<u32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for i in 0..pts.len() {
        let j = (i + 1) % pts.len();
        acc += pts[i].x as f64 * pts[j].y as f64 - pts[j].x as f64 * pts[i].y as f64;
    }
    acc.abs() / 2.0
}
