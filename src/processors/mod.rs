//! Image and sequence processing stages of the pipeline.

pub mod crop;
pub mod decode;
pub mod geometry;
pub mod preprocess;
pub mod region_extract;

pub use crop::CropRectifier;
pub use decode::{DecodedText, GreedyCtcDecoder, VocabularyTable, BLANK_INDEX};
pub use geometry::{min_area_rect, Point, Quad, RotatedRect};
pub use preprocess::{normalize_mean_variance, resize_aspect_ratio, ResizedCanvas};
pub use region_extract::{RegionExtractor, ScoreMaps};
