//! The end-to-end OCR engine.
//!
//! [`OcrEngine`] wires the stages together: detection preprocessing, the
//! detector forward pass, region extraction, perspective cropping, batched
//! recognition, and bubble-role formatting. Model sessions are owned by the
//! engine and loaded once at construction.

pub mod formatter;

pub use formatter::{format_output, TextRole};

use crate::core::errors::{OcrError, ProcessingStage};
use crate::core::EngineConfig;
use crate::predictor::{TextDetector, TextRecognizer};
use crate::processors::{
    normalize_mean_variance, resize_aspect_ratio, CropRectifier, Quad, RegionExtractor, ScoreMaps,
};
use crate::utils::{dynamic_to_gray, dynamic_to_rgb, load_image, load_image_from_bytes};
use std::path::PathBuf;
use tracing::{info, warn};

/// An input page, either on disk or already in memory.
#[derive(Debug, Clone)]
pub enum OcrInput {
    /// Path to an encoded image file.
    Path(PathBuf),
    /// Encoded image bytes.
    Bytes(Vec<u8>),
}

impl From<PathBuf> for OcrInput {
    fn from(path: PathBuf) -> Self {
        OcrInput::Path(path)
    }
}

impl From<Vec<u8>> for OcrInput {
    fn from(bytes: Vec<u8>) -> Self {
        OcrInput::Bytes(bytes)
    }
}

/// One recognized region.
#[derive(Debug, Clone)]
pub struct DecodedEntry {
    /// The decoded transcript.
    pub text: String,
    /// Product of the emitted timesteps' peak probabilities.
    pub confidence: f32,
    /// Region geometry in original-image coordinates, when available.
    pub quad: Option<Quad>,
}

/// Structured result of recognizing one page.
#[derive(Debug, Clone, Default)]
pub struct OcrOutput {
    /// Recognized regions in detection order.
    pub entries: Vec<DecodedEntry>,
    /// Plain transcripts without geometry, in the same order.
    pub descriptions: Vec<String>,
}

/// The full OCR pipeline for one language profile.
///
/// Construction loads both model sessions; after that the engine is
/// reusable across pages and shareable across threads.
#[derive(Debug)]
pub struct OcrEngine {
    config: EngineConfig,
    detector: TextDetector,
    recognizer: TextRecognizer,
    extractor: RegionExtractor,
    rectifier: CropRectifier,
}

impl OcrEngine {
    /// Builds an engine from a configuration, loading both models.
    pub fn new(config: EngineConfig) -> Result<Self, OcrError> {
        let detector = TextDetector::new(&config.detector_model)?;
        let recognizer = TextRecognizer::new(&config.recognizer_model, config.vocab.clone())?;
        let extractor = RegionExtractor::new(
            config.text_threshold,
            config.link_threshold,
            config.low_text,
        );
        let rectifier = CropRectifier::new(config.img_h, config.img_w);
        info!(lang = %config.lang, vocab_size = config.vocab_size(), "engine ready");

        Ok(Self {
            config,
            detector,
            recognizer,
            extractor,
            rectifier,
        })
    }

    /// Returns the engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recognizes a page and returns the structured output.
    ///
    /// `dilation_factor` controls how aggressively nearby characters are
    /// merged into one region; 1.0 matches the detector's training-time
    /// behavior, larger values suit sparse hand-lettered text.
    pub fn recognize_page(
        &self,
        input: &OcrInput,
        dilation_factor: f32,
    ) -> Result<OcrOutput, OcrError> {
        let dynamic = match input {
            OcrInput::Path(path) => load_image(path)?,
            OcrInput::Bytes(bytes) => load_image_from_bytes(bytes)?,
        };
        let rgb = dynamic_to_rgb(&dynamic);
        let gray = dynamic_to_gray(&dynamic);
        ensure_page_nonempty(rgb.width(), rgb.height())?;

        let resized = resize_aspect_ratio(&rgb, self.config.canvas_size, self.config.mag_ratio);
        let tensor = normalize_mean_variance(&resized.canvas);
        let maps = self.detector.detect(&tensor)?;
        ensure_map_size(&maps, resized.heatmap_size)?;

        let map_quads = self.extractor.extract(&maps, dilation_factor);
        info!(regions = map_quads.len(), ratio = resized.ratio, "detection done");

        // Score maps live in canvas coordinates scaled by `ratio`; undo it.
        let scale = 1.0 / resized.ratio;
        let mut quads = Vec::with_capacity(map_quads.len());
        let mut crops = Vec::with_capacity(map_quads.len());
        for quad in map_quads {
            let quad = quad.scale(scale);
            match self.rectifier.crop_and_rectify(&gray, &quad) {
                Some(crop) => {
                    quads.push(quad);
                    crops.push(crop);
                }
                None => warn!("dropping unusable region"),
            }
        }

        let decoded = self.recognizer.recognize(&crops)?;

        let mut output = OcrOutput::default();
        for (quad, decoded) in quads.into_iter().zip(decoded) {
            output.descriptions.push(decoded.text.clone());
            output.entries.push(DecodedEntry {
                text: decoded.text,
                confidence: decoded.confidence,
                quad: Some(quad),
            });
        }
        Ok(output)
    }

    /// Recognizes a page and renders the marker-prefixed transcript.
    pub fn run(&self, input: &OcrInput, dilation_factor: f32) -> Result<String, OcrError> {
        let output = self.recognize_page(input, dilation_factor)?;
        Ok(format_output(&output))
    }
}

fn ensure_page_nonempty(width: u32, height: u32) -> Result<(), OcrError> {
    if width == 0 || height == 0 {
        return Err(OcrError::processing(
            ProcessingStage::Preprocessing,
            format!("page has empty dimensions {width}x{height}"),
        ));
    }
    Ok(())
}

/// Region coordinates are only meaningful if the detector produced maps at
/// the half-resolution size implied by the padded canvas.
fn ensure_map_size(maps: &ScoreMaps, expected: (u32, u32)) -> Result<(), OcrError> {
    let (h, w) = maps.text.dim();
    if (w as u32, h as u32) != expected {
        return Err(OcrError::processing(
            ProcessingStage::RegionExtraction,
            format!(
                "score maps are {w}x{h}, expected {}x{}",
                expected.0, expected.1
            ),
        ));
    }
    Ok(())
}
