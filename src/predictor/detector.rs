//! CRAFT-style text detector.

use crate::core::errors::OcrError;
use crate::core::{OrtInfer, Tensor4D};
use crate::processors::ScoreMaps;
use ndarray::Array2;
use std::path::Path;
use tracing::debug;

/// Runs the detection model and splits its output into score maps.
///
/// The model consumes a normalized `[1, 3, H, W]` canvas tensor and produces
/// `[N, H/2, W/2, 2]`: channel 0 is the text score, channel 1 the link
/// score.
#[derive(Debug)]
pub struct TextDetector {
    infer: OrtInfer,
}

impl TextDetector {
    /// Loads the detection model from a file.
    pub fn new(model_path: &Path) -> Result<Self, OcrError> {
        Ok(Self {
            infer: OrtInfer::new(model_path, "text-detector")?,
        })
    }

    /// Runs detection on a normalized canvas tensor.
    pub fn detect(&self, input: &Tensor4D) -> Result<ScoreMaps, OcrError> {
        let output = self.infer.infer_4d(input)?;
        let shape = output.shape().to_vec();

        if shape[0] != 1 || shape[3] != 2 {
            return Err(OcrError::inference_shape(
                self.infer.model_name(),
                format!("expected output shape [1, H, W, 2], got {shape:?}"),
            ));
        }
        let (h, w) = (shape[1], shape[2]);
        debug!(height = h, width = w, "detector score maps");

        let mut text = Array2::zeros((h, w));
        let mut link = Array2::zeros((h, w));
        for y in 0..h {
            for x in 0..w {
                text[[y, x]] = output[[0, y, x, 0]];
                link[[y, x]] = output[[0, y, x, 1]];
            }
        }

        Ok(ScoreMaps { text, link })
    }
}
