//! CTC text recognizer.

use crate::core::errors::OcrError;
use crate::core::{OrtInfer, Tensor3D};
use crate::processors::{DecodedText, GreedyCtcDecoder, VocabularyTable};
use ndarray::{Array2, Array4};
use std::path::Path;
use tracing::debug;

/// Runs the recognition model over batches of rectified crops and decodes
/// the resulting logits.
///
/// All crops in a batch share the rectifier's fixed geometry, so the whole
/// page is recognized in a single `[N, 1, H, W]` forward pass.
#[derive(Debug)]
pub struct TextRecognizer {
    infer: OrtInfer,
    decoder: GreedyCtcDecoder,
}

impl TextRecognizer {
    /// Loads the recognition model and binds it to a vocabulary.
    pub fn new(model_path: &Path, vocab: Vec<String>) -> Result<Self, OcrError> {
        Ok(Self {
            infer: OrtInfer::new(model_path, "text-recognizer")?,
            decoder: GreedyCtcDecoder::new(VocabularyTable::new(vocab)?),
        })
    }

    /// Recognizes a batch of rectified crops, one transcript per crop in
    /// input order. An empty batch short-circuits without touching the
    /// model.
    pub fn recognize(&self, crops: &[Array2<f32>]) -> Result<Vec<DecodedText>, OcrError> {
        if crops.is_empty() {
            return Ok(Vec::new());
        }

        let (h, w) = crops[0].dim();
        let mut batch = Array4::zeros((crops.len(), 1, h, w));
        for (n, crop) in crops.iter().enumerate() {
            if crop.dim() != (h, w) {
                return Err(OcrError::config(format!(
                    "crop {n} has shape {:?}, expected ({h}, {w})",
                    crop.dim()
                )));
            }
            batch.slice_mut(ndarray::s![n, 0, .., ..]).assign(crop);
        }

        let logits = self.infer.infer_3d(&batch)?;
        let (batch_size, timesteps, classes) = logits.dim();
        debug!(batch_size, timesteps, classes, "recognizer logits");

        if classes != self.decoder.vocab().len() {
            return Err(OcrError::config(format!(
                "model emits {classes} classes but vocabulary has {}",
                self.decoder.vocab().len()
            )));
        }

        let probs = softmax_timesteps(logits);
        (0..batch_size)
            .map(|n| self.decoder.decode(probs.slice(ndarray::s![n, .., ..])))
            .collect()
    }
}

/// Applies a numerically-stable softmax over the class axis of every
/// timestep. Rows whose exponential sum vanishes are left all-zero rather
/// than divided.
fn softmax_timesteps(mut logits: Tensor3D) -> Tensor3D {
    for mut row in logits.rows_mut() {
        let max = row.iter().cloned().fold(f32::MIN, f32::max);
        let mut sum = 0.0f32;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        if sum > 0.0 {
            for v in row.iter_mut() {
                *v /= sum;
            }
        } else {
            row.fill(0.0);
        }
    }
    logits
}
