//! ONNX Runtime inference wrapper.
//!
//! [`OrtInfer`] owns one session per model, discovers the input/output tensor
//! names from the model metadata, and exposes rank-validated entry points for
//! the two output layouts this pipeline consumes: rank-4 detection heat maps
//! and rank-3 recognition logits. A malformed output shape is reported as an
//! inference error, never silently reinterpreted.

use crate::core::errors::OcrError;
use crate::core::{Tensor3D, Tensor4D};
use ndarray::{ArrayView3, ArrayView4};
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An ONNX Runtime session bound to one model file.
///
/// The session is created once at construction and reused for the lifetime of
/// the owning engine. Invocations serialize on an internal mutex; the struct
/// itself is `Send + Sync` so one engine can be shared across threads.
pub struct OrtInfer {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Loads a session from a model file and discovers its tensor names.
    pub fn new(model_path: &Path, model_name: &str) -> Result<Self, OcrError> {
        let session = Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| {
                OcrError::inference(
                    model_name,
                    format!("failed to create session from '{}'", model_path.display()),
                    e,
                )
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| {
                OcrError::inference_shape(model_name, "model declares no input tensors")
            })?;
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| {
                OcrError::inference_shape(model_name, "model declares no output tensors")
            })?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            model_path: model_path.to_path_buf(),
            model_name: model_name.to_string(),
        })
    }

    /// Returns the model name associated with this engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn run_inference_with_processor<T>(
        &self,
        x: &Tensor4D,
        processor: impl FnOnce(&[i64], &[f32]) -> Result<T, OcrError>,
    ) -> Result<T, OcrError> {
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            OcrError::inference(
                &self.model_name,
                format!("failed to convert input tensor with shape {input_shape:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| {
            OcrError::inference_shape(&self.model_name, "session lock poisoned")
        })?;
        let outputs = session.run(inputs).map_err(|e| {
            OcrError::inference(
                &self.model_name,
                format!(
                    "forward pass failed with input '{}' -> output '{}'",
                    self.input_name, self.output_name
                ),
                e,
            )
        })?;

        let output = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OcrError::inference(
                    &self.model_name,
                    format!("failed to extract output '{}' as f32", self.output_name),
                    e,
                )
            })?;
        let (output_shape, output_data) = output;

        processor(output_shape, output_data)
    }

    /// Runs inference expecting a rank-4 output tensor.
    pub fn infer_4d(&self, x: &Tensor4D) -> Result<Tensor4D, OcrError> {
        let model_name = self.model_name.clone();
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 4 {
                return Err(OcrError::inference_shape(
                    &model_name,
                    format!(
                        "expected rank-4 output, got rank {} with shape {output_shape:?}",
                        output_shape.len()
                    ),
                ));
            }
            let dims = (
                output_shape[0] as usize,
                output_shape[1] as usize,
                output_shape[2] as usize,
                output_shape[3] as usize,
            );
            let expected_len = dims.0 * dims.1 * dims.2 * dims.3;
            if output_data.len() != expected_len {
                return Err(OcrError::inference_shape(
                    &model_name,
                    format!(
                        "output data size mismatch: expected {expected_len}, got {}",
                        output_data.len()
                    ),
                ));
            }
            let view = ArrayView4::from_shape(dims, output_data).map_err(OcrError::Tensor)?;
            Ok(view.to_owned())
        })
    }

    /// Runs inference expecting a rank-3 output tensor (batch, time, class).
    pub fn infer_3d(&self, x: &Tensor4D) -> Result<Tensor3D, OcrError> {
        let model_name = self.model_name.clone();
        self.run_inference_with_processor(x, |output_shape, output_data| {
            if output_shape.len() != 3 {
                return Err(OcrError::inference_shape(
                    &model_name,
                    format!(
                        "expected rank-3 output, got rank {} with shape {output_shape:?}",
                        output_shape.len()
                    ),
                ));
            }
            let dims = (
                output_shape[0] as usize,
                output_shape[1] as usize,
                output_shape[2] as usize,
            );
            let expected_len = dims.0 * dims.1 * dims.2;
            if output_data.len() != expected_len {
                return Err(OcrError::inference_shape(
                    &model_name,
                    format!(
                        "output data size mismatch: expected {expected_len}, got {}",
                        output_data.len()
                    ),
                ));
            }
            let view = ArrayView3::from_shape(dims, output_data).map_err(OcrError::Tensor)?;
            Ok(view.to_owned())
        })
    }
}
