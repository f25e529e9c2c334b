//! Core types shared across the pipeline: errors, configuration, tensors,
//! and the ONNX Runtime inference wrapper.

pub mod config;
pub mod errors;
pub mod inference;

pub use config::{parse_options, EngineConfig, OptionValue};
pub use errors::{OcrError, ProcessingStage, SimpleError};
pub use inference::OrtInfer;

/// 3D tensor (batch, time, class) used for recognition logits.
pub type Tensor3D = ndarray::Array3<f32>;

/// 4D tensor (batch, channel, height, width) used for model inputs and
/// detection outputs.
pub type Tensor4D = ndarray::Array4<f32>;
