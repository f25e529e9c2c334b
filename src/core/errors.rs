//! Error types for the OCR pipeline.
//!
//! The [`OcrError`] enum distinguishes the four fatal failure categories a
//! caller cares about: bad input (unreadable image), bad configuration
//! (options file problems, vocabulary mismatch), inference failures
//! (unexpected tensor shapes, session errors), and internal processing
//! failures. Per-region issues (a single degenerate crop) never surface here;
//! they are absorbed at the cropping stage.

use thiserror::Error;

/// The pipeline stage in which a processing error occurred.
///
/// Only the stages that can abort an invocation appear here; cropping and
/// decoding problems are either absorbed per-region or reported as
/// configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Image resizing or padding.
    Preprocessing,
    /// Score-map post-processing into polygons.
    RegionExtraction,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Preprocessing => write!(f, "preprocessing"),
            ProcessingStage::RegionExtraction => write!(f, "region extraction"),
        }
    }
}

/// Errors surfaced by the OCR pipeline.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The input image could not be decoded. This is the only error the
    /// caller should treat as "bad user input".
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// A required option is missing or inconsistent (e.g. no `character`
    /// entry, or the vocabulary size disagrees with the model class count).
    #[error("configuration: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// An inference engine returned something other than the contracted
    /// tensor shape. Signals a model/binding mismatch, not bad user input.
    #[error("inference ({model}): {context}")]
    Inference {
        /// Name of the model that failed.
        model: String,
        /// What the engine was asked to do when it failed.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A processing stage failed in a way that aborts the invocation.
    #[error("{stage} failed: {context}")]
    Processing {
        /// The stage that failed.
        stage: ProcessingStage,
        /// Additional context about the failure.
        context: String,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor shape operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error (missing options or model file).
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl OcrError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an inference error for the named model.
    pub fn inference(
        model: &str,
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model: model.to_string(),
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates an inference error carrying only a message, for shape
    /// mismatches where there is no underlying error object.
    pub fn inference_shape(model: &str, context: impl Into<String>) -> Self {
        Self::Inference {
            model: model.to_string(),
            context: context.into(),
            source: Box::new(SimpleError::new("unexpected tensor shape")),
        }
    }

    /// Creates a processing error for the given stage.
    pub fn processing(stage: ProcessingStage, context: impl Into<String>) -> Self {
        Self::Processing {
            stage,
            context: context.into(),
        }
    }
}

impl From<image::ImageError> for OcrError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}

/// A minimal string-backed error for wrapping plain messages as sources.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}
