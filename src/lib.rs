//! # Bubble OCR
//!
//! A Rust OCR pipeline for comic and manga pages using ONNX models.
//! Detects text regions with a CRAFT-style detector, crops and rectifies
//! them, recognizes them with a CTC model, and renders the result as
//! marker-prefixed transcript lines classified by bubble role.
//!
//! ## Components
//!
//! - **Text Detection**: CRAFT text/link score maps post-processed into
//!   quadrilateral regions
//! - **Cropping**: perspective warp of each region to an upright patch
//! - **Text Recognition**: batched CTC recognition with greedy decoding
//! - **Formatting**: geometric classification into dialogue, caption,
//!   sound-effect, and out-of-bubble lines
//!
//! ## Modules
//!
//! * [`core`] - Configuration, error handling, and the inference wrapper
//! * [`predictor`] - Model-backed detector and recognizer
//! * [`processors`] - Preprocessing, region extraction, cropping, decoding
//! * [`pipeline`] - The orchestrating engine and output formatter
//! * [`utils`] - Image loading helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bubble_ocr::prelude::*;
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::from_options_file(
//!     "en",
//!     Path::new("models/en.opt"),
//!     PathBuf::from("models/craft.onnx"),
//!     PathBuf::from("models/brainocr.onnx"),
//! )?;
//! let engine = OcrEngine::new(config)?;
//! let transcript = engine.run(&OcrInput::Path(PathBuf::from("page.png")), 1.0)?;
//! println!("{transcript}");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod predictor;
pub mod processors;
pub mod utils;

/// Commonly used types for working with the OCR pipeline.
pub mod prelude {
    pub use crate::core::{EngineConfig, OcrError};
    pub use crate::pipeline::{
        format_output, DecodedEntry, OcrEngine, OcrInput, OcrOutput, TextRole,
    };
    pub use crate::processors::{Point, Quad};
}
