//! Model-backed predictors wrapping the inference sessions.

pub mod detector;
pub mod recognizer;

pub use detector::TextDetector;
pub use recognizer::TextRecognizer;
