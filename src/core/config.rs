//! Engine configuration and options-file parsing.
//!
//! Model repositories ship a plain-text options file of `key:value` lines
//! next to the weights. Parsing that loosely-typed format is a boundary
//! concern handled by [`parse_options`]; everything downstream works with the
//! strongly-typed [`EngineConfig`], which carries explicit defaults for every
//! threshold.

use crate::core::errors::OcrError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A single parsed value from the options file.
///
/// Values are parsed as (in order of attempt) integer, float, boolean,
/// bracketed list, or literal string.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean (`True`/`False`, case-insensitive).
    Bool(bool),
    /// A bracketed comma-separated list, quotes stripped per element.
    List(Vec<String>),
    /// Anything else, quotes stripped.
    Str(String),
}

impl OptionValue {
    /// Returns the value as f64 if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OptionValue::Int(v) => Some(*v as f64),
            OptionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as u32 if it is a non-negative integer.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            OptionValue::Int(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

fn parse_value(raw: &str) -> OptionValue {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return OptionValue::Int(v);
    }
    if let Ok(v) = raw.parse::<f64>() {
        return OptionValue::Float(v);
    }
    if raw.eq_ignore_ascii_case("true") {
        return OptionValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return OptionValue::Bool(false);
    }
    if raw.starts_with('[') && raw.ends_with(']') {
        let items = raw[1..raw.len() - 1]
            .split(',')
            .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
            .filter(|item| !item.is_empty())
            .collect();
        return OptionValue::List(items);
    }
    OptionValue::Str(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
}

/// Parses an options file's contents into a key/value map.
///
/// Blank lines and lines without a colon are ignored. Only the first colon
/// splits key from value, so values may themselves contain colons.
pub fn parse_options(contents: &str) -> BTreeMap<String, OptionValue> {
    let mut options = BTreeMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        options.insert(key.trim().to_string(), parse_value(value));
    }
    options
}

/// Strongly-typed configuration for one language profile.
///
/// Built once per language/session and reused across invocations. Every
/// numeric threshold has an explicit default matching the reference models;
/// values present in the options file override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Language tag this profile serves.
    pub lang: String,
    /// Recognition vocabulary; index 0 is the reserved blank sentinel.
    pub vocab: Vec<String>,
    /// Resolved path to the detection model weights.
    pub detector_model: PathBuf,
    /// Resolved path to the recognition model weights.
    pub recognizer_model: PathBuf,
    /// Maximum padded canvas side length for detection.
    pub canvas_size: u32,
    /// Magnification ratio applied before capping at `canvas_size`.
    pub mag_ratio: f32,
    /// Minimum per-component max text score for a region to count as text.
    pub text_threshold: f32,
    /// Binarization threshold for the link score map.
    pub link_threshold: f32,
    /// Binarization threshold for the text score map.
    pub low_text: f32,
    /// Fixed height of rectified crops fed to the recognizer.
    pub img_h: u32,
    /// Maximum width of rectified crops fed to the recognizer.
    pub img_w: u32,
}

impl EngineConfig {
    /// Builds a config from parsed options plus resolved model paths.
    ///
    /// The options must supply at minimum a `character` string; the runtime
    /// vocabulary is derived as `["[blank]"] + chars(character)`.
    pub fn from_options(
        lang: &str,
        options: &BTreeMap<String, OptionValue>,
        detector_model: PathBuf,
        recognizer_model: PathBuf,
    ) -> Result<Self, OcrError> {
        let character = options
            .get("character")
            .and_then(OptionValue::as_str)
            .ok_or_else(|| OcrError::config("options file is missing the `character` entry"))?;

        let mut vocab = Vec::with_capacity(1 + character.chars().count());
        vocab.push("[blank]".to_string());
        vocab.extend(character.chars().map(|c| c.to_string()));

        let get_f32 = |key: &str, default: f32| -> f32 {
            options
                .get(key)
                .and_then(OptionValue::as_f64)
                .map(|v| v as f32)
                .unwrap_or(default)
        };
        let get_u32 = |key: &str, default: u32| -> u32 {
            options.get(key).and_then(OptionValue::as_u32).unwrap_or(default)
        };

        Ok(Self {
            lang: lang.to_string(),
            vocab,
            detector_model,
            recognizer_model,
            canvas_size: get_u32("canvas_size", 2560),
            mag_ratio: get_f32("mag_ratio", 1.0),
            text_threshold: get_f32("text_threshold", 0.7),
            link_threshold: get_f32("link_threshold", 0.4),
            low_text: get_f32("low_text", 0.4),
            img_h: get_u32("imgH", 64),
            img_w: get_u32("imgW", 256),
        })
    }

    /// Reads and parses an options file, then builds the config.
    pub fn from_options_file(
        lang: &str,
        options_path: &Path,
        detector_model: PathBuf,
        recognizer_model: PathBuf,
    ) -> Result<Self, OcrError> {
        let contents = std::fs::read_to_string(options_path)?;
        let options = parse_options(&contents);
        Self::from_options(lang, &options, detector_model, recognizer_model)
    }

    /// Number of recognition classes, including the blank sentinel.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }
}
