//! Greedy CTC decoding of recognition probabilities.

use crate::core::errors::OcrError;
use ndarray::ArrayView2;

/// Index reserved for the CTC blank symbol.
pub const BLANK_INDEX: usize = 0;

/// Maps class indices to vocabulary entries.
///
/// Index 0 is always the blank sentinel and never appears in decoded text.
#[derive(Debug, Clone)]
pub struct VocabularyTable {
    entries: Vec<String>,
}

impl VocabularyTable {
    /// Wraps a vocabulary whose first entry is the blank sentinel.
    pub fn new(entries: Vec<String>) -> Result<Self, OcrError> {
        if entries.is_empty() {
            return Err(OcrError::config("vocabulary is empty"));
        }
        Ok(Self { entries })
    }

    /// Number of classes including the blank.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when only the blank entry exists.
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Looks up the text for a non-blank class index.
    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }
}

/// A decoded transcript with its confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    /// The collapsed transcript.
    pub text: String,
    /// Product of the emitted timesteps' peak probabilities; 1.0 when
    /// nothing was emitted.
    pub confidence: f32,
}

/// Greedy (best-path) CTC decoder.
#[derive(Debug, Clone)]
pub struct GreedyCtcDecoder {
    vocab: VocabularyTable,
}

impl GreedyCtcDecoder {
    /// Creates a decoder over the given vocabulary.
    pub fn new(vocab: VocabularyTable) -> Self {
        Self { vocab }
    }

    /// Returns the vocabulary this decoder maps into.
    pub fn vocab(&self) -> &VocabularyTable {
        &self.vocab
    }

    /// Decodes one sequence of per-timestep class probabilities.
    ///
    /// Takes the argmax at each timestep and emits it only when it is
    /// non-blank and differs from the previous timestep's argmax (standard
    /// CTC collapse). Confidence is the product of the peak probabilities at
    /// emitting timesteps only.
    pub fn decode(&self, probs: ArrayView2<'_, f32>) -> Result<DecodedText, OcrError> {
        let (timesteps, classes) = probs.dim();
        if classes != self.vocab.len() {
            return Err(OcrError::config(format!(
                "probability row has {classes} classes but vocabulary has {}",
                self.vocab.len()
            )));
        }

        let mut text = String::new();
        let mut confidence = 1.0f32;
        let mut previous = BLANK_INDEX;

        for t in 0..timesteps {
            let row = probs.row(t);
            let (best_idx, best_prob) = row.iter().enumerate().fold(
                (0usize, f32::MIN),
                |(bi, bp), (i, &p)| if p > bp { (i, p) } else { (bi, bp) },
            );

            if best_idx != BLANK_INDEX && best_idx != previous {
                let entry = self.vocab.entry(best_idx).ok_or_else(|| {
                    OcrError::config(format!("class index {best_idx} out of vocabulary range"))
                })?;
                text.push_str(entry);
                confidence *= best_prob;
            }
            previous = best_idx;
        }

        Ok(DecodedText { text, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn decoder() -> GreedyCtcDecoder {
        let vocab = VocabularyTable::new(vec![
            "[blank]".to_string(),
            "a".to_string(),
            "b".to_string(),
        ])
        .unwrap();
        GreedyCtcDecoder::new(vocab)
    }

    #[test]
    fn test_collapse_repeats_and_blanks() {
        // Argmax path: a a blank b b -> "ab"
        let probs = array![
            [0.1, 0.8, 0.1],
            [0.2, 0.7, 0.1],
            [0.9, 0.05, 0.05],
            [0.1, 0.1, 0.8],
            [0.1, 0.2, 0.7],
        ];
        let decoded = decoder().decode(probs.view()).unwrap();
        assert_eq!(decoded.text, "ab");
        // Only the first timestep of each run contributes.
        assert!((decoded.confidence - 0.8 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_blank_separates_repeated_characters() {
        // a blank a -> "aa"
        let probs = array![[0.1, 0.8, 0.1], [0.9, 0.05, 0.05], [0.1, 0.8, 0.1]];
        let decoded = decoder().decode(probs.view()).unwrap();
        assert_eq!(decoded.text, "aa");
    }

    #[test]
    fn test_all_blank_gives_empty_text_unit_confidence() {
        let probs = array![[0.9, 0.05, 0.05], [0.8, 0.1, 0.1]];
        let decoded = decoder().decode(probs.view()).unwrap();
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.confidence, 1.0);
    }

    #[test]
    fn test_confidence_stays_in_unit_interval() {
        let probs = array![[0.1, 0.6, 0.3], [0.1, 0.3, 0.6], [0.2, 0.5, 0.3]];
        let decoded = decoder().decode(probs.view()).unwrap();
        assert_eq!(decoded.text, "aba");
        assert!(decoded.confidence > 0.0 && decoded.confidence <= 1.0);
        assert!((decoded.confidence - 0.6 * 0.6 * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_class_count_mismatch_is_config_error() {
        let probs = array![[0.5, 0.5]];
        assert!(matches!(
            decoder().decode(probs.view()),
            Err(OcrError::Config { .. })
        ));
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        assert!(VocabularyTable::new(Vec::new()).is_err());
    }
}
