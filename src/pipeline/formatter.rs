//! Geometric bubble-role formatting of recognition results.
//!
//! Classifies each recognized region by where it sits on the page and how
//! its text reads, then renders one marker-prefixed line per region. The
//! rules are heuristics over bounding-box geometry relative to the page-wide
//! extents of all detections; the first matching rule wins.

use crate::pipeline::{DecodedEntry, OcrOutput};

/// The inferred role of a recognized text region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    /// Speech-bubble dialogue, the default.
    Dialogue,
    /// Narration or caption boxes.
    CaptionBox,
    /// Sound effects and short shouted text.
    SoundEffect,
    /// Text outside any bubble, hugging a page edge.
    OutOfBubble,
}

impl TextRole {
    /// The two-character marker rendered before the text.
    pub fn marker(&self) -> &'static str {
        match self {
            TextRole::Dialogue => "()",
            TextRole::CaptionBox => "[]",
            TextRole::SoundEffect => "//",
            TextRole::OutOfBubble => "''",
        }
    }
}

/// Page-wide bounding statistics over all regions with geometry.
#[derive(Debug, Clone, Copy)]
struct PageStats {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    width_span: f32,
    height_span: f32,
    max_width: f32,
    max_height: f32,
}

fn collect_stats(entries: &[DecodedEntry]) -> PageStats {
    let mut min_x = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let mut max_width = 0.0f32;
    let mut max_height = 0.0f32;

    for entry in entries {
        let Some(quad) = &entry.quad else { continue };
        let (l, t, r, b) = quad.bounding_rect();
        min_x = min_x.min(l);
        max_x = max_x.max(r);
        min_y = min_y.min(t);
        max_y = max_y.max(b);
        max_width = max_width.max(r - l);
        max_height = max_height.max(b - t);
    }

    PageStats {
        min_x,
        max_x,
        min_y,
        width_span: (max_x - min_x).max(1.0),
        height_span: (max_y - min_y).max(1.0),
        max_width: max_width.max(1.0),
        max_height: max_height.max(1.0),
    }
}

fn classify(entry: &DecodedEntry, stats: &PageStats) -> TextRole {
    let Some(quad) = &entry.quad else {
        return TextRole::Dialogue;
    };
    let (min_x, min_y, max_x, max_y) = quad.bounding_rect();
    let width = max_x - min_x;
    let height = max_y - min_y;
    if width <= 0.0 || height <= 0.0 {
        return TextRole::Dialogue;
    }

    let text = entry.text.trim();
    let aspect = width / height;
    let area_ratio = (width * height) / (stats.width_span * stats.height_span);
    let rel_width = width / stats.max_width;
    let rel_height = height / stats.max_height;
    let center_x = (min_x + max_x) / 2.0;
    let edge_margin = 0.12 * stats.width_span;
    let word_count = text
        .replace('\n', " ")
        .split(' ')
        .filter(|w| !w.trim().is_empty())
        .count();
    let char_count = text.chars().count();
    let uppercase_ratio = if char_count == 0 {
        0.0
    } else {
        let upper = text
            .chars()
            .filter(|c| c.is_alphabetic() && !c.is_lowercase())
            .count();
        upper as f32 / char_count as f32
    };

    if aspect < 0.7 || char_count <= 4 || uppercase_ratio > 0.6 {
        TextRole::SoundEffect
    } else if area_ratio > 0.4
        && (center_x - stats.min_x < edge_margin || stats.max_x - center_x < edge_margin)
    {
        TextRole::OutOfBubble
    } else if word_count >= 10 || char_count > 40 || rel_width > 0.75 {
        TextRole::CaptionBox
    } else if (min_y - stats.min_y) < 0.15 * stats.height_span && rel_width > 0.4 {
        TextRole::CaptionBox
    } else if rel_height > 0.6 && rel_width < 0.45 {
        TextRole::OutOfBubble
    } else {
        TextRole::Dialogue
    }
}

/// Renders recognition output into marker-prefixed lines, one per region,
/// preserving detection order. Regions with empty text are dropped.
///
/// When no region carries geometry the raw descriptions are joined into a
/// single dialogue line.
pub fn format_output(output: &OcrOutput) -> String {
    if output.entries.is_empty() {
        let text = output
            .descriptions
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return String::new();
        }
        return format!("() : {text}");
    }

    let stats = collect_stats(&output.entries);
    output
        .entries
        .iter()
        .filter_map(|entry| {
            let text = entry.text.trim();
            if text.is_empty() {
                return None;
            }
            Some(format!("{} : {text}", classify(entry, &stats).marker()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::Quad;

    fn entry(text: &str, l: f32, t: f32, r: f32, b: f32) -> DecodedEntry {
        DecodedEntry {
            text: text.to_string(),
            confidence: 0.9,
            quad: Some(Quad::axis_aligned(l, t, r, b)),
        }
    }

    fn page_with(target: DecodedEntry) -> OcrOutput {
        // Spread anchor regions so page spans are meaningful.
        OcrOutput {
            entries: vec![
                entry("hello there friend", 100.0, 400.0, 300.0, 480.0),
                entry("another line here", 600.0, 800.0, 820.0, 880.0),
                target,
            ],
            descriptions: Vec::new(),
        }
    }

    #[test]
    fn test_uppercase_shout_is_sound_effect() {
        let output = page_with(entry("HELLO", 400.0, 500.0, 560.0, 560.0));
        let rendered = format_output(&output);
        assert!(rendered.lines().any(|l| l == "// : HELLO"));
    }

    #[test]
    fn test_short_text_is_sound_effect() {
        let output = page_with(entry("bam", 400.0, 500.0, 560.0, 560.0));
        assert!(format_output(&output).contains("// : bam"));
    }

    #[test]
    fn test_tall_narrow_region_is_sound_effect() {
        // Aspect below 0.7.
        let output = page_with(entry("rumble rumble", 400.0, 300.0, 440.0, 500.0));
        assert!(format_output(&output).contains("// : rumble rumble"));
    }

    #[test]
    fn test_long_text_is_caption() {
        let text = "this narration has more than ten separate words in it somehow";
        let output = page_with(entry(text, 350.0, 500.0, 560.0, 580.0));
        assert!(format_output(&output).contains(&format!("[] : {text}")));
    }

    #[test]
    fn test_top_wide_region_is_caption() {
        // Near the page top with relative width above 0.4.
        let output = page_with(entry("meanwhile back home", 300.0, 402.0, 480.0, 450.0));
        assert!(format_output(&output).contains("[] : meanwhile back home"));
    }

    #[test]
    fn test_default_is_dialogue() {
        let output = page_with(entry("sure, sounds good", 400.0, 600.0, 540.0, 680.0));
        assert!(format_output(&output).contains("() : sure, sounds good"));
    }

    #[test]
    fn test_zero_area_region_is_dialogue() {
        // Width collapses to zero; geometry rules cannot apply.
        let output = page_with(entry("somewhere", 400.0, 500.0, 400.0, 560.0));
        assert!(format_output(&output).contains("() : somewhere"));
    }

    #[test]
    fn test_duplicate_entries_are_not_deduplicated() {
        let output = OcrOutput {
            entries: vec![
                entry("same words again here", 100.0, 400.0, 300.0, 480.0),
                entry("same words again here", 100.0, 400.0, 300.0, 480.0),
            ],
            descriptions: Vec::new(),
        };
        assert_eq!(format_output(&output).lines().count(), 2);
    }

    #[test]
    fn test_empty_texts_dropped_and_order_preserved() {
        let output = OcrOutput {
            entries: vec![
                entry("first words here now", 100.0, 400.0, 300.0, 480.0),
                entry("   ", 310.0, 400.0, 400.0, 480.0),
                entry("second words here now", 600.0, 800.0, 820.0, 880.0),
            ],
            descriptions: Vec::new(),
        };
        let rendered = format_output(&output);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("first words here now"));
        assert!(lines[1].ends_with("second words here now"));
    }

    #[test]
    fn test_no_entries_falls_back_to_descriptions() {
        let output = OcrOutput {
            entries: Vec::new(),
            descriptions: vec![" hello ".to_string(), "world".to_string()],
        };
        assert_eq!(format_output(&output), "() : hello world");
    }

    #[test]
    fn test_empty_output_renders_empty_string() {
        let output = OcrOutput {
            entries: Vec::new(),
            descriptions: Vec::new(),
        };
        assert_eq!(format_output(&output), "");
    }

    #[test]
    fn test_missing_geometry_defaults_to_dialogue() {
        let output = OcrOutput {
            entries: vec![DecodedEntry {
                text: "floating words without a box".to_string(),
                confidence: 0.5,
                quad: None,
            }],
            descriptions: Vec::new(),
        };
        assert_eq!(
            format_output(&output),
            "() : floating words without a box"
        );
    }
}
