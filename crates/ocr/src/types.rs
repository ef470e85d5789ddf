use serde::{Deserialize, Serialize};
use std::fmt;

/// One recognized line of the transcript, in reading order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Line {
    pub text: String,
    /// Recognizer-reported confidence for this line (0.0–1.0). Advisory only;
    /// nothing guarantees the text is accurate even at 1.0.
    pub confidence: f32,
}

/// The OCR capability's output: the concatenated text plus the ordered,
/// line-segmented transcript. Produced once per scan and never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub full_text: String,
    pub lines: Vec<Line>,
}

impl Transcript {
    /// Build a transcript from plain text, one record per text line.
    pub fn from_text(text: &str) -> Self {
        Transcript {
            full_text: text.to_string(),
            lines: text
                .lines()
                .map(|l| Line { text: l.to_string(), confidence: 1.0 })
                .collect(),
        }
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(|l| l.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.text.trim().is_empty())
    }
}

/// A single extracted value with an associated confidence score (0.0–1.0)
/// and, where the value was recovered positionally, its transcript line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedField<T> {
    pub value: T,
    /// Confidence in this extraction (0.0 = guessed, 1.0 = certain).
    pub confidence: f32,
    pub line: Option<usize>,
}

impl<T> ExtractedField<T> {
    pub fn new(value: T, confidence: f32) -> Self {
        Self { value, confidence: confidence.clamp(0.0, 1.0), line: None }
    }

    pub fn at_line(value: T, confidence: f32, line: usize) -> Self {
        Self { value, confidence: confidence.clamp(0.0, 1.0), line: Some(line) }
    }
}

/// A current/maximum health readout, e.g. `187/187`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HpReading {
    pub current: u32,
    pub max: u32,
}

impl fmt::Display for HpReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.max)
    }
}

/// Everything a scan recovered from one screenshot. `None` is the explicit
/// "not found" sentinel — distinct from a field that was recognized as
/// blank — and fields are populated independently, so partial success is a
/// normal outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedCreature {
    pub name: Option<ExtractedField<String>>,
    pub cp: Option<ExtractedField<u32>>,
    pub hp: Option<ExtractedField<HpReading>>,
    pub stardust: Option<ExtractedField<u32>>,
    pub moves: Vec<String>,
    /// Aggregate confidence across the key fields (0.0–1.0).
    pub confidence: f32,
}

impl ExtractedCreature {
    /// Whether the extraction is good enough to auto-accept without a human
    /// glancing at the screenshot.
    pub fn needs_review(&self) -> bool {
        self.confidence < 0.7
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cp.is_none()
            && self.hp.is_none()
            && self.stardust.is_none()
            && self.moves.is_empty()
    }
}
