//! Turns a raw model reply into a [`Scorecard`].
//!
//! Two reply shapes are understood. The structured shape is a JSON object embedded anywhere
//! in the reply with `scores` and `suggestions` maps; it is validated strictly and never
//! evaluated. The free-text shape is heading-delimited prose with `Score:` and
//! `Improvement:` markers and only serves replies that ignored the requested format.

mod free_text;
mod normalizer;
mod structured;

use super::domain::Scorecard;
use serde::{Deserialize, Serialize};
use structured::StructuredOutcome;
use tracing::{debug, info};

/// Which reply shapes the extractor is allowed to try.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Structured shape first, free text as fallback.
    #[default]
    Auto,
    StructuredOnly,
    FreeTextOnly,
}

impl ExtractionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "structured" | "json" => Some(Self::StructuredOnly),
            "free_text" | "free-text" | "text" => Some(Self::FreeTextOnly),
            _ => None,
        }
    }
}

/// Shape the scorecard was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    Structured,
    FreeText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub scorecard: Scorecard,
    pub shape: Option<ResponseShape>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreExtractor {
    mode: ExtractionMode,
}

impl ScoreExtractor {
    pub fn new(mode: ExtractionMode) -> Self {
        Self { mode }
    }

    /// Returns an empty scorecard when nothing could be recovered.
    pub fn extract(&self, raw: &str) -> Scorecard {
        self.extract_detailed(raw).scorecard
    }

    pub fn extract_detailed(&self, raw: &str) -> Extraction {
        if self.mode != ExtractionMode::FreeTextOnly {
            match structured::parse_structured(raw) {
                StructuredOutcome::Parsed(scorecard) if !scorecard.is_empty() => {
                    info!(entries = scorecard.len(), "parsed structured model response");
                    return Extraction {
                        scorecard,
                        shape: Some(ResponseShape::Structured),
                    };
                }
                StructuredOutcome::Parsed(_) => {
                    debug!("structured response named no known criteria");
                }
                StructuredOutcome::Rejected(reason) => {
                    debug!(reason, "falling back from structured response");
                }
                StructuredOutcome::NotFound => {}
            }
        }

        if self.mode != ExtractionMode::StructuredOnly {
            let scorecard = free_text::parse_free_text(raw);
            if !scorecard.is_empty() {
                info!(entries = scorecard.len(), "parsed free-text model response");
                return Extraction {
                    scorecard,
                    shape: Some(ResponseShape::FreeText),
                };
            }
        }

        Extraction {
            scorecard: Scorecard::new(),
            shape: None,
        }
    }
}

/// Extracts with [`ExtractionMode::Auto`].
pub fn extract(raw: &str) -> Scorecard {
    ScoreExtractor::default().extract(raw)
}

#[cfg(test)]
mod tests {
    use super::super::domain::Criterion;
    use super::*;

    const MIXED: &str = "Clarity\nScore: 2/10\nImprovement: rewrite it\n\n{\"scores\": {\"Clarity\": 9, \"Trust\": 7}, \"suggestions\": {\"Clarity\": \"fine\", \"Trust\": \"add proof\"}}";

    #[test]
    fn structured_shape_takes_precedence() {
        let extraction = ScoreExtractor::default().extract_detailed(MIXED);

        assert_eq!(extraction.shape, Some(ResponseShape::Structured));
        assert_eq!(extraction.scorecard.len(), 2);
        assert_eq!(
            extraction.scorecard.get(Criterion::Clarity).map(|e| e.score),
            Some(9.0)
        );
    }

    #[test]
    fn rejected_structure_falls_back_to_free_text() {
        let raw = "{\"scores\": {\"Clarity\": \"nine\"}, \"suggestions\": {}}\nClarity\nScore: 6\n";
        let extraction = ScoreExtractor::default().extract_detailed(raw);

        assert_eq!(extraction.shape, Some(ResponseShape::FreeText));
        assert_eq!(
            extraction.scorecard.get(Criterion::Clarity).map(|e| e.score),
            Some(6.0)
        );
    }

    #[test]
    fn modes_restrict_shapes() {
        let structured_only = ScoreExtractor::new(ExtractionMode::StructuredOnly);
        assert!(structured_only.extract("Trust\nScore: 5\n").is_empty());

        let free_text_only = ScoreExtractor::new(ExtractionMode::FreeTextOnly);
        let scorecard = free_text_only.extract(MIXED);
        assert_eq!(scorecard.get(Criterion::Clarity).map(|e| e.score), Some(2.0));
    }

    #[test]
    fn unrecognizable_input_yields_empty_scorecard() {
        assert!(extract("").is_empty());
        assert!(extract("no recognizable content").is_empty());
        assert_eq!(ScoreExtractor::default().extract_detailed("").shape, None);
    }

    #[test]
    fn extraction_is_deterministic() {
        assert_eq!(extract(MIXED), extract(MIXED));
    }

    #[test]
    fn parse_mode_accepts_aliases() {
        assert_eq!(ExtractionMode::parse("JSON"), Some(ExtractionMode::StructuredOnly));
        assert_eq!(ExtractionMode::parse("free-text"), Some(ExtractionMode::FreeTextOnly));
        assert_eq!(ExtractionMode::parse("auto"), Some(ExtractionMode::Auto));
        assert_eq!(ExtractionMode::parse("regex"), None);
    }
}
