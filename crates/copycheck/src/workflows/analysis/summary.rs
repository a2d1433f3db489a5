use super::domain::{Criterion, Scorecard};
use super::AnalysisError;
use serde::Serialize;

const LOWEST_COUNT: usize = 3;
const URGENT_BELOW: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Urgent,
    Important,
}

impl Urgency {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Important => "important",
        }
    }
}

/// Qualitative band of the average score on the 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentBand {
    Excellent,
    VeryGood,
    GoodStart,
    NeedsWork,
}

impl CommentBand {
    pub fn for_average(average: f64) -> Self {
        if average >= 9.0 {
            Self::Excellent
        } else if average >= 7.0 {
            Self::VeryGood
        } else if average >= 5.0 {
            Self::GoodStart
        } else {
            Self::NeedsWork
        }
    }

    pub const fn comment(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! Your copy is highly effective and persuasive.",
            Self::VeryGood => "Very good! Your copy is effective with some room for improvement.",
            Self::GoodStart => "Good start. Your copy needs some work to be more effective.",
            Self::NeedsWork => {
                "Your copy needs significant improvement. Consider implementing the suggestions above."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LowScore {
    pub criterion: Criterion,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub average_score: f64,
    pub lowest_three: Vec<LowScore>,
    pub urgency: Urgency,
    pub band: CommentBand,
    pub final_comment: &'static str,
}

impl AnalysisSummary {
    /// Average expressed as a whole percentage, truncated.
    pub fn overall_percent(&self) -> u8 {
        (self.average_score * 10.0).floor().clamp(0.0, 100.0) as u8
    }

    pub fn improvement_summary(&self) -> String {
        let areas = self
            .lowest_three
            .iter()
            .map(|low| low.criterion.label())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "The {} areas for improvement are: {}. Focus on these aspects to significantly enhance your copy's effectiveness.",
            self.urgency.label(),
            areas
        )
    }
}

/// Derives the summary of a finalized scorecard. Every recovered criterion weighs the same.
pub fn summarize(scorecard: &Scorecard) -> Result<AnalysisSummary, AnalysisError> {
    if scorecard.is_empty() {
        return Err(AnalysisError::InvalidInput);
    }

    let total: f64 = scorecard.iter().map(|entry| entry.score).sum();
    let average_score = total / scorecard.len() as f64;

    let mut ranked: Vec<LowScore> = scorecard
        .iter()
        .map(|entry| LowScore {
            criterion: entry.criterion,
            score: entry.score,
        })
        .collect();
    // Stable: ties keep discovery order.
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
    ranked.truncate(LOWEST_COUNT);

    let urgency = if ranked[0].score < URGENT_BELOW {
        Urgency::Urgent
    } else {
        Urgency::Important
    };
    let band = CommentBand::for_average(average_score);

    Ok(AnalysisSummary {
        average_score,
        lowest_three: ranked,
        urgency,
        band,
        final_comment: band.comment(),
    })
}
