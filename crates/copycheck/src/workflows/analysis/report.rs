use super::domain::{Criterion, ScoreEntry, Scorecard};
use super::summary::{AnalysisSummary, CommentBand, LowScore, Urgency};
use super::AnalysisError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything the rendering, document and delivery collaborators need about one analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub source_text: String,
    pub scorecard: Scorecard,
    pub summary: AnalysisSummary,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn view(&self) -> AnalysisReportView {
        AnalysisReportView {
            source_text: self.source_text.clone(),
            entries: self.scorecard.iter().map(ScoreEntryView::from).collect(),
            summary: SummaryView::from(&self.summary),
            generated_at: self.generated_at,
        }
    }
}

pub fn assemble(
    source_text: &str,
    scorecard: Scorecard,
    summary: AnalysisSummary,
) -> Result<AnalysisReport, AnalysisError> {
    assemble_at(source_text, scorecard, summary, Utc::now())
}

pub fn assemble_at(
    source_text: &str,
    scorecard: Scorecard,
    summary: AnalysisSummary,
    generated_at: DateTime<Utc>,
) -> Result<AnalysisReport, AnalysisError> {
    if scorecard.is_empty() {
        return Err(AnalysisError::InvalidInput);
    }

    Ok(AnalysisReport {
        source_text: source_text.to_string(),
        scorecard,
        summary,
        generated_at,
    })
}

/// Color band used by score widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Strong,
    Fair,
    Weak,
    Critical,
}

impl ScoreBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 8.0 {
            Self::Strong
        } else if score >= 6.0 {
            Self::Fair
        } else if score >= 4.0 {
            Self::Weak
        } else {
            Self::Critical
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Strong => "#28a745",
            Self::Fair => "#ffc107",
            Self::Weak => "#fd7e14",
            Self::Critical => "#dc3545",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreEntryView {
    pub criterion: Criterion,
    pub criterion_label: &'static str,
    pub score: f64,
    pub suggestion: String,
    pub band: ScoreBand,
    pub color: &'static str,
}

impl From<&ScoreEntry> for ScoreEntryView {
    fn from(entry: &ScoreEntry) -> Self {
        let band = ScoreBand::for_score(entry.score);
        Self {
            criterion: entry.criterion,
            criterion_label: entry.criterion.label(),
            score: entry.score,
            suggestion: entry.suggestion.clone(),
            band,
            color: band.color(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView {
    pub average_score: f64,
    pub overall_percent: u8,
    pub overall_color: &'static str,
    pub lowest_three: Vec<LowScore>,
    pub urgency: Urgency,
    pub band: CommentBand,
    pub final_comment: &'static str,
    pub improvement_summary: String,
}

impl From<&AnalysisSummary> for SummaryView {
    fn from(summary: &AnalysisSummary) -> Self {
        Self {
            average_score: summary.average_score,
            overall_percent: summary.overall_percent(),
            overall_color: ScoreBand::for_score(summary.average_score).color(),
            lowest_three: summary.lowest_three.clone(),
            urgency: summary.urgency,
            band: summary.band,
            final_comment: summary.final_comment,
            improvement_summary: summary.improvement_summary(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReportView {
    pub source_text: String,
    pub entries: Vec<ScoreEntryView>,
    pub summary: SummaryView,
    pub generated_at: DateTime<Utc>,
}
