//! Copy analysis: turn a submitted text (or article URL) into a scored, summarized report.
//!
//! The pipeline is classify → truncate → model call → score extraction → aggregation →
//! report assembly. The model and article fetcher are collaborators behind traits so the
//! core stays deterministic and testable offline.

pub mod content;
pub mod domain;
pub mod extractor;
pub mod input;
pub mod model;
pub mod prompt;
pub mod report;
pub mod router;
pub mod service;
pub mod summary;

#[cfg(test)]
mod tests;

pub use content::{article_text, ContentExtractor, HttpContentExtractor};
pub use domain::{score_in_range, Criterion, ScoreEntry, Scorecard, MAX_SCORE, MIN_SCORE};
pub use extractor::{extract, Extraction, ExtractionMode, ResponseShape, ScoreExtractor};
pub use input::{classify, InputKind, PreparedText, TruncationPolicy};
pub use model::{GroqChatClient, ModelClient, ModelError};
pub use prompt::{system_prompt, ResponseFormat};
pub use report::{
    assemble, assemble_at, AnalysisReport, AnalysisReportView, ScoreBand, ScoreEntryView,
    SummaryView,
};
pub use router::{analysis_router, AnalysisApiState};
pub use service::{
    score_response, AnalysisError, AnalysisOutcome, AnalysisService, AnalysisSettings,
};
pub use summary::{summarize, AnalysisSummary, CommentBand, LowScore, Urgency};
