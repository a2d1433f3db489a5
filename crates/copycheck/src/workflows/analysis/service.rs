use std::sync::Arc;

use super::content::ContentExtractor;
use super::extractor::{ExtractionMode, ResponseShape, ScoreExtractor};
use super::input::{classify, InputKind, TruncationPolicy};
use super::model::{ModelClient, ModelError};
use super::prompt::{system_prompt, ResponseFormat};
use super::report::{assemble, AnalysisReport};
use super::summary::summarize;
use tracing::{info, warn};

/// Failure of one analysis request. Each variant carries its own user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("no text was submitted")]
    EmptyInput,
    #[error("could not extract article content from {url}")]
    ContentExtractionFailed { url: String },
    #[error("model call failed: {0}")]
    ModelCallFailed(#[from] ModelError),
    #[error("model returned an empty response")]
    EmptyModelResponse,
    #[error("no criterion scores could be recovered from the model response")]
    ExtractionFailed,
    #[error("cannot summarize an empty scorecard")]
    InvalidInput,
}

impl AnalysisError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Please enter some text to analyze.",
            Self::ContentExtractionFailed { .. } => {
                "Could not extract article content. Please try copying and pasting the text directly."
            }
            Self::ModelCallFailed(_) => {
                "The analysis service could not be reached. Please try again in a few minutes."
            }
            Self::EmptyModelResponse => {
                "The analysis service returned an empty answer. Please try again."
            }
            Self::ExtractionFailed => {
                "Sorry, your text could not be analyzed. Please try again."
            }
            Self::InvalidInput => "The analysis produced no scores to summarize.",
        }
    }
}

/// Pipeline settings fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSettings {
    pub truncation: TruncationPolicy,
    pub response_format: ResponseFormat,
    pub extraction_mode: ExtractionMode,
}

/// A finished analysis plus how the model reply was read.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: AnalysisReport,
    pub shape: ResponseShape,
    pub truncated: bool,
}

/// Classify input, call the model, extract, summarize and assemble.
pub struct AnalysisService {
    model: Arc<dyn ModelClient>,
    content: Arc<dyn ContentExtractor>,
    extractor: ScoreExtractor,
    truncation: TruncationPolicy,
    system_prompt: String,
}

impl AnalysisService {
    pub fn new(
        model: Arc<dyn ModelClient>,
        content: Arc<dyn ContentExtractor>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            model,
            content,
            extractor: ScoreExtractor::new(settings.extraction_mode),
            truncation: settings.truncation,
            system_prompt: system_prompt(settings.response_format),
        }
    }

    pub async fn analyze(&self, raw_input: &str) -> Result<AnalysisOutcome, AnalysisError> {
        if raw_input.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let text = match classify(raw_input) {
            InputKind::Url(url) => {
                info!(%url, "input classified as url");
                match self.content.extract(&url).await {
                    Some(content) if !content.trim().is_empty() => content,
                    _ => {
                        warn!(%url, "article extraction yielded no content");
                        return Err(AnalysisError::ContentExtractionFailed {
                            url: url.to_string(),
                        });
                    }
                }
            }
            InputKind::Text(text) => text,
        };

        let prepared = self.truncation.apply(&text);
        let raw_response = self
            .model
            .generate(&self.system_prompt, &prepared.text)
            .await?;

        if raw_response.trim().is_empty() {
            warn!("model returned a blank response");
            return Err(AnalysisError::EmptyModelResponse);
        }

        self.score(&prepared.text, &raw_response)
            .map(|(report, shape)| AnalysisOutcome {
                report,
                shape,
                truncated: prepared.truncated,
            })
    }

    pub fn score(
        &self,
        source_text: &str,
        raw_response: &str,
    ) -> Result<(AnalysisReport, ResponseShape), AnalysisError> {
        score_response(&self.extractor, source_text, raw_response)
    }
}

/// Scores an already obtained model reply against the text that produced it.
pub fn score_response(
    extractor: &ScoreExtractor,
    source_text: &str,
    raw_response: &str,
) -> Result<(AnalysisReport, ResponseShape), AnalysisError> {
    let extraction = extractor.extract_detailed(raw_response);
    let Some(shape) = extraction.shape else {
        warn!(
            response_chars = raw_response.chars().count(),
            "no criterion scores found in model response"
        );
        return Err(AnalysisError::ExtractionFailed);
    };

    let summary = summarize(&extraction.scorecard)?;
    info!(
        entries = extraction.scorecard.len(),
        average = summary.average_score,
        ?shape,
        "analysis complete"
    );
    let report = assemble(source_text, extraction.scorecard, summary)?;
    Ok((report, shape))
}
