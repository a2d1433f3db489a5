use super::domain::Criterion;
use serde::{Deserialize, Serialize};

/// Reply format requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

impl ResponseFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn criteria_listing() -> String {
    Criterion::ordered()
        .iter()
        .enumerate()
        .map(|(index, criterion)| {
            format!("{}. {} ({})", index + 1, criterion.label(), criterion.description())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn system_prompt(format: ResponseFormat) -> String {
    let listing = criteria_listing();
    match format {
        ResponseFormat::Text => format!(
            "Evaluate the article on 10 copywriting criteria (10 points each):\n{listing}\n\n\
             For each criterion provide:\nScore: X/10\nReasoning: Brief explanation\n\
             Improvement: One key suggestion"
        ),
        ResponseFormat::Json => format!(
            "Evaluate the article on 10 copywriting criteria (10 points each):\n{listing}\n\n\
             Reply with a single JSON object and nothing else, shaped as\n\
             {{\"scores\": {{\"<Criterion>\": <number 0-10>}}, \"suggestions\": {{\"<Criterion>\": \"<one key suggestion>\"}}}}\n\
             using the criterion names above as keys."
        ),
    }
}
