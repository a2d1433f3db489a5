use serde::Serialize;
use tracing::warn;
use url::Url;

pub const DEFAULT_CHARACTER_LIMIT: usize = 12_000;
pub const DEFAULT_WORD_LIMIT: usize = 3_000;
pub const DEFAULT_ELLIPSIS: &str = "...";

/// What the user submitted: a page to fetch or the copy itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    Url(Url),
    Text(String),
}

pub fn classify(raw_input: &str) -> InputKind {
    let trimmed = raw_input.trim();
    match parse_absolute_url(trimmed) {
        Some(url) => InputKind::Url(url),
        None => InputKind::Text(raw_input.to_string()),
    }
}

/// Absolute URL with both a scheme and a host, and no embedded whitespace.
fn parse_absolute_url(candidate: &str) -> Option<Url> {
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return None;
    }
    let url = Url::parse(candidate).ok()?;
    let host = url.host_str()?;
    (!host.is_empty()).then_some(url)
}

/// Cap applied to text before it is sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TruncationPolicy {
    /// Keep at most `limit` characters and append `ellipsis` when cut.
    Characters { limit: usize, ellipsis: String },
    /// Keep at most `limit` words, ending at the last `.` inside the window when there is one.
    Words { limit: usize },
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self::Characters {
            limit: DEFAULT_CHARACTER_LIMIT,
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedText {
    pub text: String,
    pub truncated: bool,
}

impl TruncationPolicy {
    pub fn words(limit: usize) -> Self {
        Self::Words { limit }
    }

    pub fn characters(limit: usize) -> Self {
        Self::Characters {
            limit,
            ellipsis: DEFAULT_ELLIPSIS.to_string(),
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            Self::Characters { limit, .. } | Self::Words { limit } => *limit,
        }
    }

    pub fn apply(&self, text: &str) -> PreparedText {
        let prepared = match self {
            Self::Characters { limit, ellipsis } => truncate_characters(text, *limit, ellipsis),
            Self::Words { limit } => truncate_words(text, *limit),
        };
        if prepared.truncated {
            warn!(limit = self.limit(), "input text truncated before analysis");
        }
        prepared
    }
}

fn truncate_characters(text: &str, limit: usize, ellipsis: &str) -> PreparedText {
    match text.char_indices().nth(limit) {
        None => PreparedText {
            text: text.to_string(),
            truncated: false,
        },
        Some((cut, _)) => PreparedText {
            text: format!("{}{}", &text[..cut], ellipsis),
            truncated: true,
        },
    }
}

fn truncate_words(text: &str, limit: usize) -> PreparedText {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        return PreparedText {
            text: text.to_string(),
            truncated: false,
        };
    }

    let window = words[..limit].join(" ");
    let text = match window.rfind('.') {
        Some(period) => window[..=period].to_string(),
        None => window,
    };

    PreparedText {
        text,
        truncated: true,
    }
}
