use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Fixed copywriting dimensions a text is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Empathy,
    Clarity,
    Attention,
    Flow,
    Benefits,
    Action,
    Trust,
    Emotion,
    Adaptation,
    Influence,
}

impl Criterion {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Empathy,
            Self::Clarity,
            Self::Attention,
            Self::Flow,
            Self::Benefits,
            Self::Action,
            Self::Trust,
            Self::Emotion,
            Self::Adaptation,
            Self::Influence,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Empathy => "Empathy",
            Self::Clarity => "Clarity",
            Self::Attention => "Attention",
            Self::Flow => "Flow",
            Self::Benefits => "Benefits",
            Self::Action => "Action",
            Self::Trust => "Trust",
            Self::Emotion => "Emotion",
            Self::Adaptation => "Adaptation",
            Self::Influence => "Influence",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Empathy => "audience understanding",
            Self::Clarity => "clear message",
            Self::Attention => "headlines/hooks",
            Self::Flow => "structure",
            Self::Benefits => "value focus",
            Self::Action => "call-to-action",
            Self::Trust => "credibility",
            Self::Emotion => "storytelling",
            Self::Adaptation => "medium fit",
            Self::Influence => "persuasion",
        }
    }

    /// Exact, case-insensitive match of a label such as a JSON key.
    pub fn from_label(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|criterion| criterion.label().eq_ignore_ascii_case(trimmed))
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn score_in_range(score: f64) -> bool {
    score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub criterion: Criterion,
    pub score: f64,
    pub suggestion: String,
}

/// Criterion scores recovered from one model response, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Scorecard {
    entries: Vec<ScoreEntry>,
}

impl Scorecard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry unless its criterion is already present or the score is out of range.
    /// Returns whether the entry was kept.
    pub(crate) fn insert(&mut self, entry: ScoreEntry) -> bool {
        if !score_in_range(entry.score) || self.contains(entry.criterion) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains(&self, criterion: Criterion) -> bool {
        self.entries.iter().any(|entry| entry.criterion == criterion)
    }

    pub fn get(&self, criterion: Criterion) -> Option<&ScoreEntry> {
        self.entries.iter().find(|entry| entry.criterion == criterion)
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ScoreEntry> for Scorecard {
    fn from_iter<I: IntoIterator<Item = ScoreEntry>>(iter: I) -> Self {
        let mut scorecard = Scorecard::new();
        for entry in iter {
            scorecard.insert(entry);
        }
        scorecard
    }
}
