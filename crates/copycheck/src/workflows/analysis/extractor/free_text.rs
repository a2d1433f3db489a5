use super::super::domain::{Criterion, ScoreEntry, Scorecard};
use super::normalizer::{looks_like_label, mentioned_criterion, parse_heading, starts_with_criterion};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

const LINE_PREFIX: &str = r"^[\s>#•\-*_]*";

static SCORE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){LINE_PREFIX}score\s*[*_]*\s*:\s*[*_]*\s*(\d+(?:[.,]\d+)?)"
    ))
    .expect("score pattern compiles")
});

static SCORE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i){LINE_PREFIX}score\s*[*_]*\s*:"))
        .expect("score label pattern compiles")
});

static IMPROVEMENT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){LINE_PREFIX}improvements?\s*[*_]*\s*:\s*[*_]*\s*(.*)$"
    ))
    .expect("improvement pattern compiles")
});

static OTHER_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i){LINE_PREFIX}(?:reasoning|explanation|justification|rationale|analysis|feedback|comments?|suggestions?)\s*[*_]*\s*:"
    ))
    .expect("field pattern compiles")
});

/// Scores and suggestions gathered per criterion while scanning.
#[derive(Debug, Default)]
struct Findings {
    discovered: Vec<Criterion>,
    scores: HashMap<Criterion, Option<f64>>,
    suggestions: HashMap<Criterion, String>,
}

impl Findings {
    fn discover(&mut self, criterion: Criterion) {
        if !self.discovered.contains(&criterion) {
            self.discovered.push(criterion);
        }
    }

    /// First score line wins, even when its value turns out to be unusable.
    fn record_score(&mut self, criterion: Criterion, token: &str) {
        self.scores
            .entry(criterion)
            .or_insert_with(|| parse_score_token(token));
    }

    fn record_suggestion(&mut self, criterion: Criterion, text: String) {
        self.suggestions.entry(criterion).or_insert(text);
    }

    fn into_scorecard(mut self) -> Scorecard {
        let mut scorecard = Scorecard::new();
        for criterion in self.discovered {
            let Some(Some(score)) = self.scores.get(&criterion).copied() else {
                continue;
            };
            let suggestion = self.suggestions.remove(&criterion).unwrap_or_default();
            if !scorecard.insert(ScoreEntry {
                criterion,
                score,
                suggestion,
            }) {
                debug!(%criterion, score, "dropping out-of-range score");
            }
        }
        scorecard
    }
}

/// Improvement text being collected for a criterion.
#[derive(Debug)]
struct Capture {
    criterion: Criterion,
    lines: Vec<String>,
}

impl Capture {
    fn text(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}

/// Parses heading-delimited prose carrying `Score:` and `Improvement:` markers.
///
/// Blocks are separated by blank lines or by a heading naming a criterion. A block whose
/// first line is not a recognizable heading is scanned line by line for a criterion
/// mention, so a mislabeled heading still attributes the scores that follow it.
pub(crate) fn parse_free_text(raw: &str) -> Scorecard {
    let mut findings = Findings::default();
    let mut current: Option<Criterion> = None;
    let mut block_labeled = false;
    let mut capture: Option<Capture> = None;

    for line in raw.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            // An `Improvement:` marker with nothing after it yet absorbs the next block.
            if capture.as_ref().is_some_and(|open| !open.text().is_empty()) {
                finish(&mut findings, capture.take());
            }
            block_labeled = false;
            continue;
        }

        if let Some(score) = SCORE_LINE.captures(trimmed) {
            finish(&mut findings, capture.take());
            if let (Some(criterion), Some(token)) = (current, score.get(1)) {
                findings.record_score(criterion, token.as_str());
            }
            continue;
        }

        if SCORE_LABEL.is_match(trimmed) {
            finish(&mut findings, capture.take());
            continue;
        }

        if let Some(improvement) = IMPROVEMENT_LINE.captures(trimmed) {
            finish(&mut findings, capture.take());
            if let Some(criterion) = current {
                let first = improvement
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                capture = Some(Capture {
                    criterion,
                    lines: vec![first],
                });
            }
            continue;
        }

        if OTHER_FIELD.is_match(trimmed) {
            finish(&mut findings, capture.take());
            continue;
        }

        if let Some(heading) = parse_heading(trimmed) {
            finish(&mut findings, capture.take());
            current = Some(heading.criterion);
            block_labeled = true;
            findings.discover(heading.criterion);
            if let Some(token) = heading.inline_score {
                findings.record_score(heading.criterion, &token);
            }
            continue;
        }

        if let Some(open) = capture.as_mut() {
            open.lines.push(line.trim_end().to_string());
            continue;
        }

        if !block_labeled {
            if let Some(criterion) = mentioned_criterion(trimmed) {
                let relabel = current.is_none()
                    || looks_like_label(trimmed)
                    || starts_with_criterion(trimmed);
                if relabel {
                    current = Some(criterion);
                    block_labeled = true;
                    findings.discover(criterion);
                }
            }
        }
    }

    finish(&mut findings, capture.take());
    findings.into_scorecard()
}

fn finish(findings: &mut Findings, capture: Option<Capture>) {
    if let Some(capture) = capture {
        findings.record_suggestion(capture.criterion, capture.text());
    }
}

/// Free-text scores are whole numbers; a decimal token yields no score.
fn parse_score_token(token: &str) -> Option<f64> {
    token.trim().parse::<u32>().ok().map(f64::from)
}
