use super::super::domain::Criterion;
use once_cell::sync::Lazy;
use regex::Regex;

const CRITERION_WORDS: &str =
    "empathy|clarity|attention|flow|benefits?|action|trust|emotion|adaptation|influence";

/// Lines at or under this many words may carry a criterion label even when they are
/// not formatted as a heading.
const LABEL_MAX_WORDS: usize = 8;

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^({CRITERION_WORDS})\b\s*(?:\(([^)]*)\))?\s*[:\-–—|]?\s*(.*)$"
    ))
    .expect("heading pattern compiles")
});

/// A bare score, or a score out of ten followed by commentary.
static HEADING_REMAINDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:score\s*[:\-]?\s*)?(\d+(?:[.,]\d+)?)(?:(?:\s*/\s*10|\s+out of 10)\b.*|\W*)$",
    )
    .expect("heading remainder pattern compiles")
});

static DESCRIPTION_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bscore\s*[:\-]?\s*(\d+(?:[.,]\d+)?)").expect("description score pattern compiles")
});

/// Criterion names at the start of a word, so `emotional` and `trustworthiness` count but
/// `transaction` does not.
static MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b({CRITERION_WORDS})\w*")).expect("mention pattern compiles")
});

static NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(?\d{1,2}[.)]\s*").expect("numbering pattern compiles"));

/// Lowercases a line and strips markdown decoration and list numbering.
pub(crate) fn normalize_label(line: &str) -> String {
    let cleaned = line.replace(['\u{feff}', '\u{200b}', '*', '`'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_lowercase();
    let stripped = lowered.trim_start_matches(|c: char| {
        matches!(c, '#' | '>' | '-' | '•' | '_') || c.is_whitespace()
    });
    let stripped = NUMBERING.replace(stripped, "");
    stripped
        .trim_matches(|c: char| c == '_' || c.is_whitespace())
        .to_string()
}

/// A heading names exactly one criterion, optionally followed by a parenthetical
/// description and an inline score such as `8/10`. The score may also sit inside the
/// parenthetical (`Clarity (Score: 8/10)`).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Heading {
    pub(crate) criterion: Criterion,
    pub(crate) inline_score: Option<String>,
}

pub(crate) fn parse_heading(line: &str) -> Option<Heading> {
    let normalized = normalize_label(line);
    let captures = HEADING.captures(&normalized)?;
    let criterion = criterion_for_word(captures.get(1)?.as_str())?;
    let described = captures
        .get(2)
        .and_then(|description| DESCRIPTION_SCORE.captures(description.as_str()))
        .and_then(|score| score.get(1))
        .map(|m| m.as_str().to_string());
    let remainder = captures.get(3).map(|m| m.as_str().trim()).unwrap_or("");

    if remainder.is_empty() || described.is_some() {
        return Some(Heading {
            criterion,
            inline_score: described,
        });
    }

    let inline = HEADING_REMAINDER.captures(remainder)?;
    Some(Heading {
        criterion,
        inline_score: inline.get(1).map(|m| m.as_str().to_string()),
    })
}

/// Earliest criterion named anywhere in the line.
pub(crate) fn mentioned_criterion(line: &str) -> Option<Criterion> {
    let normalized = normalize_label(line);
    MENTION
        .captures(&normalized)
        .and_then(|captures| captures.get(1))
        .and_then(|word| criterion_for_word(word.as_str()))
}

pub(crate) fn starts_with_criterion(line: &str) -> bool {
    let normalized = normalize_label(line);
    MENTION
        .find(&normalized)
        .map(|found| found.start() == 0)
        .unwrap_or(false)
}

pub(crate) fn looks_like_label(line: &str) -> bool {
    line.split_whitespace().count() <= LABEL_MAX_WORDS
}

fn criterion_for_word(word: &str) -> Option<Criterion> {
    match word {
        "benefit" => Some(Criterion::Benefits),
        other => Criterion::from_label(other),
    }
}
