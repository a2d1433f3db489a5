use super::super::domain::{Criterion, ScoreEntry, Scorecard};
use serde_json::{Map, Value};
use tracing::debug;

/// Result of looking for an embedded `{"scores": {...}, "suggestions": {...}}` object.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StructuredOutcome {
    NotFound,
    Rejected(&'static str),
    Parsed(Scorecard),
}

pub(crate) fn parse_structured(raw: &str) -> StructuredOutcome {
    let Some(object) = json_object_candidates(raw).find_map(|candidate| {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) if map.contains_key("scores") => Some(map),
            _ => None,
        }
    }) else {
        return StructuredOutcome::NotFound;
    };

    match scorecard_from_object(&object) {
        Ok(scorecard) => StructuredOutcome::Parsed(scorecard),
        Err(reason) => {
            debug!(reason, "structured response rejected");
            StructuredOutcome::Rejected(reason)
        }
    }
}

fn scorecard_from_object(object: &Map<String, Value>) -> Result<Scorecard, &'static str> {
    let scores = match object.get("scores") {
        Some(Value::Object(scores)) => scores,
        _ => return Err("`scores` is not an object"),
    };
    let suggestions = match object.get("suggestions") {
        Some(Value::Object(suggestions)) => suggestions,
        Some(_) => return Err("`suggestions` is not an object"),
        None => return Err("`suggestions` is missing"),
    };

    if scores.values().any(|value| !value.is_number()) {
        return Err("`scores` contains a non-numeric value");
    }
    if suggestions.values().any(|value| !value.is_string()) {
        return Err("`suggestions` contains a non-string value");
    }

    let mut scorecard = Scorecard::new();
    for (label, value) in scores {
        let Some(criterion) = Criterion::from_label(label) else {
            debug!(label = label.as_str(), "ignoring unknown criterion");
            continue;
        };
        let Some(score) = value.as_f64() else {
            continue;
        };
        let suggestion = suggestion_for(suggestions, criterion);
        if !scorecard.insert(ScoreEntry {
            criterion,
            score,
            suggestion,
        }) {
            debug!(%criterion, score, "dropping duplicate or out-of-range score");
        }
    }

    Ok(scorecard)
}

fn suggestion_for(suggestions: &Map<String, Value>, criterion: Criterion) -> String {
    suggestions
        .iter()
        .find(|(label, _)| Criterion::from_label(label) == Some(criterion))
        .and_then(|(_, value)| value.as_str())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Balanced `{ ... }` spans in the order their opening brace appears. Braces inside JSON
/// string literals are skipped.
pub(crate) fn json_object_candidates(text: &str) -> impl Iterator<Item = &str> + '_ {
    text.match_indices('{')
        .filter_map(move |(start, _)| matching_brace(text, start).map(|end| &text[start..=end]))
}

fn matching_brace(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }

    None
}
