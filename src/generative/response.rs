//! Parsing free-form model replies into JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::compile_static_regex;
use crate::error::ExtractError;

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r",(\s*[}\]])"));

const FENCE: &str = "```";

/// Parses a model reply as JSON.
///
/// Code fences and a leading `json` tag are removed, the text is narrowed to
/// the outermost array or object, and one repair pass drops trailing commas.
///
/// # Errors
///
/// Returns [`ExtractError::GenerativeOutputInvalid`] when no JSON value can be
/// recovered.
pub fn parse_model_json(reply: &str) -> Result<Value, ExtractError> {
    let unfenced = strip_fences(reply);
    let body = outermost_json(unfenced)
        .ok_or_else(|| ExtractError::invalid_output("reply contains no JSON array or object"))?;

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!(error = %first, "Model reply not strict JSON; retrying without trailing commas");
            let repaired = TRAILING_COMMA_RE.replace_all(body, "$1");
            serde_json::from_str(&repaired).map_err(ExtractError::invalid_output)
        }
    }
}

fn strip_fences(reply: &str) -> &str {
    let mut text = reply.trim();
    if text.starts_with(FENCE) {
        text = text.split_once('\n').map_or("", |(_, rest)| rest);
    }
    if text.trim_end().ends_with(FENCE)
        && let Some(end) = text.rfind(FENCE)
    {
        text = &text[..end];
    }
    let text = text.trim();
    text.strip_prefix("json").unwrap_or(text).trim()
}

fn outermost_json(text: &str) -> Option<&str> {
    let array = text.find('[');
    let object = text.find('{');
    let (start, closer) = match (array, object) {
        (Some(a), Some(o)) if a < o => (a, ']'),
        (_, Some(o)) => (o, '}'),
        (Some(a), None) => (a, ']'),
        (None, None) => return None,
    };
    let end = text.rfind(closer).filter(|&end| end > start)?;
    Some(&text[start..=end])
}

/// Records from a reply that should hold a list.
///
/// An array is taken as is. An object contributes its `key` array when
/// present, otherwise it is a single record.
#[must_use]
pub fn records(value: Value, key: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert(key.to_string(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        _ => Vec::new(),
    }
}

/// The `events` array of a whole-season reply.
#[must_use]
pub fn season_events(value: Value) -> Vec<Value> {
    match value {
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}
