use chrono::NaiveDate;
use serde_json::Value;

use crate::error::{Result, ScienceError};
use crate::normalize::{RawRecord, SourceKind};

/// Keep only the allow-listed keys of `kind` and rename them to canonical keys.
pub fn project(raw: &RawRecord, kind: SourceKind) -> RawRecord {
    let mut out = RawRecord::new();
    for key in kind.allowed_keys() {
        let Some(value) = raw.get(*key) else {
            continue;
        };
        let canonical = kind
            .renames()
            .iter()
            .find(|(from, _)| from == key)
            .map(|(_, to)| *to)
            .unwrap_or(*key);
        out.insert(canonical.to_string(), value.clone());
    }
    out
}

/// Collapse line breaks and repeated whitespace.
pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-empty, whitespace-collapsed string value.
pub fn text(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => clean_text(s),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

/// Trimmed string value with inner formatting preserved.
pub fn raw_text(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Flatten a tag or author structure into plain names.
///
/// Accepts a single string, a list of strings, or a list of objects that
/// carry their label under `term`, `name` or `$`.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::String(s)) => {
            let s = clean_text(s);
            return if s.is_empty() { Vec::new() } else { vec![s] };
        }
        _ => return Vec::new(),
    };

    let mut out: Vec<String> = Vec::new();
    for item in items {
        let label = match item {
            Value::String(s) => Some(clean_text(s)),
            Value::Object(obj) => ["term", "name", "$"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))
                .map(clean_text),
            _ => None,
        };
        if let Some(label) = label.filter(|l| !l.is_empty())
            && !out.contains(&label)
        {
            out.push(label);
        }
    }
    out
}

/// Citation counts arrive as numbers or as display strings like `"1,204"`.
pub fn count(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s
            .split_whitespace()
            .next()
            .and_then(|token| token.replace(',', "").parse().ok()),
        _ => None,
    }
}

/// Parse `YYYY`, `YYYY-MM-DD` or an ISO timestamp into a calendar date.
///
/// A bare year maps to January 1st. Absent or empty values are `None`;
/// anything else that does not parse is an error.
pub fn date(field: &str, value: Option<&Value>) -> Result<Option<NaiveDate>> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(ScienceError::InvalidDate(field.to_string(), other.to_string()));
        }
    };
    if raw.is_empty() {
        return Ok(None);
    }

    let day_part = raw.split('T').next().unwrap_or_default();
    let invalid = || ScienceError::InvalidDate(field.to_string(), raw.clone());

    if day_part.len() == 4 && day_part.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = day_part.parse().map_err(|_| invalid())?;
        return NaiveDate::from_ymd_opt(year, 1, 1).map(Some).ok_or_else(invalid);
    }

    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| invalid())
}
