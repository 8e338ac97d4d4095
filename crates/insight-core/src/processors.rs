use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

// ── MoneyCleaner ──────────────────────────────────────────────────────────────

/// Normalises locale-formatted monetary strings into plain floats.
pub struct MoneyCleaner;

impl MoneyCleaner {
    /// Clean a raw monetary string and parse it.
    ///
    /// Steps, in order:
    /// 1. Remove every occurrence of each configured literal token. Tokens
    ///    are applied in the given sequence; `" reais"` style suffixes are
    ///    removed the same way as `"R$ "` prefixes.
    /// 2. Convert comma decimal separators to periods.
    /// 3. Trim surrounding whitespace.
    /// 4. Parse as `f64`.
    ///
    /// Unparsable values yield `None`, never an error. Cleaning an
    /// already-clean numeric string is a no-op.
    pub fn clean(raw: &str, strip_tokens: &[String]) -> Option<f64> {
        let mut value = raw.to_string();
        for token in strip_tokens {
            if !token.is_empty() {
                value = value.replace(token.as_str(), "");
            }
        }
        let value = value.replace(',', ".");
        let trimmed = value.trim();
        match trimmed.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                debug!("MoneyCleaner: could not parse \"{}\" as a number", raw);
                None
            }
        }
    }
}

// ── DateParser ────────────────────────────────────────────────────────────────

/// Parses date strings from the variety of formats found in the datasets.
pub struct DateParser;

impl DateParser {
    /// Attempt to parse a date string into a UTC [`DateTime`].
    ///
    /// Handles RFC 3339 (including `Z`-suffix) and a series of common
    /// patterns, including the day-first `%d/%m/%Y` used by the rental
    /// payment log. Unparsable strings yield `None`.
    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        const DATETIME_FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%d/%m/%Y %H:%M:%S",
        ];
        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];
        for fmt in DATE_FORMATS {
            if let Ok(date) = chrono::NaiveDate::parse_from_str(s, fmt) {
                let naive = date.and_hms_opt(0, 0, 0)?;
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        debug!("DateParser: could not parse date string \"{}\"", s);
        None
    }

    /// Parse a [`serde_json::Value`] holding a date.
    ///
    /// Only strings are considered; everything else (including numbers)
    /// yields `None`.
    pub fn parse_value(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }
}

// ── Flattening ────────────────────────────────────────────────────────────────

/// Flatten a nested JSON object into a single-level map with dotted keys.
///
/// `{"a": {"b": 1}}` with prefix `""` becomes `{"a.b": 1}`. Arrays are kept
/// intact as values: list-valued columns must survive flattening so the
/// explosion step can expand them row-wise.
pub fn flatten_nested(data: &Value, prefix: &str) -> serde_json::Map<String, Value> {
    let mut result = serde_json::Map::new();
    flatten_inner(data, prefix, &mut result);
    result
}

fn flatten_inner(value: &Value, prefix: &str, output: &mut serde_json::Map<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let new_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_inner(val, &new_key, output);
            }
        }
        _ => {
            output.insert(prefix.to_string(), value.clone());
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
