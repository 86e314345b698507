//! Free-form duration text from time logs.
//!
//! Accepted shapes (all mean minutes unless an `h` part is present):
//!   90      90m     90 min
//!   1.5h    1h30m   1h 30m   2 h

use regex::Regex;

use crate::error::{StoreError, StoreResult};

/// Parse duration text into minutes. Empty text means "no duration".
pub fn parse_duration_minutes(text: &str) -> StoreResult<Option<f64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if let Ok(minutes) = text.parse::<f64>() {
        return Ok(Some(minutes));
    }

    let re = Regex::new(concat!(
        r"^(?i)\s*",
        r"(?:(?P<hours>\d+(?:\.\d+)?)\s*h(?:ours?|rs?)?)?\s*",
        r"(?:(?P<minutes>\d+(?:\.\d+)?)\s*m(?:in(?:ute)?s?)?)?\s*$"
    ))?;

    let caps = re.captures(text).ok_or_else(|| {
        StoreError::decode("outcome_logs", "duration", format!("unrecognised duration '{text}'"))
    })?;

    let part = |name: &str| -> StoreResult<Option<f64>> {
        caps.name(name)
            .map(|m| {
                m.as_str()
                    .parse::<f64>()
                    .map_err(|e| StoreError::decode("outcome_logs", "duration", e.to_string()))
            })
            .transpose()
    };

    match (part("hours")?, part("minutes")?) {
        (None, None) => Err(StoreError::decode(
            "outcome_logs",
            "duration",
            format!("unrecognised duration '{text}'"),
        )),
        (hours, minutes) => Ok(Some(hours.unwrap_or(0.0) * 60.0 + minutes.unwrap_or(0.0))),
    }
}
