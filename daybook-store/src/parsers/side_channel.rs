//! JSON-in-a-column and timestamp fields.
//!
//! Some columns carry structured values as text:
//!   custom_days     "[1,3,5]"                  weekdays, 0 = Sunday
//!   pillar_scores   {"3":80,"unassigned":40}   per-pillar day scores
//!   logged_at       RFC 3339, or "YYYY-MM-DD HH:MM" in the user's timezone

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use daybook_core::PillarKey;
use daybook_core::time::parse_local_to_utc;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{StoreError, StoreResult};

pub fn decode_custom_days(text: &str) -> StoreResult<BTreeSet<u8>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(BTreeSet::new());
    }

    let days: Vec<u8> = serde_json::from_str(text)?;
    if let Some(bad) = days.iter().find(|d| **d > 6) {
        return Err(StoreError::decode(
            "tasks",
            "custom_days",
            format!("weekday {bad} out of range 0-6"),
        ));
    }
    Ok(days.into_iter().collect())
}

pub fn encode_custom_days(days: &BTreeSet<u8>) -> StoreResult<String> {
    if days.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(days)?)
}

pub fn decode_pillar_scores(text: &str) -> StoreResult<BTreeMap<PillarKey, i32>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(text)?)
}

pub fn encode_pillar_scores(scores: &BTreeMap<PillarKey, i32>) -> StoreResult<String> {
    Ok(serde_json::to_string(scores)?)
}

pub fn parse_logged_at(text: &str, tz: Tz) -> StoreResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }
    parse_local_to_utc(text, tz)
        .map_err(|e| StoreError::decode("outcome_logs", "logged_at", e.to_string()))
}
