//! Pillars: weighted life categories that group tasks.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PillarId(pub i64);

impl fmt::Display for PillarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    pub id: PillarId,
    pub name: String,
    /// Relative weight; pillars don't need to sum to 100.
    pub weight: f64,
}

impl Pillar {
    pub fn new(id: i64, name: impl Into<String>, weight: f64) -> Self {
        Self {
            id: PillarId(id),
            name: name.into(),
            weight,
        }
    }
}

/// Grouping key for pillar scores.
///
/// Tasks without a pillar land in `Unassigned`, which can never collide with a real
/// pillar id (including 0). Serialized as a plain string so it works as a JSON map key:
/// `"unassigned"` or the decimal id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PillarKey {
    Unassigned,
    Pillar(PillarId),
}

impl PillarKey {
    pub fn of(pillar: Option<PillarId>) -> Self {
        match pillar {
            Some(id) => PillarKey::Pillar(id),
            None => PillarKey::Unassigned,
        }
    }
}

impl From<PillarId> for PillarKey {
    fn from(id: PillarId) -> Self {
        PillarKey::Pillar(id)
    }
}

impl fmt::Display for PillarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PillarKey::Unassigned => write!(f, "unassigned"),
            PillarKey::Pillar(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for PillarKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unassigned") {
            return Ok(PillarKey::Unassigned);
        }
        let id: i64 = s
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid pillar key: {s}"))?;
        Ok(PillarKey::Pillar(PillarId(id)))
    }
}

impl Serialize for PillarKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PillarKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
