use anyhow::{Context, Result};
use chrono_tz::Tz;
use daybook_core::ScoringPolicy;
use daybook_core::time::parse_timezone;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_daybook_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataSection,
    pub scoring: ScoringSection,
    pub user: UserSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory holding the CSV tables. Defaults to `<daybook home>/data`.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    pub passing_score: i32,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            passing_score: ScoringPolicy::default().passing_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSection {
    /// IANA name; log timestamps are bucketed into this zone's calendar days.
    pub timezone: String,
}

impl Default for UserSection {
    fn default() -> Self {
        Self {
            timezone: "America/Chicago".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter used when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    pub fn data_dir(&self, home: &Path) -> PathBuf {
        self.data.dir.clone().unwrap_or_else(|| home.join("data"))
    }

    pub fn timezone(&self) -> Result<Tz> {
        parse_timezone(&self.user.timezone).context("[user] timezone in config.toml")
    }

    pub fn policy(&self) -> ScoringPolicy {
        ScoringPolicy {
            passing_score: self.scoring.passing_score,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_daybook_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the default config unless one exists. Returns the path and whether it was created.
pub fn init_config() -> Result<(PathBuf, bool)> {
    let p = config_path()?;
    if p.exists() {
        return Ok((p, false));
    }
    save_config(&Config::default())?;
    Ok((p, true))
}
