use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$DAYBOOK_HOME`, else `~/.daybook`.
pub fn daybook_home() -> Result<PathBuf> {
    resolve_home(std::env::var("DAYBOOK_HOME").ok(), std::env::var("HOME").ok())
}

fn resolve_home(daybook_home: Option<String>, home: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = daybook_home.filter(|s| !s.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home.context("HOME is not set (or set DAYBOOK_HOME)")?;
    Ok(PathBuf::from(home).join(".daybook"))
}

pub fn ensure_daybook_home() -> Result<PathBuf> {
    let dir = daybook_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
