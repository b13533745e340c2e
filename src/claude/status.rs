use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

const STATUS_EXT: &str = "status";

/// Agent status published for a session by an external hook.
///
/// Files live at `<cache_dir>/<session>.status` and hold `state:unix_ts`,
/// e.g. `working:1700000000`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxStatus {
    pub state: String,
    pub timestamp: DateTime<Utc>,
}

impl AuxStatus {
    pub fn parse(content: &str) -> Option<Self> {
        let (state, ts) = content.trim().split_once(':')?;
        let secs = ts.parse::<i64>().ok()?;
        Some(Self {
            state: state.to_string(),
            timestamp: DateTime::from_timestamp(secs, 0)?,
        })
    }
}

fn status_path(cache_dir: &Path, session: &str) -> PathBuf {
    cache_dir.join(format!("{session}.{STATUS_EXT}"))
}

/// Read the status for one session. Missing or malformed files yield `None`.
pub fn read_status(cache_dir: &Path, session: &str) -> Option<AuxStatus> {
    let content = std::fs::read_to_string(status_path(cache_dir, session)).ok()?;
    let status = AuxStatus::parse(&content)?;
    (!status.state.is_empty()).then_some(status)
}

pub fn read_statuses<'a>(
    cache_dir: &Path,
    sessions: impl IntoIterator<Item = &'a str>,
) -> HashMap<String, AuxStatus> {
    sessions
        .into_iter()
        .filter_map(|name| read_status(cache_dir, name).map(|s| (name.to_string(), s)))
        .collect()
}

/// Remove status files for sessions that no longer exist.
pub fn cleanup_stale(cache_dir: &Path, active: &[&str]) {
    let Ok(entries) = std::fs::read_dir(cache_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(STATUS_EXT) {
            continue;
        }
        let Some(session) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !active.contains(&session) {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::debug!("Failed to remove stale status {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let s = AuxStatus::parse("working:1700000000\n").unwrap();
        assert_eq!(s.state, "working");
        assert_eq!(s.timestamp.timestamp(), 1_700_000_000);

        assert!(AuxStatus::parse("working").is_none());
        assert!(AuxStatus::parse("working:soon").is_none());
    }

    #[test]
    fn test_read_statuses_skips_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.status"), "waiting:100").unwrap();
        std::fs::write(dir.path().join("beta.status"), ":100").unwrap();

        let statuses = read_statuses(dir.path(), ["alpha", "beta", "gamma"]);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses["alpha"].state, "waiting");
    }

    #[test]
    fn test_cleanup_stale() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alpha.status"), "new:1").unwrap();
        std::fs::write(dir.path().join("gone.status"), "new:1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        cleanup_stale(dir.path(), &["alpha"]);

        assert!(dir.path().join("alpha.status").exists());
        assert!(!dir.path().join("gone.status").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
