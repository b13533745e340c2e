use chrono::{DateTime, Utc};
use serde::Serialize;

/// A window inside a tmux session.
///
/// Indices come straight from tmux: unique within the session, but not
/// necessarily contiguous or starting at 1 (`base-index`, closed windows).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub index: u32,
    pub name: String,
}

impl Window {
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// A top-level tmux session as seen by the picker.
///
/// `windows` stays empty until the session is first expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub name: String,
    pub last_activity: DateTime<Utc>,
    #[serde(skip)]
    pub expanded: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<Window>,
}

impl Session {
    pub fn new(name: impl Into<String>, last_activity: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            last_activity,
            expanded: false,
            windows: Vec::new(),
        }
    }

    /// Parse a `#{session_name}\t#{session_activity}` line.
    pub(crate) fn from_list_line(line: &str) -> Option<Self> {
        let (name, activity) = line.split_once('\t')?;
        if name.is_empty() {
            return None;
        }
        let secs = activity.trim().parse::<i64>().unwrap_or(0);
        let last_activity = DateTime::from_timestamp(secs, 0).unwrap_or_default();
        Some(Self::new(name, last_activity))
    }
}

impl Window {
    /// Parse a `#{window_index}\t#{window_name}` line.
    pub(crate) fn from_list_line(line: &str) -> Option<Self> {
        let (index, name) = line.split_once('\t')?;
        let index = index.trim().parse::<u32>().ok()?;
        Some(Self::new(index, name))
    }
}

/// Carry per-session UI state from a previous listing into a fresh one,
/// matching sessions by name.
///
/// Only an expanded session keeps its loaded windows, as a placeholder until
/// they are fetched again; collapsed sessions drop theirs so the next expand
/// loads a current list. Sessions that vanished lose their state; new
/// sessions start collapsed.
pub fn carry_forward(previous: &[Session], fresh: &mut [Session]) {
    for session in fresh.iter_mut() {
        let Some(old) = previous.iter().find(|s| s.name == session.name) else {
            continue;
        };
        session.expanded = old.expanded;
        if old.expanded && session.windows.is_empty() {
            session.windows = old.windows.clone();
        }
    }
}
