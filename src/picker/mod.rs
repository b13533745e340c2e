//! The list controller behind the session picker.
//!
//! [`Picker`] is a closed state machine: it consumes [`Event`]s and answers
//! with [`Command`]s describing the I/O to perform next. It never touches
//! tmux, the filesystem or the terminal itself.

mod controller;
mod input;
mod mode;
mod rows;
mod view;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};

use crate::claude::AuxStatus;
use crate::tmux::{Session, Window};

pub use controller::{Picker, PickerOptions, StatusMessage, MESSAGE_CLEAR_DELAY};
pub use input::TextInput;
pub use mode::Mode;
pub use rows::{clamp_cursor, matches_filter, rebuild, Row};
pub use view::{format_time_ago, RowView};

/// What a switch or kill is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Session(String),
    Window { session: String, index: u32 },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Session(name) => write!(f, "{name}"),
            Target::Window { session, index } => write!(f, "{session}:{index}"),
        }
    }
}

/// Why a switch was requested; decides how its outcome is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchReason {
    Select,
    Jump,
    Created,
}

/// Outcome of an asynchronous command, error already rendered to text
pub type Outcome = std::result::Result<(), String>;

/// Inputs to the picker
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(KeyCode, KeyModifiers),
    SessionsLoaded {
        sessions: Vec<Session>,
        statuses: HashMap<String, AuxStatus>,
    },
    SessionsFailed(String),
    WindowsLoaded {
        session: String,
        windows: Vec<Window>,
    },
    WindowsFailed {
        session: String,
        error: String,
    },
    Switched {
        target: Target,
        reason: SwitchReason,
        result: Outcome,
    },
    Killed {
        target: Target,
        result: Outcome,
    },
    Created {
        name: String,
        working_dir: PathBuf,
        result: Outcome,
    },
    ClearMessage {
        generation: u64,
    },
    Tick,
}

impl Event {
    /// Shorthand for a key press without modifiers
    pub fn key(code: KeyCode) -> Self {
        Event::Key(code, KeyModifiers::NONE)
    }
}

/// I/O the picker asks its runtime to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchSessions,
    FetchWindows {
        session: String,
    },
    SwitchTo {
        target: Target,
        reason: SwitchReason,
    },
    Kill(Target),
    CreateSession {
        name: String,
        working_dir: PathBuf,
    },
    /// Detached: no result ever comes back
    ApplyLayout {
        session: String,
        working_dir: PathBuf,
    },
    ClearMessageAfter {
        generation: u64,
        delay: Duration,
    },
    Quit,
}
