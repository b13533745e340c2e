use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyModifiers};

use crate::claude::AuxStatus;
use crate::config::KeyBindings;
use crate::tmux::{carry_forward, Session, Window};

use super::input::TextInput;
use super::mode::Mode;
use super::rows::{clamp_cursor, rebuild, Row};
use super::{Command, Event, Outcome, SwitchReason, Target};

/// How long a kill result stays on screen
pub const MESSAGE_CLEAR_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PickerOptions {
    /// Directory new sessions start in
    pub working_dir: PathBuf,
    /// Ask for a layout after creating a session
    pub apply_layout: bool,
    /// Carry expansion and loaded windows across refreshes
    pub keep_expansion_on_refresh: bool,
    pub keys: KeyBindings,
}

impl PickerOptions {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            apply_layout: false,
            keep_expansion_on_refresh: true,
            keys: KeyBindings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// List controller: sessions, their flattened rows, cursor, filter and mode
#[derive(Debug)]
pub struct Picker {
    options: PickerOptions,
    sessions: Vec<Session>,
    statuses: HashMap<String, AuxStatus>,
    rows: Vec<Row>,
    cursor: usize,
    mode: Mode,
    filter: String,
    message: Option<StatusMessage>,
    /// Bumped on every message; a delayed clear only applies to its own generation
    message_generation: u64,
    /// Session waiting for its windows before it can expand
    pending_expand: Option<String>,
}

impl Picker {
    pub fn new(options: PickerOptions) -> Self {
        Self {
            options,
            sessions: Vec::new(),
            statuses: HashMap::new(),
            rows: Vec::new(),
            cursor: 0,
            mode: Mode::Normal,
            filter: String::new(),
            message: None,
            message_generation: 0,
            pending_expand: None,
        }
    }

    /// Commands to run at startup
    pub fn init(&self) -> Vec<Command> {
        vec![Command::FetchSessions]
    }

    /// Apply one event to completion and return the I/O it calls for.
    pub fn handle(&mut self, event: Event) -> Vec<Command> {
        let commands = match event {
            Event::Key(code, modifiers) => self.handle_key(code, modifiers),
            Event::SessionsLoaded { sessions, statuses } => {
                self.on_sessions_loaded(sessions, statuses)
            }
            Event::SessionsFailed(error) => {
                self.set_message(format!("Error: {error}"), true);
                Vec::new()
            }
            Event::WindowsLoaded { session, windows } => self.on_windows_loaded(&session, windows),
            Event::WindowsFailed { session, error } => {
                if self.pending_expand.as_deref() == Some(session.as_str()) {
                    self.pending_expand = None;
                }
                self.set_message(format!("Error loading windows: {error}"), true);
                Vec::new()
            }
            Event::Switched {
                target,
                reason,
                result,
            } => self.on_switched(&target, reason, result),
            Event::Killed { target, result } => self.on_killed(&target, result),
            Event::Created {
                name,
                working_dir,
                result,
            } => self.on_created(name, working_dir, result),
            Event::ClearMessage { generation } => {
                if generation == self.message_generation {
                    self.message = None;
                }
                Vec::new()
            }
            Event::Tick => Vec::new(),
        };

        if !commands.is_empty() {
            tracing::debug!(?commands, "picker commands");
        }
        commands
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(code, modifiers),
            Mode::ConfirmKill { .. } => self.handle_confirm_key(code, modifiers),
            Mode::Create { .. } => self.handle_create_key(code, modifiers),
        }
    }

    fn is(&self, action: &'static str, code: &KeyCode, modifiers: KeyModifiers) -> bool {
        self.options.keys.matches(action, code, modifiers)
    }

    fn handle_normal_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        let plain = !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        if self.is("quit", &code, modifiers) {
            return vec![Command::Quit];
        }
        if self.is("cancel", &code, modifiers) {
            // Esc clears an active filter, otherwise quits
            if self.filter.is_empty() {
                return vec![Command::Quit];
            }
            self.clear_filter();
            return Vec::new();
        }
        if self.is("up", &code, modifiers) {
            self.move_up();
            return Vec::new();
        }
        if self.is("down", &code, modifiers) {
            self.move_down();
            return Vec::new();
        }
        if self.is("expand", &code, modifiers) {
            return self.expand();
        }
        if self.is("collapse", &code, modifiers) {
            self.collapse();
            return Vec::new();
        }
        if self.is("select", &code, modifiers) {
            return self.select();
        }
        if self.is("kill", &code, modifiers) {
            self.request_kill();
            return Vec::new();
        }
        if self.is("create", &code, modifiers) {
            self.enter_create();
            return Vec::new();
        }

        match code {
            // Digits jump only while no filter is active
            KeyCode::Char(c @ '1'..='9') if plain && self.filter.is_empty() => {
                self.jump(c.to_digit(10).unwrap_or(0))
            }
            KeyCode::Backspace => {
                self.pop_filter();
                Vec::new()
            }
            KeyCode::Char(c) if plain => {
                self.push_filter(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        if self.is("confirm", &code, modifiers) {
            return self.confirm_kill();
        }
        if self.is("cancel", &code, modifiers) {
            self.cancel_kill();
        }
        Vec::new()
    }

    fn handle_create_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Vec<Command> {
        if self.is("cancel", &code, modifiers) {
            self.cancel_create();
            return Vec::new();
        }
        if code == KeyCode::Enter {
            return self.submit_create();
        }
        // Control/alt chords belong to the list, not the text field
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return Vec::new();
        }

        let Mode::Create { input } = &mut self.mode else {
            return Vec::new();
        };
        match code {
            KeyCode::Char(c) => input.insert(c),
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
        Vec::new()
    }

    // Filter

    pub fn push_filter(&mut self, c: char) {
        self.filter.push(c);
        self.refresh_rows(None);
    }

    pub fn pop_filter(&mut self) {
        if self.filter.pop().is_some() {
            self.refresh_rows(None);
        }
    }

    pub fn clear_filter(&mut self) {
        if !self.filter.is_empty() {
            self.filter.clear();
            self.refresh_rows(None);
        }
    }

    // Cursor & navigation

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.rows.len() {
            self.cursor += 1;
        }
    }

    pub fn current_row(&self) -> Option<Row> {
        self.rows.get(self.cursor).copied()
    }

    /// Switch/kill target for a row
    pub fn target_of(&self, row: Row) -> Option<Target> {
        match row {
            Row::Session { session } => {
                let s = self.sessions.get(session)?;
                Some(Target::Session(s.name.clone()))
            }
            Row::Window { session, window } => {
                let s = self.sessions.get(session)?;
                let w = s.windows.get(window)?;
                Some(Target::Window {
                    session: s.name.clone(),
                    index: w.index,
                })
            }
        }
    }

    pub fn current_target(&self) -> Option<Target> {
        self.target_of(self.current_row()?)
    }

    fn locate(&self, target: &Target) -> Option<usize> {
        self.rows
            .iter()
            .position(|&row| self.target_of(row).as_ref() == Some(target))
    }

    /// Rebuild rows from sessions and filter, optionally following `focus`,
    /// then clamp the cursor. Runs after every structural change.
    fn refresh_rows(&mut self, focus: Option<Target>) {
        self.rows = rebuild(&self.sessions, &self.filter);
        let pos = focus.and_then(|t| {
            self.locate(&t).or_else(|| match t {
                // A vanished window hands the cursor to its session
                Target::Window { session, .. } => self.locate(&Target::Session(session)),
                Target::Session(_) => None,
            })
        });
        if let Some(pos) = pos {
            self.cursor = pos;
        }
        self.cursor = clamp_cursor(self.cursor, self.rows.len());
    }

    fn collapse_all(&mut self) {
        for session in &mut self.sessions {
            session.expanded = false;
        }
    }

    // Actions

    /// Expand the selected session, collapsing every other one. Sessions
    /// whose windows were never loaded expand once `WindowsLoaded` arrives.
    pub fn expand(&mut self) -> Vec<Command> {
        let Some(Row::Session { session: idx }) = self.current_row() else {
            return Vec::new();
        };
        let name = self.sessions[idx].name.clone();
        let focus = Some(Target::Session(name.clone()));

        self.collapse_all();

        if self.sessions[idx].windows.is_empty() {
            self.pending_expand = Some(name.clone());
            self.refresh_rows(focus);
            return vec![Command::FetchWindows { session: name }];
        }

        self.pending_expand = None;
        self.sessions[idx].expanded = true;
        self.refresh_rows(focus);
        Vec::new()
    }

    /// Collapse the selected session, or the parent of the selected window
    /// (moving the cursor onto the parent's row).
    pub fn collapse(&mut self) {
        let Some(row) = self.current_row() else {
            return;
        };
        let idx = row.session_index();
        let name = self.sessions[idx].name.clone();

        if self.pending_expand.as_deref() == Some(name.as_str()) {
            self.pending_expand = None;
        }
        if !self.sessions[idx].expanded {
            return;
        }

        self.sessions[idx].expanded = false;
        self.refresh_rows(Some(Target::Session(name)));
    }

    pub fn select(&mut self) -> Vec<Command> {
        match self.current_target() {
            Some(target) => vec![Command::SwitchTo {
                target,
                reason: SwitchReason::Select,
            }],
            None => Vec::new(),
        }
    }

    /// Numeric addressing. Inside an expanded session the digit names a
    /// window index; otherwise (or when no such window exists) it is the
    /// 1-based position among the visible sessions.
    pub fn jump(&mut self, digit: u32) -> Vec<Command> {
        if !(1..=9).contains(&digit) {
            return Vec::new();
        }

        if let Some(row) = self.current_row() {
            let session = &self.sessions[row.session_index()];
            if session.expanded {
                if let Some(window) = session.windows.iter().find(|w| w.index == digit) {
                    return vec![Command::SwitchTo {
                        target: Target::Window {
                            session: session.name.clone(),
                            index: window.index,
                        },
                        reason: SwitchReason::Jump,
                    }];
                }
            }
        }

        let nth = self
            .rows
            .iter()
            .filter(|r| r.is_session())
            .nth(digit as usize - 1)
            .copied();

        match nth.and_then(|row| self.target_of(row)) {
            Some(target) => vec![Command::SwitchTo {
                target,
                reason: SwitchReason::Jump,
            }],
            None => Vec::new(),
        }
    }

    pub fn request_kill(&mut self) {
        if let Some(target) = self.current_target() {
            self.mode = Mode::ConfirmKill { target };
        }
    }

    /// Issue the kill captured by `request_kill`. Without a captured target
    /// this does nothing.
    pub fn confirm_kill(&mut self) -> Vec<Command> {
        match std::mem::take(&mut self.mode) {
            Mode::ConfirmKill { target } => vec![Command::Kill(target)],
            other => {
                self.mode = other;
                Vec::new()
            }
        }
    }

    pub fn cancel_kill(&mut self) {
        if matches!(self.mode, Mode::ConfirmKill { .. }) {
            self.mode = Mode::Normal;
            self.message = None;
        }
    }

    pub fn enter_create(&mut self) {
        self.mode = Mode::Create {
            input: TextInput::new(),
        };
        self.clear_filter();
    }

    pub fn cancel_create(&mut self) {
        if matches!(self.mode, Mode::Create { .. }) {
            self.mode = Mode::Normal;
        }
    }

    pub fn submit_create(&mut self) -> Vec<Command> {
        let Mode::Create { input } = &self.mode else {
            return Vec::new();
        };

        let name = input.text().trim().to_string();
        if name.is_empty() {
            self.set_message("Session name cannot be empty", true);
            return Vec::new();
        }

        self.mode = Mode::Normal;
        self.message = None;
        vec![Command::CreateSession {
            name,
            working_dir: self.options.working_dir.clone(),
        }]
    }

    // Results of earlier commands

    fn on_sessions_loaded(
        &mut self,
        mut sessions: Vec<Session>,
        statuses: HashMap<String, AuxStatus>,
    ) -> Vec<Command> {
        let focus = self.current_target();

        if self.options.keep_expansion_on_refresh {
            carry_forward(&self.sessions, &mut sessions);
        }
        if let Some(pending) = self.pending_expand.as_deref() {
            if !sessions.iter().any(|s| s.name == pending) {
                self.pending_expand = None;
            }
        }

        self.sessions = sessions;
        self.statuses = statuses;
        self.refresh_rows(focus);

        let hint = self.empty_hint();
        if self.rows.is_empty() && self.filter.is_empty() {
            self.set_message(hint, false);
        } else if self.message.as_ref().is_some_and(|m| m.text == hint) {
            self.message = None;
        }

        // Windows carried across the refresh may be stale
        self.sessions
            .iter()
            .filter(|s| s.expanded)
            .map(|s| Command::FetchWindows {
                session: s.name.clone(),
            })
            .collect()
    }

    fn empty_hint(&self) -> String {
        let create = self.options.keys.label("create");
        format!("No other sessions. Press {create} to create one.")
    }

    fn on_windows_loaded(&mut self, session: &str, windows: Vec<Window>) -> Vec<Command> {
        let focus = self.current_target();
        let Some(idx) = self.sessions.iter().position(|s| s.name == session) else {
            return Vec::new();
        };

        self.sessions[idx].windows = windows;

        if self.pending_expand.as_deref() == Some(session) {
            self.pending_expand = None;
            self.collapse_all();
            self.sessions[idx].expanded = true;
        }
        self.refresh_rows(focus);
        Vec::new()
    }

    fn on_switched(
        &mut self,
        target: &Target,
        reason: SwitchReason,
        result: Outcome,
    ) -> Vec<Command> {
        match result {
            Ok(()) => {
                tracing::info!("Switched to {target}");
                vec![Command::Quit]
            }
            Err(e) if reason == SwitchReason::Created => {
                self.set_message(format!("Created but failed to switch: {e}"), true);
                vec![Command::FetchSessions]
            }
            Err(e) => {
                self.set_message(format!("Error: {e}"), true);
                Vec::new()
            }
        }
    }

    fn on_killed(&mut self, target: &Target, result: Outcome) -> Vec<Command> {
        let generation = match result {
            Ok(()) => {
                if let Target::Window { session, index } = target {
                    self.forget_window(session, *index);
                }
                let text = match target {
                    Target::Session(name) => format!("Killed \"{name}\""),
                    Target::Window { index, .. } => format!("Killed window {index}"),
                };
                self.set_message(text, false)
            }
            Err(e) => self.set_message(format!("Error: {e}"), true),
        };

        vec![
            Command::FetchSessions,
            Command::ClearMessageAfter {
                generation,
                delay: MESSAGE_CLEAR_DELAY,
            },
        ]
    }

    /// Drop a killed window from the cache without waiting for a reload
    fn forget_window(&mut self, session: &str, index: u32) {
        let focus = self.current_target();
        let Some(s) = self.sessions.iter_mut().find(|s| s.name == session) else {
            return;
        };
        s.windows.retain(|w| w.index != index);
        if s.windows.is_empty() {
            s.expanded = false;
        }
        self.refresh_rows(focus);
    }

    fn on_created(&mut self, name: String, working_dir: PathBuf, result: Outcome) -> Vec<Command> {
        if let Err(e) = result {
            self.set_message(format!("Error: {e}"), true);
            return Vec::new();
        }

        let mut commands = Vec::new();
        if self.options.apply_layout {
            commands.push(Command::ApplyLayout {
                session: name.clone(),
                working_dir,
            });
        }
        commands.push(Command::SwitchTo {
            target: Target::Session(name),
            reason: SwitchReason::Created,
        });
        commands
    }

    fn set_message(&mut self, text: impl Into<String>, is_error: bool) -> u64 {
        self.message_generation += 1;
        self.message = Some(StatusMessage {
            text: text.into(),
            is_error,
        });
        self.message_generation
    }

    // Read access for the rendering layer

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn status(&self, session: &str) -> Option<&AuxStatus> {
        self.statuses.get(session)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn message(&self) -> Option<&StatusMessage> {
        self.message.as_ref()
    }

    pub fn keys(&self) -> &KeyBindings {
        &self.options.keys
    }

    pub fn is_loading_windows(&self) -> bool {
        self.pending_expand.is_some()
    }
}
