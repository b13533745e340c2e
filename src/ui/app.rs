use std::collections::HashMap;
use std::io;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{Event as CrosstermEvent, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::claude::{cleanup_stale, read_statuses};
use crate::config::Config;
use crate::error::Result;
use crate::layout::LayoutRunner;
use crate::picker::{Command, Event, Picker, PickerOptions, Target};
use crate::tmux::Multiplexer;

const TICK_RATE: Duration = Duration::from_secs(1);

struct TermGuard;

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

/// Runs picker commands against the multiplexer. Every awaited command is a
/// spawned task whose result comes back on the event channel.
#[derive(Clone)]
pub struct Executor {
    mux: Arc<dyn Multiplexer>,
    layout: LayoutRunner,
    /// Session left out of listings (the one we are attached to)
    exclude: Option<String>,
    /// Status file directory, when status badges are enabled
    status_dir: Option<PathBuf>,
    tx: UnboundedSender<Event>,
}

impl Executor {
    pub fn new(
        mux: Arc<dyn Multiplexer>,
        layout: LayoutRunner,
        exclude: Option<String>,
        status_dir: Option<PathBuf>,
        tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            mux,
            layout,
            exclude,
            status_dir,
            tx,
        }
    }

    /// Start `command`; `Break` means the picker is done.
    pub fn execute(&self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Quit => return ControlFlow::Break(()),
            Command::ApplyLayout {
                session,
                working_dir,
            } => self.layout.apply_detached(&session, &working_dir),
            Command::ClearMessageAfter { generation, delay } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Event::ClearMessage { generation });
                });
            }
            command => {
                let this = self.clone();
                tokio::spawn(async move {
                    let event = this.run(command).await;
                    let _ = this.tx.send(event);
                });
            }
        }
        ControlFlow::Continue(())
    }

    async fn run(&self, command: Command) -> Event {
        match command {
            Command::FetchSessions => self.fetch_sessions().await,
            Command::FetchWindows { session } => match self.mux.list_windows(&session).await {
                Ok(windows) => Event::WindowsLoaded { session, windows },
                Err(e) => {
                    tracing::warn!("Failed to list windows of {session}: {e}");
                    Event::WindowsFailed {
                        session,
                        error: e.to_string(),
                    }
                }
            },
            Command::SwitchTo { target, reason } => {
                let result = self.mux.switch_client(&target.to_string()).await;
                Event::Switched {
                    target,
                    reason,
                    result: result.map_err(|e| e.to_string()),
                }
            }
            Command::Kill(target) => {
                let result = match &target {
                    Target::Session(name) => self.mux.kill_session(name).await,
                    Target::Window { session, index } => {
                        self.mux.kill_window(session, *index).await
                    }
                };
                if let Err(e) = &result {
                    tracing::warn!("Failed to kill {target}: {e}");
                }
                Event::Killed {
                    target,
                    result: result.map_err(|e| e.to_string()),
                }
            }
            Command::CreateSession { name, working_dir } => {
                let result = self.mux.create_session(&name, &working_dir).await;
                Event::Created {
                    name,
                    working_dir,
                    result: result.map_err(|e| e.to_string()),
                }
            }
            // Handled synchronously in `execute`
            Command::ApplyLayout { .. } | Command::ClearMessageAfter { .. } | Command::Quit => {
                Event::Tick
            }
        }
    }

    async fn fetch_sessions(&self) -> Event {
        let sessions = match self.mux.list_sessions(self.exclude.as_deref()).await {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!("Failed to list sessions: {e}");
                return Event::SessionsFailed(e.to_string());
            }
        };

        let statuses = match &self.status_dir {
            Some(dir) => {
                let names: Vec<&str> = sessions.iter().map(|s| s.name.as_str()).collect();
                cleanup_stale(dir, &names);
                read_statuses(dir, names)
            }
            None => HashMap::new(),
        };

        Event::SessionsLoaded { sessions, statuses }
    }
}

/// Interactive picker bound to a terminal
pub struct App {
    picker: Picker,
    executor: Executor,
    rx: UnboundedReceiver<Event>,
}

impl App {
    pub fn new(
        config: &Config,
        mux: Arc<dyn Multiplexer>,
        exclude: Option<String>,
        working_dir: PathBuf,
    ) -> Self {
        let layout = LayoutRunner::new(config.layout.as_deref(), &config.layout_dir);

        let mut options = PickerOptions::new(working_dir);
        options.apply_layout = layout.is_enabled();
        options.keep_expansion_on_refresh = config.keep_expansion_on_refresh;
        options.keys = config.keys.clone();

        let status_dir = config
            .claude_status_enabled
            .then(|| config.cache_dir.clone());

        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            picker: Picker::new(options),
            executor: Executor::new(mux, layout, exclude, status_dir, tx),
            rx,
        }
    }

    /// Run the picker until it quits
    pub async fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let _guard = TermGuard;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        self.event_loop(&mut terminal).await
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        let mut input = EventStream::new();
        let mut tick = tokio::time::interval(TICK_RATE);

        if self.dispatch(self.picker.init()).is_break() {
            return Ok(());
        }

        loop {
            terminal.draw(|f| super::render::draw(f, &self.picker))?;

            let event = tokio::select! {
                maybe = input.next() => match maybe {
                    Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        Event::Key(key.code, key.modifiers)
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                Some(event) = self.rx.recv() => event,
                _ = tick.tick() => Event::Tick,
            };

            let commands = self.picker.handle(event);
            if self.dispatch(commands).is_break() {
                break;
            }
        }

        Ok(())
    }

    fn dispatch(&self, commands: Vec<Command>) -> ControlFlow<()> {
        for command in commands {
            self.executor.execute(command)?;
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;
    use crate::picker::SwitchReason;
    use crate::tmux::{Session, Window};

    #[derive(Default)]
    struct FakeMux {
        calls: Mutex<Vec<String>>,
        fail_switch: bool,
    }

    impl FakeMux {
        fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    #[async_trait]
    impl Multiplexer for FakeMux {
        async fn list_sessions(&self, exclude: Option<&str>) -> Result<Vec<Session>> {
            self.record(format!("list-sessions {exclude:?}"));
            Ok(["alpha", "beta", "current"]
                .into_iter()
                .filter(|n| exclude != Some(*n))
                .map(|n| Session::new(n, Utc::now()))
                .collect())
        }

        async fn list_windows(&self, session: &str) -> Result<Vec<Window>> {
            self.record(format!("list-windows {session}"));
            Ok(vec![Window::new(1, "edit")])
        }

        async fn switch_client(&self, target: &str) -> Result<()> {
            self.record(format!("switch {target}"));
            if self.fail_switch {
                return Err(crate::Error::tmux("no current client"));
            }
            Ok(())
        }

        async fn kill_session(&self, name: &str) -> Result<()> {
            self.record(format!("kill-session {name}"));
            Ok(())
        }

        async fn kill_window(&self, session: &str, index: u32) -> Result<()> {
            self.record(format!("kill-window {session}:{index}"));
            Ok(())
        }

        async fn create_session(&self, name: &str, working_dir: &Path) -> Result<()> {
            self.record(format!("new-session {name} {}", working_dir.display()));
            Ok(())
        }
    }

    fn executor(
        mux: Arc<FakeMux>,
        status_dir: Option<PathBuf>,
    ) -> (Executor, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let exec = Executor::new(
            mux,
            LayoutRunner::disabled(),
            Some("current".to_string()),
            status_dir,
            tx,
        );
        (exec, rx)
    }

    #[tokio::test]
    async fn test_fetch_sessions_excludes_current_and_reads_statuses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("beta.status"), "waiting:100").unwrap();
        std::fs::write(dir.path().join("stale.status"), "new:1").unwrap();

        let mux = Arc::new(FakeMux::default());
        let (exec, mut rx) = executor(mux.clone(), Some(dir.path().to_path_buf()));

        assert!(exec.execute(Command::FetchSessions).is_continue());
        let Some(Event::SessionsLoaded { sessions, statuses }) = rx.recv().await else {
            panic!("expected sessions");
        };
        let names: Vec<&str> = sessions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(statuses["beta"].state, "waiting");
        assert!(!dir.path().join("stale.status").exists());
    }

    #[tokio::test]
    async fn test_switch_failure_comes_back_as_event() {
        let mux = Arc::new(FakeMux {
            fail_switch: true,
            ..Default::default()
        });
        let (exec, mut rx) = executor(mux.clone(), None);

        let target = Target::Window {
            session: "alpha".into(),
            index: 2,
        };
        exec.execute(Command::SwitchTo {
            target: target.clone(),
            reason: SwitchReason::Select,
        });

        match rx.recv().await {
            Some(Event::Switched {
                target: t,
                reason: SwitchReason::Select,
                result: Err(e),
            }) => {
                assert_eq!(t, target);
                assert!(e.contains("no current client"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        let calls = mux.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["switch alpha:2"]);
    }

    #[tokio::test]
    async fn test_kill_and_create_reach_the_mux() {
        let mux = Arc::new(FakeMux::default());
        let (exec, mut rx) = executor(mux.clone(), None);

        exec.execute(Command::Kill(Target::Window {
            session: "alpha".into(),
            index: 3,
        }));
        assert!(matches!(
            rx.recv().await,
            Some(Event::Killed { result: Ok(()), .. })
        ));

        exec.execute(Command::CreateSession {
            name: "proj".into(),
            working_dir: PathBuf::from("/tmp"),
        });
        assert!(matches!(
            rx.recv().await,
            Some(Event::Created { result: Ok(()), .. })
        ));

        let calls = mux.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["kill-window alpha:3", "new-session proj /tmp"]);
    }

    #[tokio::test]
    async fn test_quit_and_detached_commands() {
        let mux = Arc::new(FakeMux::default());
        let (exec, mut rx) = executor(mux, None);

        assert!(exec.execute(Command::Quit).is_break());
        assert!(exec
            .execute(Command::ApplyLayout {
                session: "proj".into(),
                working_dir: PathBuf::from("/tmp"),
            })
            .is_continue());

        exec.execute(Command::ClearMessageAfter {
            generation: 7,
            delay: Duration::from_millis(10),
        });
        assert_eq!(rx.recv().await, Some(Event::ClearMessage { generation: 7 }));
    }

    #[tokio::test]
    async fn test_picker_round_trip_through_executor() {
        let mux = Arc::new(FakeMux::default());
        let (exec, mut rx) = executor(mux, None);
        let mut picker = Picker::new(PickerOptions::new("/work"));

        for command in picker.init() {
            exec.execute(command);
        }
        let event = rx.recv().await.unwrap();
        assert!(picker.handle(event).is_empty());

        for command in picker.expand() {
            exec.execute(command);
        }
        let event = rx.recv().await.unwrap();
        picker.handle(event);
        assert_eq!(picker.rows().len(), 3);

        let commands = picker.handle(Event::key(crossterm::event::KeyCode::Char('1')));
        for command in commands {
            exec.execute(command);
        }
        let event = rx.recv().await.unwrap();
        assert_eq!(picker.handle(event), vec![Command::Quit]);
    }
}
