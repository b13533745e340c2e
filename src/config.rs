use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyModifiers};
use serde::Deserialize;
use tokio::fs;

use crate::error::{Error, Result};

const DEFAULT_CONFIG: &str = r#"# tsm configuration
# Environment variables override these settings

# Layout script name to apply when creating new sessions
# layout = "ide"

# Directory containing layout scripts
# layout_dir = "~/.config/tmux/layouts"

# Enable Claude Code status integration
# claude_status_enabled = false

# Directory for status cache files and the log file
# cache_dir = "~/.cache/tsm"

# Keep expanded sessions and loaded windows across refreshes
# keep_expansion_on_refresh = true

# Key overrides: action = "key" or ["key", ...]
# Actions: quit, cancel, up, down, expand, collapse, select, kill, create, confirm
# [keybindings]
# kill = "ctrl+d"
# up = ["up", "ctrl+k"]
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    layout: Option<String>,
    layout_dir: Option<String>,
    claude_status_enabled: Option<bool>,
    cache_dir: Option<String>,
    keep_expansion_on_refresh: Option<bool>,
    keybindings: HashMap<String, OneOrMany>,
}

/// Resolved configuration: defaults, then file, then environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub layout: Option<String>,
    pub layout_dir: PathBuf,
    pub claude_status_enabled: bool,
    pub cache_dir: PathBuf,
    pub keep_expansion_on_refresh: bool,
    pub keys: KeyBindings,
}

impl Config {
    pub fn defaults(home: &Path) -> Self {
        Self {
            layout: None,
            layout_dir: home.join(".config").join("tmux").join("layouts"),
            claude_status_enabled: false,
            cache_dir: home.join(".cache").join("tsm"),
            keep_expansion_on_refresh: true,
            keys: KeyBindings::default(),
        }
    }

    pub fn home_dir() -> Result<PathBuf> {
        dirs::home_dir().ok_or_else(|| Error::config("Cannot determine home directory"))
    }

    /// Path to the config file
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join(".config").join("tsm").join("config.toml"))
    }

    pub async fn load() -> Result<Self> {
        let home = Self::home_dir()?;
        let mut cfg = Self::load_from(&Self::path()?, &home).await?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load `path` over the defaults. A missing file is not an error.
    pub async fn load_from(path: &Path, home: &Path) -> Result<Self> {
        let mut cfg = Self::defaults(home);

        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(cfg),
            Err(e) => return Err(e.into()),
        };
        let file: ConfigFile = toml::from_str(&content)?;

        if let Some(layout) = file.layout.filter(|l| !l.trim().is_empty()) {
            cfg.layout = Some(layout);
        }
        if let Some(dir) = file.layout_dir {
            cfg.layout_dir = expand_path(&dir, home);
        }
        if let Some(enabled) = file.claude_status_enabled {
            cfg.claude_status_enabled = enabled;
        }
        if let Some(dir) = file.cache_dir {
            cfg.cache_dir = expand_path(&dir, home);
        }
        if let Some(keep) = file.keep_expansion_on_refresh {
            cfg.keep_expansion_on_refresh = keep;
        }
        cfg.keys.apply_overrides(file.keybindings);

        Ok(cfg)
    }

    /// Environment variables override file settings.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let home = Self::home_dir().unwrap_or_default();

        if let Some(layout) = var("TMUX_LAYOUT").filter(|v| !v.is_empty()) {
            self.layout = Some(layout);
        }
        if let Some(dir) = var("TMUX_LAYOUTS_DIR").filter(|v| !v.is_empty()) {
            self.layout_dir = expand_path(&dir, &home);
        }
        if var("TMUX_SESSION_PICKER_CLAUDE_STATUS").as_deref() == Some("1") {
            self.claude_status_enabled = true;
        }
    }

    /// Write a commented default config. Refuses to overwrite an existing file.
    pub async fn init() -> Result<PathBuf> {
        let path = Self::path()?;
        Self::init_at(&path).await?;
        Ok(path)
    }

    pub async fn init_at(path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        if fs::try_exists(path).await? {
            return Err(Error::config(format!(
                "config file already exists at {}",
                path.display()
            )));
        }
        fs::write(path, DEFAULT_CONFIG).await?;
        Ok(())
    }
}

/// Expand a leading `~` to the home directory
fn expand_path(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => home.join(rest.trim_start_matches('/')),
        None => PathBuf::from(path),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// Short label for help lines, e.g. `^x`, `↑`, `enter`
    pub fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::Backspace => "bksp".to_string(),
            KeyCode::Char(' ') => "space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            other => format!("{other:?}").to_lowercase(),
        };
        let mut prefix = String::new();
        if self.modifiers.contains(KeyModifiers::ALT) {
            prefix.push_str("M-");
        }
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            prefix.push('^');
        }
        format!("{prefix}{key}")
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<&'static str, Vec<KeySpec>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut kb = Self {
            bindings: HashMap::new(),
        };

        kb.bindings.insert("quit", vec![KeySpec::ctrl('c')]);
        kb.bindings.insert("cancel", vec![KeySpec::plain(KeyCode::Esc)]);
        kb.bindings.insert(
            "up",
            vec![
                KeySpec::plain(KeyCode::Up),
                KeySpec::ctrl('k'),
                KeySpec::ctrl('p'),
            ],
        );
        kb.bindings.insert(
            "down",
            vec![
                KeySpec::plain(KeyCode::Down),
                KeySpec::ctrl('j'),
                KeySpec::ctrl('n'),
            ],
        );
        kb.bindings.insert(
            "expand",
            vec![KeySpec::plain(KeyCode::Right), KeySpec::ctrl('l')],
        );
        kb.bindings.insert(
            "collapse",
            vec![KeySpec::plain(KeyCode::Left), KeySpec::ctrl('h')],
        );
        kb.bindings
            .insert("select", vec![KeySpec::plain(KeyCode::Enter)]);
        kb.bindings.insert("kill", vec![KeySpec::ctrl('x')]);
        kb.bindings.insert("create", vec![KeySpec::ctrl('o')]);
        kb.bindings.insert(
            "confirm",
            vec![
                KeySpec::plain(KeyCode::Char('y')),
                KeySpec::plain(KeyCode::Char('Y')),
                KeySpec::ctrl('y'),
                KeySpec::plain(KeyCode::Enter),
            ],
        );

        kb
    }
}

impl KeyBindings {
    fn apply_overrides(&mut self, overrides: HashMap<String, OneOrMany>) {
        for (action, spec) in overrides {
            let parsed: Vec<KeySpec> = spec
                .into_vec()
                .iter()
                .filter_map(|s| parse_key_spec(s))
                .collect();
            if parsed.is_empty() {
                tracing::warn!("Ignoring keybinding for {action}: no valid keys");
                continue;
            }
            match self.bindings.get_mut(action.as_str()) {
                Some(slot) => *slot = parsed,
                None => tracing::warn!("Ignoring keybinding for unknown action {action}"),
            }
        }
    }

    pub fn matches(&self, action: &'static str, code: &KeyCode, modifiers: KeyModifiers) -> bool {
        // Terminals disagree on reporting SHIFT for uppercase characters.
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        self.bindings
            .get(action)
            .is_some_and(|v| v.iter().any(|k| &k.code == code && k.modifiers == modifiers))
    }

    /// Label of the first key bound to `action`
    pub fn label(&self, action: &str) -> String {
        self.bindings
            .get(action)
            .and_then(|v| v.first())
            .map(KeySpec::label)
            .unwrap_or_else(|| "?".to_string())
    }
}

fn parse_key_spec(s: &str) -> Option<KeySpec> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let mut modifiers = KeyModifiers::NONE;
    let parts: Vec<&str> = s.split('+').map(|p| p.trim()).collect();
    let (mods, key_part) = if parts.len() >= 2 {
        (&parts[..parts.len() - 1], parts[parts.len() - 1])
    } else {
        (&[][..], parts[0])
    };

    for m in mods {
        match m.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
    }

    let code = match key_part.to_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        _ => {
            // Single-character fallback (keeps case for e.g. "Y")
            let mut chars = key_part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };

    Some(KeySpec { code, modifiers })
}
