use super::input::TextInput;
use super::Target;

/// Interaction mode, each variant carrying only its own state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    /// Waiting for the user to confirm killing `target`
    ConfirmKill { target: Target },
    /// Typing the name of a new session
    Create { input: TextInput },
}

impl Mode {
    pub fn is_normal(&self) -> bool {
        matches!(self, Mode::Normal)
    }

    pub fn kill_target(&self) -> Option<&Target> {
        match self {
            Mode::ConfirmKill { target } => Some(target),
            _ => None,
        }
    }

    pub fn create_input(&self) -> Option<&TextInput> {
        match self {
            Mode::Create { input } => Some(input),
            _ => None,
        }
    }

    /// Prompt shown while confirming a kill
    pub fn confirm_prompt(&self) -> Option<String> {
        match self.kill_target()? {
            Target::Session(name) => Some(format!("Kill \"{name}\"?")),
            target @ Target::Window { .. } => Some(format!("Kill window \"{target}\"?")),
        }
    }
}
