// Tapkeys xdotool Output
// Delivers actions by running xdotool (X11)

use std::path::PathBuf;
use std::process::Command;

use super::dispatcher::{DispatchError, Dispatcher};
use crate::action::OutputAction;

/// Dispatcher that shells out to `xdotool` for every action
#[derive(Debug, Clone)]
pub struct XdotoolDispatcher {
    program: PathBuf,
}

impl Default for XdotoolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl XdotoolDispatcher {
    pub fn new() -> Self {
        Self::with_program("xdotool")
    }

    /// Use a different executable (must accept xdotool's arguments)
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// xdotool arguments for an action
    pub fn command_args(action: &OutputAction) -> Vec<String> {
        match action {
            OutputAction::Hold(kind) => vec!["keydown".into(), kind.name().into()],
            OutputAction::Release(kind) => vec!["keyup".into(), kind.name().into()],
            OutputAction::Type(text) => vec!["type".into(), "--".into(), text.clone()],
            OutputAction::Press(name) => vec!["key".into(), name.clone()],
        }
    }
}

impl Dispatcher for XdotoolDispatcher {
    fn dispatch(&mut self, action: &OutputAction) -> Result<(), DispatchError> {
        let args = Self::command_args(action);
        let command = format!("{} {}", self.program.display(), args.join(" "));
        log::trace!("running {}", command);

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|source| DispatchError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(DispatchError::CommandFailed { command, status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierKind;

    #[test]
    fn test_command_args() {
        assert_eq!(
            XdotoolDispatcher::command_args(&OutputAction::Hold(ModifierKind::Ctrl)),
            vec!["keydown", "ctrl"]
        );
        assert_eq!(
            XdotoolDispatcher::command_args(&OutputAction::Release(ModifierKind::Super)),
            vec!["keyup", "super"]
        );
        assert_eq!(
            XdotoolDispatcher::command_args(&OutputAction::type_text("-")),
            vec!["type", "--", "-"]
        );
        assert_eq!(
            XdotoolDispatcher::command_args(&OutputAction::press("Caps_Lock")),
            vec!["key", "Caps_Lock"]
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_exit_status_is_reported() {
        let mut ok = XdotoolDispatcher::with_program("true");
        assert!(ok.dispatch(&OutputAction::press("enter")).is_ok());

        let mut failing = XdotoolDispatcher::with_program("false");
        assert!(matches!(
            failing.dispatch(&OutputAction::press("enter")),
            Err(DispatchError::CommandFailed { .. })
        ));
    }

    #[test]
    fn test_missing_program() {
        let mut missing = XdotoolDispatcher::with_program("/nonexistent/xdotool");
        assert!(matches!(
            missing.dispatch(&OutputAction::press("enter")),
            Err(DispatchError::Spawn { .. })
        ));
    }
}
