// Tapkeys Dispatcher Interface
// OS-facing boundary that executes output actions

use std::io;
use std::process::ExitStatus;

use crate::action::OutputAction;

/// Errors raised while delivering an action to the OS
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{command} exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("invalid Unicode codepoint: 0x{0:X}")]
    InvalidCodepoint(u32),

    #[error("device error: {0}")]
    Device(String),
}

/// Executes output actions.
///
/// The translator never inspects results beyond logging failures.
pub trait Dispatcher: Send {
    fn dispatch(&mut self, action: &OutputAction) -> Result<(), DispatchError>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn dispatch(&mut self, action: &OutputAction) -> Result<(), DispatchError> {
        (**self).dispatch(action)
    }
}

/// Records every action, for tests and inspection
#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    actions: Vec<OutputAction>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions recorded so far
    pub fn actions(&self) -> &[OutputAction] {
        &self.actions
    }

    /// Drain the recorded actions
    pub fn take(&mut self) -> Vec<OutputAction> {
        std::mem::take(&mut self.actions)
    }
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&mut self, action: &OutputAction) -> Result<(), DispatchError> {
        self.actions.push(action.clone());
        Ok(())
    }
}

/// Logs actions instead of executing them (dry run)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    fn dispatch(&mut self, action: &OutputAction) -> Result<(), DispatchError> {
        log::info!("{}", action);
        Ok(())
    }
}
