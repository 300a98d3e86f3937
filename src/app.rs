use crate::{
    alert::AlertState,
    protocol::{Command, CommandFrame},
};

/// Commands handled by the daemon's main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonCommand {
    NewMessage { info: String },
    NewWhisper { info: String, data: Option<String> },
    Clear,
    KillServer,
}

impl From<CommandFrame> for DaemonCommand {
    fn from(frame: CommandFrame) -> Self {
        match frame.command {
            Command::NewMsg => DaemonCommand::NewMessage { info: frame.info },
            Command::NewWhisper => DaemonCommand::NewWhisper { info: frame.info, data: frame.data },
            Command::Clear => DaemonCommand::Clear,
        }
    }
}

/// Capability notified of parsed commands.
///
/// Implemented by whatever frontend renders the alerts; the daemon ships
/// [`IconState`], which drives the alert state machine and logs the effect.
pub trait NotificationObserver {
    fn on_new_message(&mut self, info: &str);
    fn on_new_whisper(&mut self, info: &str, data: Option<&str>);
    fn on_clear(&mut self);
}

pub struct App<O> {
    pub observer: O,
}

impl<O: NotificationObserver> App<O> {
    /// Dispatch one daemon command to the observer.
    /// Returns `false` once the daemon should shut down.
    pub fn handle_command(&mut self, command: DaemonCommand) -> bool {
        match command {
            DaemonCommand::NewMessage { info } => {
                self.observer.on_new_message(&info);
                true
            }
            DaemonCommand::NewWhisper { info, data } => {
                self.observer.on_new_whisper(&info, data.as_deref());
                true
            }
            DaemonCommand::Clear => {
                self.observer.on_clear();
                true
            }
            DaemonCommand::KillServer => false,
        }
    }
}

/// Default observer: applies events to the alert state machine and logs the
/// resulting icon and tooltip, standing in for the tray-icon frontend.
#[derive(Debug, Default)]
pub struct IconState {
    alert: AlertState,
}

impl IconState {
    fn log_current(&self) {
        log::info!("icon: {}, tooltip: {:?}", self.alert.icon_name(), self.alert.tooltip());
    }
}

impl NotificationObserver for IconState {
    fn on_new_message(&mut self, info: &str) {
        if self.alert.on_new_message(info) {
            self.log_current();
        } else {
            log::debug!("whisper alert active, not downgrading for new message in {}", info);
        }
    }

    fn on_new_whisper(&mut self, info: &str, data: Option<&str>) {
        if let Some(body) = data {
            log::debug!("whisper from {}: {}", info, body);
        }
        self.alert.on_new_whisper(info);
        self.log_current();
    }

    fn on_clear(&mut self) {
        if self.alert.on_clear() {
            self.log_current();
        }
    }
}
