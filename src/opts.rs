use clap::Parser;

use crate::ipc_server::{Endpoint, DEFAULT_SOCKET_FILE};

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq, Eq)]
pub struct Opt {
    pub log_debug: bool,
    pub endpoint: Endpoint,
    pub action: Action,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Run the notification daemon.
    Daemon { foreground: bool },
    /// Signal a running daemon to clear its alert, then exit.
    SendClear,
}

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(name = "irssi-icon", version, about = "Tray-icon notification daemon for irssi.")]
struct RawOpt {
    /// Write out debug logs.
    #[arg(long = "debug")]
    log_debug: bool,

    /// Run this application in the foreground, do not daemonize.
    #[arg(short, long)]
    foreground: bool,

    /// Signal a clear event to a running daemon.
    #[arg(long)]
    clear: bool,

    /// Communicate with the irssi plugin on FILE instead of the loopback port.
    #[arg(long = "socket-file", value_name = "FILE", num_args = 0..=1, default_missing_value = DEFAULT_SOCKET_FILE)]
    socket_file: Option<std::path::PathBuf>,
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { log_debug, foreground, clear, socket_file } = other;
        let endpoint = match socket_file {
            Some(path) => Endpoint::Unix(path),
            None => Endpoint::default(),
        };
        let action = if clear { Action::SendClear } else { Action::Daemon { foreground } };
        Opt { log_debug, endpoint, action }
    }
}
