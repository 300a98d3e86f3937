/// Tooltip shown when no alert is active.
pub const BASELINE_TOOLTIP: &str = "Irssi Icon";

/// Alert currently shown by the tray icon.
///
/// A whisper masks any later plain-message alert: once in `Whisper`, only an
/// explicit clear (or the user clicking the icon) resets the state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlertState {
    #[default]
    Idle,
    NewMessage {
        tooltip: String,
    },
    Whisper {
        tooltip: String,
    },
}

impl AlertState {
    /// Returns whether the state (and thus icon/tooltip) changed.
    pub fn on_new_message(&mut self, info: &str) -> bool {
        match self {
            // whisper priority holds until cleared
            AlertState::Whisper { .. } => false,
            _ => {
                *self = AlertState::NewMessage { tooltip: format!("{}\nNew message in {}", BASELINE_TOOLTIP, info) };
                true
            }
        }
    }

    pub fn on_new_whisper(&mut self, info: &str) -> bool {
        *self = AlertState::Whisper { tooltip: format!("{}\nWhisper from {}", BASELINE_TOOLTIP, info) };
        true
    }

    pub fn on_clear(&mut self) -> bool {
        if *self == AlertState::Idle {
            false
        } else {
            *self = AlertState::Idle;
            true
        }
    }

    pub fn tooltip(&self) -> &str {
        match self {
            AlertState::Idle => BASELINE_TOOLTIP,
            AlertState::NewMessage { tooltip } | AlertState::Whisper { tooltip } => tooltip,
        }
    }

    /// Icon theme name the UI layer should display for this state.
    pub fn icon_name(&self) -> &'static str {
        match self {
            AlertState::Idle => "irssi-icon",
            AlertState::NewMessage { .. } => "irssi-icon-new",
            AlertState::Whisper { .. } => "irssi-icon-important",
        }
    }
}
