use thiserror::Error;

/// Protocol version tag carried by every frame. The irssi plugin and the
/// daemon must agree on it; a frame with a different tag is rejected.
pub const WIRE_VERSION: &str = "1.4";

/// The closed set of commands the irssi plugin may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NewMsg,
    NewWhisper,
    Clear,
}

impl Command {
    fn from_wire(word: &str) -> Option<Self> {
        match word {
            "NEWMSG" => Some(Command::NewMsg),
            "NEWWHISPER" => Some(Command::NewWhisper),
            "CLEAR" => Some(Command::Clear),
            _ => None,
        }
    }

    fn as_wire(&self) -> &'static str {
        match self {
            Command::NewMsg => "NEWMSG",
            Command::NewWhisper => "NEWWHISPER",
            Command::Clear => "CLEAR",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("peer sent no data")]
    Empty,
    #[error("frame header does not match the `version:COMMAND> info` shape")]
    Malformed,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("protocol version mismatch: got {got:?}, expected {expected:?}")]
    VersionMismatch { got: String, expected: String },
}

/// One complete command message, as read from a single connection.
///
/// Wire shape: `"{version}:{COMMAND}> {info}\r\n{data}"`, where `data` is
/// optional and a frame without it is just the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub command: Command,
    pub info: String,
    pub data: Option<String>,
}

impl CommandFrame {
    pub fn clear() -> Self {
        CommandFrame { command: Command::Clear, info: String::new(), data: None }
    }

    /// Parse a raw frame against the version the daemon is running.
    ///
    /// Never panics; any input that does not match the frame shape comes back
    /// as an explicit [`FrameError`] so the accept loop can drop the
    /// connection without surfacing anything to the peer.
    pub fn parse(raw: &str, expected_version: &str) -> Result<Self, FrameError> {
        if raw.is_empty() {
            return Err(FrameError::Empty);
        }
        let (header, data) = match raw.split_once("\r\n") {
            Some((header, rest)) if !rest.is_empty() => (header, Some(rest.to_owned())),
            Some((header, _)) => (header, None),
            None => (raw, None),
        };
        let (version, rest) = header.split_once(':').ok_or(FrameError::Malformed)?;
        let (word, info) = rest.split_once("> ").ok_or(FrameError::Malformed)?;
        if version != expected_version {
            return Err(FrameError::VersionMismatch {
                got: version.to_owned(),
                expected: expected_version.to_owned(),
            });
        }
        let command = Command::from_wire(word).ok_or_else(|| FrameError::UnknownCommand(word.to_owned()))?;
        Ok(CommandFrame { command, info: info.trim().to_owned(), data })
    }

    /// Canonical wire encoding of this frame.
    pub fn encode(&self, version: &str) -> String {
        let mut out = format!("{}:{}> {}", version, self.command.as_wire(), self.info);
        if let Some(data) = &self.data {
            out.push_str("\r\n");
            out.push_str(data);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_new_message_frame_with_data() {
        let frame = CommandFrame::parse("1.4:NEWMSG> #general\r\nNew message in #general", "1.4").unwrap();
        assert_eq!(
            frame,
            CommandFrame {
                command: Command::NewMsg,
                info: "#general".to_owned(),
                data: Some("New message in #general".to_owned()),
            }
        );
    }

    #[test]
    fn parses_whisper_frame() {
        let frame = CommandFrame::parse("1.4:NEWWHISPER> alice\r\nhello there", "1.4").unwrap();
        assert_eq!(frame.command, Command::NewWhisper);
        assert_eq!(frame.info, "alice");
        assert_eq!(frame.data.as_deref(), Some("hello there"));
    }

    #[test]
    fn parses_clear_frame_with_empty_info() {
        let frame = CommandFrame::parse("1.4:CLEAR> ", "1.4").unwrap();
        assert_eq!(frame, CommandFrame::clear());
    }

    #[test]
    fn header_only_frame_has_no_data() {
        let frame = CommandFrame::parse("1.4:NEWMSG> #rust", "1.4").unwrap();
        assert_eq!(frame.info, "#rust");
        assert_eq!(frame.data, None);
    }

    #[test]
    fn trailing_line_break_is_not_data() {
        let frame = CommandFrame::parse("1.4:CLEAR> \r\n", "1.4").unwrap();
        assert_eq!(frame.data, None);
    }

    #[test]
    fn rejects_version_mismatch() {
        let err = CommandFrame::parse("1.3:CLEAR> ", "1.4").unwrap_err();
        assert_eq!(err, FrameError::VersionMismatch { got: "1.3".to_owned(), expected: "1.4".to_owned() });
    }

    #[test]
    fn rejects_unknown_command() {
        let err = CommandFrame::parse("1.4:NEWMAIL> inbox", "1.4").unwrap_err();
        assert_eq!(err, FrameError::UnknownCommand("NEWMAIL".to_owned()));
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        assert_eq!(CommandFrame::parse("", "1.4"), Err(FrameError::Empty));
        assert_eq!(CommandFrame::parse("CLEAR", "1.4"), Err(FrameError::Malformed));
        assert_eq!(CommandFrame::parse("1.4:CLEAR", "1.4"), Err(FrameError::Malformed));
    }

    #[test]
    fn encodes_canonical_shape() {
        let frame = CommandFrame {
            command: Command::NewWhisper,
            info: "alice".to_owned(),
            data: Some("hello there".to_owned()),
        };
        assert_eq!(frame.encode("1.4"), "1.4:NEWWHISPER> alice\r\nhello there");
        assert_eq!(CommandFrame::clear().encode("1.4"), "1.4:CLEAR> ");
    }

    #[test]
    fn encoded_frames_parse_back() {
        let frame = CommandFrame { command: Command::NewMsg, info: "#general".to_owned(), data: None };
        assert_eq!(CommandFrame::parse(&frame.encode(WIRE_VERSION), WIRE_VERSION).unwrap(), frame);
    }
}
