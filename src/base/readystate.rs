use std::fmt;

/// The readiness level reported by a transport.
/// This matches the XMLHttpRequest `readyState` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    /// The transport has been created but not opened.
    #[default]
    Unsent,

    /// `open` has been called.
    Opened,

    /// The response status line and headers are available.
    HeadersReceived,

    /// The response body is being received.
    Loading,

    /// The exchange is complete (successfully or not).
    Done,
}

impl ReadyState {
    /// The raw numeric level.
    pub fn as_u8(self) -> u8 {
        match self {
            ReadyState::Unsent => 0,
            ReadyState::Opened => 1,
            ReadyState::HeadersReceived => 2,
            ReadyState::Loading => 3,
            ReadyState::Done => 4,
        }
    }

    /// Whether this is the terminal level.
    pub fn is_terminal(self) -> bool {
        self == ReadyState::Done
    }
}

impl TryFrom<u8> for ReadyState {
    type Error = u8;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(ReadyState::Unsent),
            1 => Ok(ReadyState::Opened),
            2 => Ok(ReadyState::HeadersReceived),
            3 => Ok(ReadyState::Loading),
            4 => Ok(ReadyState::Done),
            other => Err(other),
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
