//! Session states.

use std::fmt;

/// Where the session is in its command sequence.
///
/// ```text
/// Idle --connect--> Connecting --greeting--> Login --OK--> Select --OK--> FetchList
///   ^                                                                        |
///   +------------------------------- OK -------------------------------------+
///   |
///   +--fetch_message--> FetchBody --OK--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Socket handed to the event loop; waiting for the greeting.
    Connecting,
    /// LOGIN sent.
    Login,
    /// SELECT sent.
    Select,
    /// Envelope FETCH sent.
    FetchList,
    /// Body FETCH sent.
    FetchBody,
}

impl SessionState {
    /// Returns the name of the command awaiting its tagged reply, if any.
    #[must_use]
    pub const fn pending_command(self) -> Option<&'static str> {
        match self {
            Self::Idle | Self::Connecting => None,
            Self::Login => Some("LOGIN"),
            Self::Select => Some("SELECT"),
            Self::FetchList | Self::FetchBody => Some("FETCH"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Login => "login",
            Self::Select => "select",
            Self::FetchList => "fetch-list",
            Self::FetchBody => "fetch-body",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        assert_eq!(SessionState::default(), SessionState::Idle);
    }

    #[test]
    fn test_pending_command() {
        assert_eq!(SessionState::Idle.pending_command(), None);
        assert_eq!(SessionState::Connecting.pending_command(), None);
        assert_eq!(SessionState::Login.pending_command(), Some("LOGIN"));
        assert_eq!(SessionState::FetchBody.pending_command(), Some("FETCH"));
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::FetchList.to_string(), "fetch-list");
    }
}
