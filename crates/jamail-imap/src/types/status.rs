//! Response status keywords.

use std::fmt;

/// Status keyword of a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Parses a status keyword, ignoring case.
    #[must_use]
    pub fn parse(word: &[u8]) -> Option<Self> {
        let status = if word.eq_ignore_ascii_case(b"OK") {
            Self::Ok
        } else if word.eq_ignore_ascii_case(b"NO") {
            Self::No
        } else if word.eq_ignore_ascii_case(b"BAD") {
            Self::Bad
        } else if word.eq_ignore_ascii_case(b"PREAUTH") {
            Self::PreAuth
        } else if word.eq_ignore_ascii_case(b"BYE") {
            Self::Bye
        } else {
            return None;
        };
        Some(status)
    }

    /// Returns true for `OK`.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        })
    }
}
