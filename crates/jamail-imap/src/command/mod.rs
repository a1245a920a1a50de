//! IMAP command builder.
//!
//! The session issues four commands, strictly one at a time.

mod serialize;
mod tag_generator;

use std::fmt;

pub use tag_generator::TagGenerator;

use serialize::write_astring;

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// `FETCH 1:* full`: envelopes of every message.
    FetchList,
    /// `FETCH <id> BODY[TEXT]`: body text of one message.
    FetchBody {
        /// Message sequence number.
        id: u32,
    },
}

impl Command {
    /// Serializes the command with the given tag, CRLF included.
    #[must_use]
    pub fn serialize(&self, tag: u32) -> Vec<u8> {
        let mut buf = format!("{tag} ").into_bytes();

        match self {
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_astring(&mut buf, mailbox);
            }
            Self::FetchList => buf.extend_from_slice(b"FETCH 1:* full"),
            Self::FetchBody { id } => {
                buf.extend_from_slice(format!("FETCH {id} BODY[TEXT]").as_bytes());
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns the command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::FetchList | Self::FetchBody { .. } => "FETCH",
        }
    }
}

// Keeps the password out of logs.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { username, .. } => write!(f, "LOGIN {username} ****"),
            Self::Select { mailbox } => write!(f, "SELECT {mailbox}"),
            Self::FetchList => f.write_str("FETCH 1:* full"),
            Self::FetchBody { id } => write!(f, "FETCH {id} BODY[TEXT]"),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command({self})")
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
    fn test_login() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(cmd.serialize(1), b"1 LOGIN user pass\r\n");
    }

    #[test]
    fn test_login_quotes_password() {
        let cmd = Command::Login {
            username: "me@example.com".to_string(),
            password: "p\"w d".to_string(),
        };
        assert_eq!(cmd.serialize(1), b"1 LOGIN me@example.com \"p\\\"w d\"\r\n");
    }

    #[test]
    fn test_select() {
        let cmd = Command::Select {
            mailbox: "INBOX".to_string(),
        };
        assert_eq!(cmd.serialize(2), b"2 SELECT INBOX\r\n");
    }

    #[test]
    fn test_fetch_list() {
        assert_eq!(Command::FetchList.serialize(3), b"3 FETCH 1:* full\r\n");
    }

    #[test]
    fn test_fetch_body() {
        assert_eq!(
            Command::FetchBody { id: 42 }.serialize(17),
            b"17 FETCH 42 BODY[TEXT]\r\n"
        );
    }

    #[test]
    fn test_display_hides_password() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        assert_eq!(cmd.to_string(), "LOGIN user ****");
        assert!(!format!("{cmd:?}").contains("hunter2"));
        assert_eq!(cmd.name(), "LOGIN");
    }
}
