//! Core IMAP types.
//!
//! The data the session hands to its consumer ([`Envelope`], [`Address`]),
//! the account it logs in with, and the completion status of tagged replies.

mod account;
mod envelope;
mod status;

pub use account::Account;
pub use envelope::{Address, Envelope};
pub use status::Status;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(Status::parse(b"OK"), Some(Status::Ok));
        assert_eq!(Status::parse(b"no"), Some(Status::No));
        assert_eq!(Status::parse(b"BAD"), Some(Status::Bad));
        assert_eq!(Status::parse(b"BYE"), Some(Status::Bye));
        assert_eq!(Status::parse(b"PREAUTH"), Some(Status::PreAuth));
        assert_eq!(Status::parse(b"FETCH"), None);
    }

    #[test]
    fn test_status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
    }

    #[test]
    fn test_account_debug_hides_password() {
        let account = Account::new("imap.example.com", "ann", "hunter2");
        let debug = format!("{account:?}");
        assert!(debug.contains("imap.example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_default_envelope_is_empty() {
        let env = Envelope::default();
        assert_eq!(env.id, 0);
        assert!(env.subject.is_empty());
        assert!(env.from.is_empty());
    }
}
