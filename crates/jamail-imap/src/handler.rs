//! Session callbacks.
//!
//! The session reports what it fetched through a [`SessionHandler`]. Every
//! callback gets the account the session runs for, so one handler can
//! serve several sessions.
//!
//! # Example
//!
//! ```
//! use jamail_imap::handler::SessionHandler;
//! use jamail_imap::types::{Account, Envelope};
//!
//! struct Inbox {
//!     subjects: Vec<String>,
//! }
//!
//! impl SessionHandler for Inbox {
//!     fn on_envelope(&mut self, _account: &Account, envelope: &Envelope) {
//!         self.subjects.push(envelope.subject.clone());
//!     }
//! }
//! ```

use crate::types::{Account, Envelope};

/// Receiver for session results.
pub trait SessionHandler {
    /// Called for each envelope of the message list.
    fn on_envelope(&mut self, account: &Account, envelope: &Envelope) {
        let _ = (account, envelope);
    }

    /// Called with the raw body text of a message requested through
    /// `fetch_message`.
    fn on_body(&mut self, account: &Account, id: u32, body: &[u8]) {
        let _ = (account, id, body);
    }

    /// Called when the server announces it is closing the connection.
    fn on_bye(&mut self, account: &Account, text: &str) {
        let _ = (account, text);
    }
}

/// A handler that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl SessionHandler for NoopHandler {}

/// A handler that logs results using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl SessionHandler for LoggingHandler {
    fn on_envelope(&mut self, account: &Account, envelope: &Envelope) {
        tracing::info!(
            server = %account.server,
            id = envelope.id,
            subject = %envelope.subject,
            "envelope"
        );
    }

    fn on_body(&mut self, account: &Account, id: u32, body: &[u8]) {
        tracing::info!(server = %account.server, id, len = body.len(), "body");
    }

    fn on_bye(&mut self, account: &Account, text: &str) {
        tracing::info!(server = %account.server, text, "BYE");
    }
}

/// A handler that collects events for later processing.
///
/// Useful for testing.
#[derive(Debug, Default, Clone)]
pub struct CollectingHandler {
    /// Collected events.
    pub events: Vec<SessionEvent>,
}

impl CollectingHandler {
    /// Creates a new collecting handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all collected events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Takes all collected events, leaving the handler empty.
    pub fn take(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

impl SessionHandler for CollectingHandler {
    fn on_envelope(&mut self, _account: &Account, envelope: &Envelope) {
        self.events.push(SessionEvent::Envelope(envelope.clone()));
    }

    fn on_body(&mut self, _account: &Account, id: u32, body: &[u8]) {
        self.events.push(SessionEvent::Body(id, body.to_vec()));
    }

    fn on_bye(&mut self, _account: &Account, text: &str) {
        self.events.push(SessionEvent::Bye(text.to_string()));
    }
}

/// An event collected by [`CollectingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An envelope from the message list.
    Envelope(Envelope),
    /// A message body.
    Body(u32, Vec<u8>),
    /// A BYE from the server.
    Bye(String),
}
