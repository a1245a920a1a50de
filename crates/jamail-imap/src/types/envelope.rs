//! Message envelope.

/// An address from an envelope address list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// Display name.
    pub name: String,
    /// `mailbox@host` as delivered by the server.
    pub email: String,
}

impl Address {
    /// Creates an address.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Structured header summary of a message.
///
/// Address lists keep the order the server sent them in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Message sequence number in the selected mailbox; 0 when unknown.
    pub id: u32,
    /// Date header.
    pub date: String,
    /// Subject header.
    pub subject: String,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub parent_id: String,
    /// Message-ID header.
    pub message_id: String,
}
