//! Header cache for offline display.
//!
//! This module maps envelopes to JSON documents and back, and keeps those
//! documents in a [`CacheStore`]. The document shape is fixed:
//!
//! ```text
//! {
//!     "sender": [ { "name": "...", "email": "..." }, ... ],
//!     "from": [ ... ],
//!     "to": [ ... ],
//!     "cc": [ ... ],
//!     "bcc": [ ... ],
//!     "reply_to": [ ... ],
//!     "subject": "...",
//!     "date": "...",
//!     "parent_id": "...",
//!     "message_id": "..."
//! }
//! ```
//!
//! Documents are UTF-8, indented with tabs. Every key is optional when
//! reading; a missing list is empty and a missing string is `""`. The
//! sequence number of an envelope is not stored.

mod codec;
mod repository;
mod store;

pub use codec::{decode_envelope, encode_envelope, envelope_from_value, envelope_to_value};
pub use repository::HeaderCache;
pub use store::{CacheStore, DirectoryStore, MemoryStore};
