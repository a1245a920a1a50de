//! # jamail-core
//!
//! Persistence for jamail: the header cache.
//!
//! Envelopes fetched by the IMAP session are stored as small JSON
//! documents, one per message, grouped by server. On the next start the
//! host replays them before the network is touched.
//!
//! ```
//! use jamail_core::cache::{HeaderCache, MemoryStore};
//! use jamail_imap::Envelope;
//!
//! let mut cache = HeaderCache::new(MemoryStore::new());
//! let envelope = Envelope {
//!     subject: "Ω".to_string(),
//!     ..Envelope::default()
//! };
//! cache.store_envelope("imap.example.com", "<m1@example.com>", &envelope).unwrap();
//!
//! let loaded = cache.load_all("imap.example.com").unwrap();
//! assert_eq!(loaded, vec![envelope]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod cache;
mod error;

pub use cache::{CacheStore, DirectoryStore, HeaderCache, MemoryStore};
pub use error::{Error, Result};
