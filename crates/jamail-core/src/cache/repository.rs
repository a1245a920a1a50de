//! Header cache operations.

use jamail_imap::Envelope;
use tracing::{debug, warn};

use super::codec::{decode_envelope, encode_envelope};
use super::store::CacheStore;
use crate::Result;

/// Persists envelopes per server, one JSON document per message.
#[derive(Debug, Clone, Default)]
pub struct HeaderCache<S> {
    store: S,
}

impl<S: CacheStore> HeaderCache<S> {
    /// Creates a cache over a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the cache, returning the store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Stores an envelope under `(server_id, msg_id)`, replacing any
    /// previous entry. The envelope's session id is not stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unusable or the write fails.
    pub fn store_envelope(&mut self, server_id: &str, msg_id: &str, envelope: &Envelope) -> Result<()> {
        let bytes = encode_envelope(envelope)?;
        self.store.put(server_id, msg_id, &bytes)?;
        debug!(server_id, msg_id, len = bytes.len(), "cached envelope");
        Ok(())
    }

    /// Loads one cached envelope.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] for an unknown key, or a decode
    /// error for a damaged entry.
    pub fn load(&self, server_id: &str, msg_id: &str) -> Result<Envelope> {
        decode_envelope(&self.store.get(server_id, msg_id)?)
    }

    /// Loads every cached envelope of a server, ordered by message id.
    ///
    /// Entries that cannot be read or decoded are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be listed.
    pub fn load_all(&self, server_id: &str) -> Result<Vec<Envelope>> {
        let ids = self.store.list(server_id)?;
        let mut envelopes = Vec::with_capacity(ids.len());
        for msg_id in ids {
            match self.load(server_id, &msg_id) {
                Ok(envelope) => envelopes.push(envelope),
                Err(e) => warn!(server_id, %msg_id, error = %e, "skipping cache entry"),
            }
        }
        Ok(envelopes)
    }
}
