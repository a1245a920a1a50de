//! Byte placement for cache documents.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Where cache documents live.
///
/// Documents are addressed by a server id and a message id. Both are
/// opaque strings to the store.
pub trait CacheStore {
    /// Stores a document, replacing any previous one under the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn put(&mut self, server_id: &str, msg_id: &str, bytes: &[u8]) -> Result<()>;

    /// Returns the message ids stored for a server, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed.
    fn list(&self, server_id: &str) -> Result<Vec<String>>;

    /// Returns a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown key, or the read error.
    fn get(&self, server_id: &str, msg_id: &str) -> Result<Vec<u8>>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<(String, String), Vec<u8>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn put(&mut self, server_id: &str, msg_id: &str, bytes: &[u8]) -> Result<()> {
        self.entries
            .insert((server_id.to_string(), msg_id.to_string()), bytes.to_vec());
        Ok(())
    }

    fn list(&self, server_id: &str) -> Result<Vec<String>> {
        Ok(self
            .entries
            .keys()
            .filter(|(server, _)| server == server_id)
            .map(|(_, msg)| msg.clone())
            .collect())
    }

    fn get(&self, server_id: &str, msg_id: &str) -> Result<Vec<u8>> {
        self.entries
            .get(&(server_id.to_string(), msg_id.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                server_id: server_id.to_string(),
                msg_id: msg_id.to_string(),
            })
    }
}

/// File-system store: `<root>/<server_id>/<msg_id>.json`.
///
/// Ids are escaped so that any string maps to a single, safe path
/// component: bytes outside `[A-Za-z0-9@+_-]`, and dots, become `%XX`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

const EXTENSION: &str = "json";

impl DirectoryStore {
    /// Creates a store rooted at `root`. Directories are created on the
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn server_dir(&self, server_id: &str) -> Result<PathBuf> {
        Ok(self.root.join(escape_key(server_id)?))
    }

    fn entry_path(&self, server_id: &str, msg_id: &str) -> Result<PathBuf> {
        let file = format!("{}.{EXTENSION}", escape_key(msg_id)?);
        Ok(self.server_dir(server_id)?.join(file))
    }
}

impl CacheStore for DirectoryStore {
    fn put(&mut self, server_id: &str, msg_id: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(server_id, msg_id)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        // write then rename, so readers never see half a document
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn list(&self, server_id: &str) -> Result<Vec<String>> {
        let dir = self.server_dir(server_id)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match unescape_key(stem) {
                Some(id) => ids.push(id),
                None => tracing::debug!(path = %path.display(), "ignoring foreign file"),
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn get(&self, server_id: &str, msg_id: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(server_id, msg_id)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::NotFound {
                    server_id: server_id.to_string(),
                    msg_id: msg_id.to_string(),
                }
            } else {
                e.into()
            }
        })
    }
}

const fn is_plain(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'@' | b'+' | b'_' | b'-')
}

/// Escapes an id into a file name component.
///
/// # Errors
///
/// Returns [`Error::InvalidKey`] for the empty string.
pub fn escape_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::InvalidKey(key.to_string()));
    }
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if is_plain(b) {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    Ok(out)
}

/// Reverses [`escape_key`]. Returns `None` for names it did not produce.
#[must_use]
pub fn unescape_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = name.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if is_plain(b) => {
                out.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    if out.is_empty() {
        return None;
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_key() {
        assert_eq!(escape_key("imap.example.com").unwrap(), "imap%2Eexample%2Ecom");
        assert_eq!(escape_key("<m1@e.com>").unwrap(), "%3Cm1@e%2Ecom%3E");
        assert_eq!(escape_key("..").unwrap(), "%2E%2E");
        assert_eq!(escape_key("a/b").unwrap(), "a%2Fb");
        assert!(matches!(escape_key(""), Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_unescape_key() {
        for key in ["imap.example.com", "<m1@e.com>", "42", "Ω/..", "%"] {
            assert_eq!(unescape_key(&escape_key(key).unwrap()).as_deref(), Some(key));
        }
        assert_eq!(unescape_key("a.b"), None);
        assert_eq!(unescape_key("%4"), None);
        assert_eq!(unescape_key("%zz"), None);
        assert_eq!(unescape_key(""), None);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.put("s1", "b", b"2").unwrap();
        store.put("s1", "a", b"1").unwrap();
        store.put("s2", "c", b"3").unwrap();
        store.put("s1", "a", b"one").unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.list("s1").unwrap(), vec!["a", "b"]);
        assert_eq!(store.get("s1", "a").unwrap(), b"one");
        assert!(matches!(store.get("s2", "a"), Err(Error::NotFound { .. })));
        assert!(store.list("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_directory_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());

        assert!(store.list("imap.example.com").unwrap().is_empty());

        store.put("imap.example.com", "<m2@e.com>", b"{}").unwrap();
        store.put("imap.example.com", "<m1@e.com>", b"[]").unwrap();
        store.put("other.example.com", "<m3@e.com>", b"null").unwrap();

        let path = dir
            .path()
            .join("imap%2Eexample%2Ecom")
            .join("%3Cm1@e%2Ecom%3E.json");
        assert!(path.is_file());

        assert_eq!(
            store.list("imap.example.com").unwrap(),
            vec!["<m1@e.com>", "<m2@e.com>"]
        );
        assert_eq!(store.get("imap.example.com", "<m1@e.com>").unwrap(), b"[]");
        assert!(matches!(
            store.get("imap.example.com", "<m3@e.com>"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_directory_store_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirectoryStore::new(dir.path());
        store.put("srv", "1", b"{}").unwrap();

        let server_dir = dir.path().join("srv");
        fs::write(server_dir.join("notes.txt"), b"x").unwrap();
        fs::write(server_dir.join("bad name.json"), b"{}").unwrap();

        assert_eq!(store.list("srv").unwrap(), vec!["1"]);
        assert_eq!(store.root(), dir.path());
    }
}
