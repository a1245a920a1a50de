//! Drives sessions on a single-threaded tokio runtime.
//!
//! The session itself never blocks and never awaits. The driver owns the
//! socket, waits for whatever readiness the session's watch set asks for,
//! and forwards it as `handle_readable` / `handle_writable` calls.

use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, bail};
use jamail_core::{CacheStore, DirectoryStore, HeaderCache};
use jamail_imap::{
    Account, Envelope, Session, SessionHandler, SessionState, TlsTransport, WatchSet,
    tls_client_config,
};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::AccountConfig;

/// What to do for each account.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Message to fetch once the list is complete.
    pub fetch: Option<u32>,
    /// Only replay the cache.
    pub offline: bool,
}

/// Non-blocking `Read`/`Write` over a shared tokio socket.
///
/// The driver keeps another handle to await readiness on.
#[derive(Debug, Clone)]
pub struct SocketIo(Rc<TcpStream>);

impl Read for SocketIo {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.try_read(buf)
    }
}

impl Write for SocketIo {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.try_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Prints envelopes and bodies, and records envelopes in the cache.
pub struct Printer<S, W> {
    cache: HeaderCache<S>,
    out: W,
}

impl<S: CacheStore, W: Write> Printer<S, W> {
    /// Creates a printer.
    pub const fn new(cache: HeaderCache<S>, out: W) -> Self {
        Self { cache, out }
    }

    /// Returns the cache.
    #[cfg(test)]
    pub const fn cache(&self) -> &HeaderCache<S> {
        &self.cache
    }

    /// Consumes the printer, returning the output sink.
    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }
}

impl<S: CacheStore, W: Write> SessionHandler for Printer<S, W> {
    fn on_envelope(&mut self, account: &Account, envelope: &Envelope) {
        let id = envelope.id.to_string();
        if let Err(e) = writeln!(self.out, "{}", summary_line(&id, envelope)) {
            warn!(error = %e, "cannot write envelope");
        }
        let key = cache_key(envelope);
        if let Err(e) = self.cache.store_envelope(&account.server, &key, envelope) {
            warn!(server = %account.server, %key, error = %e, "cannot cache envelope");
        }
    }

    fn on_body(&mut self, _account: &Account, id: u32, body: &[u8]) {
        let result = writeln!(self.out, "--- message {id} ---")
            .and_then(|()| self.out.write_all(body))
            .and_then(|()| writeln!(self.out));
        if let Err(e) = result {
            warn!(id, error = %e, "cannot write body");
        }
    }

    fn on_bye(&mut self, account: &Account, text: &str) {
        info!(server = %account.server, text, "server said goodbye");
    }
}

/// Formats `id  from  subject`. The sender shown is the first From
/// address: its display name, or the mailbox when the name is empty.
pub fn summary_line(id: &str, envelope: &Envelope) -> String {
    let from = envelope.from.first().map_or("", |address| {
        if address.name.is_empty() {
            address.email.as_str()
        } else {
            address.name.as_str()
        }
    });
    format!("{id}  {from}  {}", envelope.subject)
}

/// Cache key of an envelope: its Message-ID, or the sequence number for
/// messages without one.
pub fn cache_key(envelope: &Envelope) -> String {
    if envelope.message_id.is_empty() {
        format!("seq-{}", envelope.id)
    } else {
        envelope.message_id.clone()
    }
}

/// Prints every cached envelope of a server. Cached entries carry no
/// sequence number, so the id column shows `-`.
pub fn replay<S: CacheStore>(
    cache: &HeaderCache<S>,
    server_id: &str,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let envelopes = cache.load_all(server_id)?;
    for envelope in &envelopes {
        writeln!(out, "{}", summary_line("-", envelope))?;
    }
    Ok(envelopes.len())
}

/// Replays the cache for every account, then lists each inbox.
pub async fn run(accounts: &[AccountConfig], cache_dir: &Path, options: Options) -> anyhow::Result<()> {
    for account in accounts {
        let cache = HeaderCache::new(DirectoryStore::new(cache_dir));
        let replayed = replay(&cache, &account.server, &mut io::stdout().lock())
            .with_context(|| format!("cannot read cache for {}", account.server))?;
        info!(server = %account.server, replayed, "replayed cache");

        if !options.offline {
            run_account(account, cache, options.fetch)
                .await
                .with_context(|| format!("account {}", account.server))?;
        }
    }
    Ok(())
}

async fn run_account(
    account: &AccountConfig,
    cache: HeaderCache<DirectoryStore>,
    fetch: Option<u32>,
) -> anyhow::Result<()> {
    let connection = account.connection();
    let address = connection.address();

    let stream = tokio::time::timeout(connection.connect_timeout, TcpStream::connect(&address))
        .await
        .with_context(|| format!("connecting to {address} timed out"))?
        .with_context(|| format!("cannot connect to {address}"))?;
    stream.set_nodelay(true)?;
    info!(%address, "connected");

    let socket = Rc::new(stream);
    let transport = TlsTransport::new(
        tls_client_config(),
        connection.server_name(),
        SocketIo(Rc::clone(&socket)),
    )?;
    let watches = Rc::new(RefCell::new(WatchSet::new()));
    let printer = Printer::new(cache, io::stdout());
    let mut session = Session::new(account.account(), transport, Rc::clone(&watches), printer);

    session.connect()?;
    let mut pending_fetch = fetch;
    loop {
        if session.state() == SessionState::Idle {
            match pending_fetch.take() {
                Some(id) => session.fetch_message(id)?,
                None => break,
            }
        }

        let (readable, writable) = {
            let watches = watches.borrow();
            (watches.wants_readable(), watches.wants_writable())
        };
        tokio::select! {
            ready = socket.readable(), if readable => {
                ready?;
                session.handle_readable()?;
            }
            ready = socket.writable(), if writable => {
                ready?;
                session.handle_writable()?;
            }
            else => bail!("session stopped watching the socket"),
        }
    }

    session.close();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use jamail_core::MemoryStore;
    use jamail_imap::Address;

    fn envelope() -> Envelope {
        Envelope {
            id: 5,
            subject: "Lunch?".to_string(),
            from: vec![Address::new("Ann", "ann@e.com")],
            message_id: "<m5@e.com>".to_string(),
            ..Envelope::default()
        }
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(summary_line("5", &envelope()), "5  Ann  Lunch?");

        let no_name = Envelope {
            from: vec![Address::new("", "bob@e.com")],
            ..envelope()
        };
        assert_eq!(summary_line("-", &no_name), "-  bob@e.com  Lunch?");

        let no_from = Envelope {
            from: vec![],
            ..envelope()
        };
        assert_eq!(summary_line("1", &no_from), "1    Lunch?");
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key(&envelope()), "<m5@e.com>");
        let anonymous = Envelope {
            message_id: String::new(),
            ..envelope()
        };
        assert_eq!(cache_key(&anonymous), "seq-5");
    }

    #[test]
    fn test_printer_prints_and_caches() {
        let account = Account::new("imap.example.com", "ann", "pw");
        let mut printer = Printer::new(HeaderCache::new(MemoryStore::new()), Vec::new());

        printer.on_envelope(&account, &envelope());
        printer.on_body(&account, 5, b"Noon?");

        let cached = printer.cache().load_all("imap.example.com").unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].subject, "Lunch?");

        let out = String::from_utf8(printer.into_output()).unwrap();
        assert_eq!(out, "5  Ann  Lunch?\n--- message 5 ---\nNoon?\n");
    }

    #[test]
    fn test_replay() {
        let mut cache = HeaderCache::new(MemoryStore::new());
        cache.store_envelope("srv", "<m5@e.com>", &envelope()).unwrap();

        let mut out = Vec::new();
        assert_eq!(replay(&cache, "srv", &mut out).unwrap(), 1);
        assert_eq!(String::from_utf8(out).unwrap(), "-  Ann  Lunch?\n");

        let mut out = Vec::new();
        assert_eq!(replay(&cache, "other", &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_socket_io_would_block() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (mut server, _) = listener.accept().await.unwrap();

        let mut sock = SocketIo(Rc::new(client));
        let mut buf = [0u8; 16];
        let err = sock.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        tokio::io::AsyncWriteExt::write_all(&mut server, b"* OK\r\n").await.unwrap();
        let n = loop {
            sock.0.readable().await.unwrap();
            match sock.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => panic!("read failed: {e}"),
            }
        };
        assert_eq!(&buf[..n], b"* OK\r\n");
    }
}
