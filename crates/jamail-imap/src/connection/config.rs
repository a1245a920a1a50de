//! Where and how to reach an IMAPS server.

use std::time::Duration;

use crate::types::Account;

/// Default IMAPS port.
pub const DEFAULT_PORT: u16 = 993;

/// How long the host waits for the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for one account.
///
/// TLS starts immediately on connect; there is no plaintext phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host to dial.
    pub host: String,
    /// Port to dial.
    pub port: u16,
    /// Limit on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Name checked against the server certificate, when it differs from
    /// `host` (for example when dialling an address).
    pub tls_name: Option<String>,
}

impl Config {
    /// Settings for `host` on the IMAPS port.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            tls_name: None,
        }
    }

    /// Settings for the server of an account.
    #[must_use]
    pub fn for_account(account: &Account) -> Self {
        Self::new(account.server.as_str())
    }

    /// Starts a builder for `host`.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            config: Self::new(host),
        }
    }

    /// `host:port`, ready for a resolver.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Name to verify the server certificate against.
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.tls_name.as_deref().unwrap_or(&self.host)
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Dials `port` instead of 993.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Overrides the TCP connect limit.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Verifies the certificate against `name` rather than the host.
    #[must_use]
    pub fn tls_name(mut self, name: impl Into<String>) -> Self {
        self.config.tls_name = Some(name.into());
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
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
    fn test_defaults() {
        let config = Config::new("imap.example.com");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.address(), "imap.example.com:993");
        assert_eq!(config.server_name(), "imap.example.com");
    }

    #[test]
    fn test_for_account() {
        let account = Account::new("mail.example.org", "ann", "pw");
        assert_eq!(Config::for_account(&account), Config::new("mail.example.org"));
    }

    #[test]
    fn test_builder() {
        let config = Config::builder("192.0.2.7")
            .port(10993)
            .connect_timeout(Duration::from_secs(5))
            .tls_name("imap.example.com")
            .build();

        assert_eq!(config.address(), "192.0.2.7:10993");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.server_name(), "imap.example.com");
    }
}
