//! Host configuration file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use jamail_imap::{Account, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

/// Contents of `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Accounts to list, in order.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    /// Where the header cache lives. Defaults to the user cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// One IMAPS account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Server host name.
    pub server: String,
    /// Login user name.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

impl AccountConfig {
    /// Returns the session account.
    pub fn account(&self) -> Account {
        Account::new(&self.server, &self.user, &self.password)
    }

    /// Returns the connection settings.
    pub fn connection(&self) -> jamail_imap::Config {
        jamail_imap::Config::builder(&self.server)
            .port(self.port)
            .build()
    }
}

impl Config {
    /// Default location: `<config_dir>/jamail/config.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jamail")
            .join("config.json")
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), accounts = config.accounts.len(), "loaded config");
        Ok(config)
    }

    /// Resolved cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("jamail")
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"accounts": [{"server": "imap.example.com", "user": "ann", "password": "pw"}]}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.accounts.len(), 1);
        let account = &config.accounts[0];
        assert_eq!(account.port, 993);
        assert_eq!(account.account(), Account::new("imap.example.com", "ann", "pw"));
        assert_eq!(account.connection().address(), "imap.example.com:993");
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_load_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "accounts": [{"server": "mail.local", "user": "u", "password": "p", "port": 1993}],
                "cache_dir": "/tmp/jamail-cache"
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.accounts[0].connection().port, 1993);
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/jamail-cache"));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = Config::load(&missing).unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"accounts": [{"server": "x"}]}"#).unwrap();
        let err = Config::load(&bad).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let account = AccountConfig {
            server: "s".to_string(),
            user: "u".to_string(),
            password: "hunter2".to_string(),
            port: 993,
        };
        assert!(!format!("{account:?}").contains("hunter2"));
    }

    #[test]
    fn test_default_path() {
        assert!(Config::default_path().ends_with("jamail/config.json"));
    }
}
