//! Login credentials.

use std::fmt;

/// An IMAP account: server and cleartext login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Server host name.
    pub server: String,
    /// Login user name.
    pub user: String,
    /// Login password.
    pub password: String,
}

impl Account {
    /// Creates an account.
    #[must_use]
    pub fn new(
        server: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
