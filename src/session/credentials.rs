//! Pending handshake credentials.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Credentials collected before attach.
///
/// Each handshake command produces a new value; fields are never edited in
/// place. The password is wiped from memory when a value is dropped.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PendingCredentials {
    nick: Option<String>,
    password: Option<String>,
    conn_name: Option<String>,
    client_name: Option<String>,
}

impl PendingCredentials {
    /// Credentials after a `PASS`.
    #[must_use]
    pub fn with_password(&self, password: Option<&str>) -> Self {
        let mut next = self.clone();
        next.password = password.map(str::to_owned);
        next
    }

    /// Credentials after a `USER`.
    #[must_use]
    pub fn with_identity(&self, conn_name: Option<&str>, client_name: Option<&str>) -> Self {
        let mut next = self.clone();
        next.conn_name = conn_name.map(str::to_owned);
        next.client_name = client_name.map(str::to_owned);
        next
    }

    /// Credentials after a `NICK`.
    #[must_use]
    pub fn with_nick(&self, nick: &str) -> Self {
        let mut next = self.clone();
        next.nick = Some(nick.to_owned());
        next
    }

    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn conn_name(&self) -> Option<&str> {
        self.conn_name.as_deref()
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// Nothing has been collected yet.
    pub fn is_pristine(&self) -> bool {
        self.nick.is_none()
            && self.password.is_none()
            && self.conn_name.is_none()
            && self.client_name.is_none()
    }
}

impl fmt::Debug for PendingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCredentials")
            .field("nick", &self.nick)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("conn_name", &self.conn_name)
            .field("client_name", &self.client_name)
            .finish()
    }
}
