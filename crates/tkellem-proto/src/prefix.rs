//! IRC message prefix types.

use std::fmt;

/// Origin of a message: a server name or a `nick!user@host` mask.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Prefix {
    /// Server name (e.g. `tkellem`).
    ServerName(String),
    /// User prefix: (nickname, username, hostname).
    Nickname(String, String, String),
}

impl Prefix {
    /// Parse a prefix leniently; components are not validated.
    ///
    /// Anything without `!` or `@` is treated as a server name, which is how
    /// the bouncer's own `tkellem` identity round-trips.
    pub fn new_from_str(s: &str) -> Self {
        let (name, rest) = match s.find(['!', '@']) {
            Some(idx) => (&s[..idx], &s[idx..]),
            None => return Prefix::ServerName(s.to_owned()),
        };

        let (user, host) = match rest.strip_prefix('!') {
            Some(after_bang) => match after_bang.split_once('@') {
                Some((user, host)) => (user, host),
                None => (after_bang, ""),
            },
            None => ("", &rest[1..]),
        };

        Prefix::Nickname(name.to_owned(), user.to_owned(), host.to_owned())
    }

    /// Shorthand for a full `nick!user@host` prefix.
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Prefix::Nickname(nick.into(), user.into(), host.into())
    }

    /// The nickname, or the server name for server prefixes.
    pub fn name(&self) -> &str {
        match self {
            Prefix::ServerName(name) | Prefix::Nickname(name, _, _) => name,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(nick, user, host) => {
                f.write_str(nick)?;
                if !user.is_empty() {
                    write!(f, "!{user}")?;
                }
                if !host.is_empty() {
                    write!(f, "@{host}")?;
                }
                Ok(())
            }
        }
    }
}
