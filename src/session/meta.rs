//! `TKELLEM` bouncer control commands.
//!
//! These never touch backend or backlog state; they only produce replies.

use crate::BOUNCER_IDENTITY;
use tkellem_proto::{Message, Prefix};

/// Recognized `TKELLEM` subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    /// Placeholder probe. Does nothing.
    NothingYet,
    /// Anything else; the client gets a notice naming it.
    Unknown(String),
}

impl MetaCommand {
    pub fn parse(subcommand: Option<&str>) -> Self {
        match subcommand {
            Some(sub) if sub.eq_ignore_ascii_case("nothing_yet") => Self::NothingYet,
            other => Self::Unknown(other.unwrap_or_default().to_owned()),
        }
    }

    /// Reply to send to `nick`, if any.
    pub fn reply(&self, nick: &str) -> Option<Message> {
        match self {
            Self::NothingYet => None,
            Self::Unknown(sub) => Some(
                Message::new("PRIVMSG", [nick])
                    .with_trailing(format!("Unknown tkellem command {sub}"))
                    .with_prefix(Prefix::new(
                        BOUNCER_IDENTITY,
                        BOUNCER_IDENTITY,
                        BOUNCER_IDENTITY,
                    )),
            ),
        }
    }
}
