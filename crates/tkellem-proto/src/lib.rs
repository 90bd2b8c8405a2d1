//! # tkellem-proto
//!
//! IRC line framing and message parsing for the tkellem bouncer.
//!
//! The bouncer only interprets a handful of commands and forwards everything
//! else verbatim, so the message model is deliberately untyped: a command
//! token plus an argument list.
//!
//! ```rust
//! use tkellem_proto::Message;
//!
//! let msg: Message = ":nick!user@host PRIVMSG #channel :Hello!".parse().unwrap();
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.last_arg(), Some("Hello!"));
//! assert_eq!(msg.to_string(), ":nick!user@host PRIVMSG #channel :Hello!");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod error;
pub mod irc;
pub mod line;
pub mod message;
pub mod prefix;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use self::error::{MessageParseError, ProtocolError};
pub use self::irc::IrcCodec;
pub use self::line::LineCodec;
pub use self::message::Message;
pub use self::prefix::Prefix;

/// Maximum length of an IRC line in bytes, including the terminator.
pub const MAX_IRC_LINE_LEN: usize = 512;
