//! Command routing.
//!
//! Every client line maps to exactly one [`ClientCommand`]. Matching is on
//! the whole command token, case-insensitively; anything outside the fixed
//! set lands in [`ClientCommand::Other`].

use super::meta::MetaCommand;
use tkellem_proto::Message;

/// Backend name and client display name requested by `USER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedIdentity {
    pub conn_name: String,
    pub client_name: Option<String>,
}

/// A client line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `TKELLEM <subcommand>`: bouncer control.
    Tkellem(MetaCommand),
    /// `PASS <password>`
    Pass(Option<String>),
    /// `USER ... <backend> <client-name>`
    User(Option<RequestedIdentity>),
    /// `NICK <nick>`
    Nick(Option<String>),
    /// `QUIT`, never forwarded upstream.
    Quit,
    /// `PING <token>`
    Ping(String),
    /// Everything else.
    Other,
}

impl ClientCommand {
    pub fn parse(msg: &Message) -> Self {
        match msg.command.to_ascii_uppercase().as_str() {
            "TKELLEM" => Self::Tkellem(MetaCommand::parse(msg.arg(0))),
            "PASS" => Self::Pass(msg.arg(0).map(str::to_owned)),
            "USER" => Self::User(parse_identity(msg)),
            "NICK" => Self::Nick(msg.last_arg().map(str::to_owned)),
            "QUIT" => Self::Quit,
            "PING" => Self::Ping(msg.last_arg().unwrap_or_default().to_owned()),
            _ => Self::Other,
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tkellem(_) => "TKELLEM",
            Self::Pass(_) => "PASS",
            Self::User(_) => "USER",
            Self::Nick(_) => "NICK",
            Self::Quit => "QUIT",
            Self::Ping(_) => "PING",
            Self::Other => "OTHER",
        }
    }
}

/// Pull `<backend> <client-name>` out of a `USER` line.
///
/// The pair normally sits in the trailing argument (`USER u 0 * :net1 laptop`).
/// When the last argument holds a single middle token, the two final
/// arguments are used instead (`USER x x net1 laptop`).
fn parse_identity(msg: &Message) -> Option<RequestedIdentity> {
    let last = msg.last_arg()?;
    let mut tokens = last.split_whitespace();

    match (tokens.next(), tokens.next()) {
        (Some(conn_name), Some(client_name)) => Some(RequestedIdentity {
            conn_name: conn_name.to_owned(),
            client_name: Some(client_name.to_owned()),
        }),
        (Some(single), None) if !msg.trailing && msg.args.len() >= 2 => {
            Some(RequestedIdentity {
                conn_name: msg.args[msg.args.len() - 2].clone(),
                client_name: Some(single.to_owned()),
            })
        }
        (Some(single), None) => Some(RequestedIdentity {
            conn_name: single.to_owned(),
            client_name: None,
        }),
        (None, _) => None,
    }
}
