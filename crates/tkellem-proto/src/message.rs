//! Owned IRC messages and the nom-based line parser.
//!
//! IRC message format:
//! ```text
//! [@tags] [:prefix] <command> [params...] [:trailing]
//! ```

use std::fmt;
use std::str::FromStr;

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};

use crate::error::{MessageParseError, ProtocolError};
use crate::prefix::Prefix;

/// An owned IRC message.
///
/// Tags are kept as the raw string after `@` so that forwarded lines keep
/// whatever the client sent.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Raw IRCv3 tag section without the leading `@`.
    pub tags: Option<String>,
    /// Message prefix/source.
    pub prefix: Option<Prefix>,
    /// Command token as received (case preserved) or a three digit numeric.
    pub command: String,
    /// Command parameters, trailing parameter included.
    pub args: Vec<String>,
    /// Write the last argument in `:trailing` form even when not required.
    pub trailing: bool,
}

impl Message {
    /// Build a message from a command and middle arguments.
    pub fn new<C, I, A>(command: C, args: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            tags: None,
            prefix: None,
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            trailing: false,
        }
    }

    /// Append a trailing argument, always serialized with a leading `:`.
    #[must_use]
    pub fn with_trailing(mut self, text: impl Into<String>) -> Self {
        self.args.push(text.into());
        self.trailing = true;
        self
    }

    /// Attach a prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Case-insensitive command comparison.
    pub fn command_is(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }

    /// Argument at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// The last argument, if any.
    pub fn last_arg(&self) -> Option<&str> {
        self.args.last().map(String::as_str)
    }

    /// Numeric reply code when the command is three digits.
    pub fn numeric(&self) -> Option<u16> {
        if self.command.len() == 3 && self.command.bytes().all(|b| b.is_ascii_digit()) {
            self.command.parse().ok()
        } else {
            None
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tags) = &self.tags {
            write!(f, "@{tags} ")?;
        }
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;

        let Some((last, middle)) = self.args.split_last() else {
            return Ok(());
        };
        for arg in middle {
            write!(f, " {arg}")?;
        }
        if self.trailing || last.is_empty() || last.contains(' ') || last.starts_with(':') {
            write!(f, " :{last}")
        } else {
            write!(f, " {last}")
        }
    }
}

fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

fn parse_command(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c != ' ' && c != '\r' && c != '\n')(input)
}

/// Split the parameter section. Returns the params and whether the last one
/// was introduced with `:`.
fn parse_params(input: &str) -> (Vec<&str>, bool) {
    let mut params = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return (params, false);
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            return (params, true);
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }
}

struct ParsedMessage<'a> {
    tags: Option<&'a str>,
    prefix: Option<&'a str>,
    command: &'a str,
    params: Vec<&'a str>,
    trailing: bool,
}

fn parse_message(input: &str) -> IResult<&str, ParsedMessage<'_>> {
    let (input, tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;

    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;

    let (input, command) = parse_command(input)?;
    let (params, trailing) = parse_params(input);

    Ok((
        "",
        ParsedMessage {
            tags,
            prefix,
            command,
            params,
            trailing,
        },
    ))
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        let (_, parsed) = parse_message(line).map_err(|err| {
            let cause = match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => MessageParseError::ParseContext {
                    position: line.len() - e.input.len(),
                },
                nom::Err::Incomplete(_) => MessageParseError::InvalidCommand,
            };
            ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause,
            }
        })?;

        Ok(Message {
            tags: parsed.tags.map(str::to_owned),
            prefix: parsed.prefix.map(Prefix::new_from_str),
            command: parsed.command.to_owned(),
            args: parsed.params.into_iter().map(str::to_owned).collect(),
            trailing: parsed.trailing,
        })
    }
}
