//! IRC message codec for tokio.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error;
use crate::line::LineCodec;
use crate::message::Message;

/// Tokio codec for encoding/decoding IRC [`Message`]s.
///
/// Wraps [`LineCodec`] and parses lines into messages.
#[derive(Debug, Default)]
pub struct IrcCodec {
    inner: LineCodec,
}

impl IrcCodec {
    /// Create a codec with the standard line limit.
    pub fn new() -> Self {
        Self {
            inner: LineCodec::new(),
        }
    }

    /// Create a codec with a custom max line length in bytes.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            inner: LineCodec::with_max_len(max_len),
        }
    }
}

impl Decoder for IrcCodec {
    type Item = Message;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<Message>> {
        self.inner
            .decode(src)
            .and_then(|res| res.map_or(Ok(None), |line| line.parse::<Message>().map(Some)))
    }
}

impl Encoder<Message> for IrcCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> error::Result<()> {
        self.inner.encode(msg.to_string(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_messages() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::from("PASS secret\r\nNICK alice\r\n");

        let first = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.command, "PASS");
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(second.arg(0), Some("alice"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encodes_with_crlf() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Message::new("ERROR", Vec::<String>::new()).with_trailing("bye"), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"ERROR :bye\r\n");
    }

    #[test]
    fn rejects_embedded_newline_on_encode() {
        let mut codec = IrcCodec::new();
        let mut buf = BytesMut::new();

        let msg = Message::new("PRIVMSG", ["#a"]).with_trailing("x\r\nQUIT");
        assert!(codec.encode(msg, &mut buf).is_err());
    }
}
