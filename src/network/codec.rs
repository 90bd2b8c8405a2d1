//! Client-side framing.

use bytes::BytesMut;
use tkellem_proto::{IrcCodec, Message, ProtocolError};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// [`IrcCodec`] that drops over-long lines instead of failing the stream.
///
/// `Framed` ends the stream after any decoder error, so recoverable errors
/// are absorbed here and decoding resumes with the next line.
#[derive(Debug, Default)]
pub struct ClientCodec {
    inner: IrcCodec,
    dropped: u64,
}

impl ClientCodec {
    pub fn new(max_len: usize) -> Self {
        Self {
            inner: IrcCodec::with_max_len(max_len),
            dropped: 0,
        }
    }

    /// Lines dropped so far for exceeding the length limit.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Decoder for ClientCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        loop {
            match self.inner.decode(src) {
                Err(e) if e.is_recoverable() => {
                    self.dropped += 1;
                    warn!(error = %e, "Dropping line");
                }
                other => return other,
            }
        }
    }
}

impl Encoder<Message> for ClientCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        self.inner.encode(msg, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlong_line_is_skipped() {
        let mut codec = ClientCodec::new(64);
        let long = "x".repeat(100);
        let mut buf = BytesMut::from(format!("PRIVMSG #a :{long}\r\nPING abc\r\n").as_str());

        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(codec.dropped(), 1);
    }

    #[test]
    fn test_limit_counts_line_terminator() {
        let mut codec = ClientCodec::new(64);
        let fits = format!("PRIVMSG #a :{}\r\n", "x".repeat(50));
        let over = format!("PRIVMSG #a :{}\r\n", "y".repeat(51));
        assert_eq!(fits.len(), 64);
        let mut buf = BytesMut::from(format!("{over}{fits}").as_str());

        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.last_arg(), Some("x".repeat(50).as_str()));
        assert_eq!(codec.dropped(), 1);
    }

    #[test]
    fn test_overlong_partial_line_is_discarded() {
        let mut codec = ClientCodec::new(64);
        let mut buf = BytesMut::from("y".repeat(80).as_str());
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"yyyy\r\nNICK bob\r\n");
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg.arg(0), Some("bob"));
        assert_eq!(codec.dropped(), 1);
    }

    #[test]
    fn test_fatal_errors_pass_through() {
        let mut codec = ClientCodec::new(64);
        let mut buf = BytesMut::from(&b"NICK \xff\r\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::InvalidUtf8 { .. })
        ));
    }
}
