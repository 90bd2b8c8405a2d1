//! Line-based codec for tokio.
//!
//! Reads `\n`-terminated lines (tolerating a preceding `\r`) and writes lines
//! terminated by `\r\n`.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{self, ProtocolError};
use crate::MAX_IRC_LINE_LEN;

/// Line-based codec that handles CRLF-terminated messages.
///
/// By default, lines are limited to 512 bytes (IRC standard).
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Set after an over-long partial line; bytes are skipped until the next newline.
    discarding: bool,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Create a codec with the standard 512 byte line limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_IRC_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// Maximum accepted line length, terminator included.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn validate_line(s: &str) -> error::Result<()> {
        for ch in s.chars() {
            if matches!(ch, '\0' | '\r' | '\n') {
                return Err(ProtocolError::IllegalControlChar(ch));
            }
        }
        Ok(())
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if self.discarding {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }

                self.next_index = src.len();
                if src.len() > self.max_len {
                    let actual = src.len();
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Err(ProtocolError::MessageTooLong {
                        actual,
                        limit: self.max_len,
                    });
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                // Tail of a line that was already reported as too long.
                self.discarding = false;
                continue;
            }

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let mut body = &line[..line.len() - 1];
            if let Some(stripped) = body.strip_suffix(b"\r") {
                body = stripped;
            }

            let data = std::str::from_utf8(body).map_err(|e| ProtocolError::InvalidUtf8 {
                byte_pos: e.valid_up_to(),
            })?;
            Self::validate_line(data)?;

            if data.trim().is_empty() {
                // Blank keep-alive lines carry nothing to dispatch.
                continue;
            }

            return Ok(Some(data.to_owned()));
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        let body = msg.trim_end_matches(['\r', '\n']);
        Self::validate_line(body)?;
        dst.reserve(body.len() + 2);
        dst.put_slice(body.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
