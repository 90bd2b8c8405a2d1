//! Connection - Handles an individual client socket.
//!
//! ```text
//!    ┌───────────────────────────────────────────────┐
//!    │               Connection Task                 │
//!    │                                               │
//!    │  Framed<S, ClientCodec> ──▶ BouncerSession    │
//!    │         ▲                        │            │
//!    │         │                        ▼            │
//!    │         └──────── outbound queue ◀── ClientHandle
//!    └───────────────────────────────────────────────┘
//! ```
//!
//! Inbound lines are handled strictly one at a time. After each line the
//! outbound queue is flushed, so replies land in the order they were queued.
//! Once the queue overflows, whatever is still queued is discarded and the
//! client gets `ERROR :SendQ exceeded` before the socket closes.

use super::codec::ClientCodec;
use crate::backend::Registry;
use crate::client::{DEFAULT_SENDQ, Outbound, OutboundReceiver};
use crate::config::BouncerConfig;
use crate::error::{ConnectionError, error_line};
use crate::session::{BouncerSession, Flow};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tkellem_proto::{MAX_IRC_LINE_LEN, Message, ProtocolError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, trace, warn};

/// Result of one `select!` round.
enum SelectResult {
    Outgoing(Outbound),
    Incoming(Message),
    ReadError(ProtocolError),
    Eof,
}

/// One client socket and its session.
pub struct Connection<S> {
    framed: Framed<S, ClientCodec>,
    session: BouncerSession,
    outbound: OutboundReceiver,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap `stream` with the standard 512 byte line limit.
    ///
    /// `secure` tells backends whether the transport was encrypted.
    pub fn new(stream: S, registry: Arc<dyn Registry>, secure: bool) -> Self {
        Self::with_limits(stream, registry, secure, MAX_IRC_LINE_LEN, DEFAULT_SENDQ)
    }

    pub fn with_config(
        stream: S,
        registry: Arc<dyn Registry>,
        secure: bool,
        config: &BouncerConfig,
    ) -> Self {
        debug!(server = %config.server_name, secure, "Client connection opened");
        Self::with_limits(stream, registry, secure, config.max_line_len, config.sendq)
    }

    fn with_limits(
        stream: S,
        registry: Arc<dyn Registry>,
        secure: bool,
        max_line_len: usize,
        sendq: usize,
    ) -> Self {
        let (session, outbound) = BouncerSession::with_sendq(registry, secure, sendq);
        Self {
            framed: Framed::new(stream, ClientCodec::new(max_line_len)),
            session,
            outbound,
        }
    }

    pub fn session(&self) -> &BouncerSession {
        &self.session
    }

    /// Run until the client leaves or the session closes.
    ///
    /// The session is always detached from its backend before returning.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        let result = self.event_loop().await;
        self.session.teardown();
        if let Err(e) = SinkExt::<Message>::close(&mut self.framed).await {
            debug!(conn = %self.session.log_name(), error = %e, "Error closing socket");
        }
        if let Err(ref e) = result {
            warn!(conn = %self.session.log_name(), error = %e, "Connection ended with error");
        }
        result
    }

    async fn event_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            if self.session.sendq_exceeded() {
                return self.sendq_exceeded().await;
            }

            let select_result = tokio::select! {
                biased;

                Some(out) = self.outbound.recv() => SelectResult::Outgoing(out),

                frame = self.framed.next() => match frame {
                    Some(Ok(msg)) => SelectResult::Incoming(msg),
                    Some(Err(e)) => SelectResult::ReadError(e),
                    None => SelectResult::Eof,
                },
            };

            match select_result {
                SelectResult::Outgoing(out) => self.deliver(out).await?,
                SelectResult::Incoming(msg) => {
                    let flow = self.session.handle_line(msg).await;
                    if self.session.sendq_exceeded() {
                        return self.sendq_exceeded().await;
                    }
                    self.flush_outbound().await?;
                    if flow == Flow::Close {
                        return Ok(());
                    }
                }
                SelectResult::ReadError(e) => return self.read_error(e).await,
                SelectResult::Eof => {
                    info!(conn = %self.session.log_name(), "Client closed connection");
                    return Ok(());
                }
            }
        }
    }

    /// Write everything currently queued.
    async fn flush_outbound(&mut self) -> Result<(), ConnectionError> {
        while let Ok(out) = self.outbound.try_recv() {
            self.deliver(out).await?;
        }
        Ok(())
    }

    async fn deliver(&mut self, out: Outbound) -> Result<(), ConnectionError> {
        match out {
            Outbound::Line(msg) => self.write(msg).await,
            Outbound::Transient(msg) => {
                let trigger = msg.clone();
                self.write(msg).await?;
                self.session.transient_response(&trigger).await;
                Ok(())
            }
        }
    }

    async fn write(&mut self, msg: Message) -> Result<(), ConnectionError> {
        trace!(conn = %self.session.log_name(), line = %msg, "to client");
        self.framed.send(msg).await?;
        Ok(())
    }

    async fn sendq_exceeded(&mut self) -> Result<(), ConnectionError> {
        let mut dropped = 0usize;
        while self.outbound.try_recv().is_ok() {
            dropped += 1;
        }
        warn!(conn = %self.session.log_name(), dropped, "SendQ exceeded, closing");
        self.write(error_line("SendQ exceeded")).await
    }

    async fn read_error(&mut self, e: ProtocolError) -> Result<(), ConnectionError> {
        if let ProtocolError::Io(_) = e {
            return Err(ConnectionError::Protocol(e));
        }
        info!(conn = %self.session.log_name(), error = %e, "Protocol error, closing");
        // Anything already queued goes out before the ERROR line.
        self.flush_outbound().await?;
        self.write(error_line(e.to_string())).await?;
        Err(e.into())
    }
}
