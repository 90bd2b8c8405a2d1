//! Bouncer connection core.
//!
//! A [`BouncerSession`] holds everything one client socket knows: the
//! credentials gathered so far and, once authenticated, its attachment to a
//! backend session and backlog. Lines are fed in one at a time; output goes
//! to the connection's outbound queue.
//!
//! ## State Machine
//!
//! ```text
//! ┌─────────────────┐  PASS/USER  ┌───────────────────────┐
//! │ Unauthenticated │ ──────────▶ │ CollectingCredentials │
//! └─────────────────┘             └───────────────────────┘
//!          │ NICK (attach ok)                 │ NICK (attach ok)
//!          ▼                                  ▼
//!      ┌──────────┐     QUIT / error / teardown     ┌────────┐
//!      │ Attached │ ──────────────────────────────▶ │ Closed │
//!      └──────────┘                                 └────────┘
//! ```

mod credentials;
mod dispatch;
mod handshake;
mod meta;
mod replay;

pub use credentials::PendingCredentials;
pub use dispatch::{ClientCommand, RequestedIdentity};
pub use meta::MetaCommand;

use crate::backend::{BackendSession, Backlog, Registry};
use crate::client::{
    ClientHandle, ClientId, DEFAULT_SENDQ, Outbound, OutboundReceiver, SendQueue, send_queue,
};
use crate::error::BouncerError;
use crate::{BOUNCER_IDENTITY, metrics};
use std::sync::Arc;
use tkellem_proto::{Message, Prefix};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Display name used before a client name has been negotiated.
pub const PLACEHOLDER_NAME: &str = "new-conn";

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing received yet.
    Unauthenticated,
    /// Some of PASS/USER/NICK received.
    CollectingCredentials,
    /// Attached to a backend session.
    Attached,
    /// Socket is being (or has been) closed.
    Closed,
}

/// What the connection should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// A connection fully attached to a backend identity.
///
/// Backend and backlog only ever exist together.
struct Attachment {
    backend: Arc<dyn BackendSession>,
    backlog: Arc<dyn Backlog>,
    handle: ClientHandle,
}

/// Per-socket protocol state.
pub struct BouncerSession {
    id: ClientId,
    transport_secure: bool,
    registry: Arc<dyn Registry>,
    queue: SendQueue,
    pending: PendingCredentials,
    attachment: Option<Attachment>,
    closed: bool,
}

impl BouncerSession {
    /// Create a session and the receiver for its outbound queue.
    pub fn new(registry: Arc<dyn Registry>, transport_secure: bool) -> (Self, OutboundReceiver) {
        Self::with_sendq(registry, transport_secure, DEFAULT_SENDQ)
    }

    /// Like [`BouncerSession::new`] with an outbound queue of `sendq` lines.
    pub fn with_sendq(
        registry: Arc<dyn Registry>,
        transport_secure: bool,
        sendq: usize,
    ) -> (Self, OutboundReceiver) {
        let (queue, rx) = send_queue(sendq);
        let session = Self {
            id: Uuid::new_v4(),
            transport_secure,
            registry,
            queue,
            pending: PendingCredentials::default(),
            attachment: None,
            closed: false,
        };
        (session, rx)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn is_secure(&self) -> bool {
        self.transport_secure
    }

    /// Whether the session is attached to a backend.
    pub fn is_connected(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn state(&self) -> HandshakeState {
        if self.closed {
            HandshakeState::Closed
        } else if self.attachment.is_some() {
            HandshakeState::Attached
        } else if self.pending.is_pristine() {
            HandshakeState::Unauthenticated
        } else {
            HandshakeState::CollectingCredentials
        }
    }

    /// Credentials collected so far in the current handshake attempt.
    pub fn pending(&self) -> &PendingCredentials {
        &self.pending
    }

    pub fn backend_ref(&self) -> Option<&Arc<dyn BackendSession>> {
        self.attachment.as_ref().map(|a| &a.backend)
    }

    pub fn backlog_ref(&self) -> Option<&Arc<dyn Backlog>> {
        self.attachment.as_ref().map(|a| &a.backlog)
    }

    /// Whether the outbound queue has overflowed. The connection must close.
    pub fn sendq_exceeded(&self) -> bool {
        self.queue.is_exceeded()
    }

    /// Handle given to the backend on attach.
    pub fn client_handle(&self) -> Option<&ClientHandle> {
        self.attachment.as_ref().map(|a| &a.handle)
    }

    /// Negotiated client name, or a placeholder before attach.
    pub fn display_name(&self) -> &str {
        self.attachment
            .as_ref()
            .map_or(PLACEHOLDER_NAME, |a| a.handle.client_name())
    }

    /// `<conn_name>-<display name>` for log lines.
    pub fn log_name(&self) -> String {
        match &self.attachment {
            Some(a) => a.handle.log_name(),
            None => format!(
                "{}-{}",
                self.pending.conn_name().unwrap_or_default(),
                PLACEHOLDER_NAME
            ),
        }
    }

    /// Process one line from the client.
    pub async fn handle_line(&mut self, msg: Message) -> Flow {
        if self.closed {
            return Flow::Close;
        }
        trace!(conn = %self.log_name(), line = %msg, "from client");

        let command = ClientCommand::parse(&msg);
        debug!(conn = %self.log_name(), command = command.name(), "Routing");

        let flow = match self.route(command, msg).await {
            Ok(flow) => flow,
            Err(e) => {
                self.fail(&e);
                Flow::Close
            }
        };

        if self.sendq_exceeded() {
            warn!(conn = %self.log_name(), "SendQ exceeded");
            self.closed = true;
            return Flow::Close;
        }
        if flow == Flow::Close {
            self.closed = true;
        }
        flow
    }

    async fn route(&mut self, command: ClientCommand, msg: Message) -> Result<Flow, BouncerError> {
        match command {
            ClientCommand::Tkellem(meta) => {
                if let Some(reply) = meta.reply(&self.current_nick()) {
                    self.send(reply);
                }
            }
            ClientCommand::Pass(password) => {
                self.pending = self.pending.with_password(password.as_deref());
            }
            ClientCommand::User(identity) => {
                self.pending = match identity {
                    Some(id) => self
                        .pending
                        .with_identity(Some(&id.conn_name), id.client_name.as_deref()),
                    None => self.pending.with_identity(None, None),
                };
            }
            ClientCommand::Nick(nick) => {
                if let Some(attachment) = &self.attachment {
                    match nick {
                        Some(nick) => attachment.backend.change_nick(&attachment.handle, &nick).await,
                        None => debug!(conn = %self.log_name(), "NICK without argument ignored"),
                    }
                } else {
                    self.pending = self.pending.with_nick(nick.as_deref().unwrap_or_default());
                    self.attach().await?;
                }
            }
            ClientCommand::Quit => {
                info!(conn = %self.log_name(), "Client quit");
                return Ok(Flow::Close);
            }
            ClientCommand::Ping(token) => {
                self.send(pong(&token));
            }
            ClientCommand::Other => match &self.attachment {
                Some(attachment) => {
                    attachment.backend.forward(msg).await;
                    metrics::record_forward();
                }
                None => {
                    return Err(BouncerError::ProtocolViolation(
                        msg.command.to_ascii_uppercase(),
                    ));
                }
            },
        }
        Ok(Flow::Continue)
    }

    /// Nick used to address bouncer notices to this client.
    fn current_nick(&self) -> String {
        match &self.attachment {
            Some(a) => a.backend.current_nick(),
            None => self.pending.nick().unwrap_or("*").to_owned(),
        }
    }

    /// Queue a line for the client.
    ///
    /// A full queue is recorded on the queue itself and checked after the
    /// current line.
    pub(crate) fn send(&self, msg: Message) {
        let _ = self.queue.push(Outbound::Line(msg));
    }

    /// Terminal failure: reset, emit `ERROR`, close.
    fn fail(&mut self, error: &BouncerError) {
        info!(conn = %self.log_name(), code = error.error_code(), "ERROR :{error}");
        metrics::record_handshake_failure(error.error_code());
        self.pending = PendingCredentials::default();
        self.send(error.to_error_line());
        self.closed = true;
    }

    /// Detach from the backend. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.closed = true;
        if let Some(attachment) = self.attachment.take() {
            attachment.backend.detach(&attachment.handle);
            metrics::record_detach();
            info!(conn = %attachment.handle.log_name(), "disconnected");
        }
    }
}

impl Drop for BouncerSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// `:tkellem PONG tkellem :<token>`
fn pong(token: &str) -> Message {
    Message::new("PONG", [BOUNCER_IDENTITY])
        .with_trailing(token)
        .with_prefix(Prefix::ServerName(BOUNCER_IDENTITY.to_owned()))
}
