//! Client handles held by backends and backlogs.
//!
//! A [`ClientHandle`] is the only way anything outside a connection task can
//! reach that connection. Every write goes through the connection's own
//! bounded outbound queue (its SendQ), so a backend pushing replies or a
//! backlog replaying history never waits on the client socket. A full queue
//! is reported to the sender and marks the connection for disconnect.

use crate::error::SendError;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tkellem_proto::Message;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Default outbound queue length, in lines.
pub const DEFAULT_SENDQ: usize = 4096;

/// Unique id of one bouncer connection.
pub type ClientId = Uuid;

/// Items queued for delivery to a client socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Write the line as-is.
    Line(Message),
    /// A reply to something this client asked the backend for.
    ///
    /// Written as-is, then inspected by the session (end of `NAMES`
    /// triggers a room backlog replay).
    Transient(Message),
}

impl Outbound {
    /// The line carried by this item.
    pub fn message(&self) -> &Message {
        match self {
            Outbound::Line(msg) | Outbound::Transient(msg) => msg,
        }
    }
}

/// Receiver half of a connection's outbound queue.
pub type OutboundReceiver = mpsc::Receiver<Outbound>;

/// Sender half of a connection's outbound queue.
///
/// Shared by the session and every [`ClientHandle`] it gives out. Once any
/// push finds the queue full, the whole queue stays marked as exceeded.
#[derive(Debug, Clone)]
pub(crate) struct SendQueue {
    tx: mpsc::Sender<Outbound>,
    exceeded: Arc<AtomicBool>,
}

/// Create an outbound queue holding at most `len` lines.
pub(crate) fn send_queue(len: usize) -> (SendQueue, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(len.max(1));
    let queue = SendQueue {
        tx,
        exceeded: Arc::new(AtomicBool::new(false)),
    };
    (queue, rx)
}

impl SendQueue {
    pub(crate) fn push(&self, item: Outbound) -> Result<(), SendError> {
        self.tx.try_send(item).map_err(|err| match err {
            TrySendError::Full(_) => {
                self.exceeded.store(true, Ordering::Relaxed);
                SendError::SendQExceeded
            }
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    pub(crate) fn is_exceeded(&self) -> bool {
        self.exceeded.load(Ordering::Relaxed)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Capability for one attached client connection.
///
/// Cheap to clone; equality is by connection id.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    conn_name: Arc<str>,
    client_name: Arc<str>,
    secure: bool,
    queue: SendQueue,
}

impl ClientHandle {
    pub(crate) fn new(
        id: ClientId,
        conn_name: &str,
        client_name: &str,
        secure: bool,
        queue: SendQueue,
    ) -> Self {
        Self {
            id,
            conn_name: Arc::from(conn_name),
            client_name: Arc::from(client_name),
            secure,
            queue,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Backend connection name the client asked for.
    pub fn conn_name(&self) -> &str {
        &self.conn_name
    }

    /// Display name the client negotiated (e.g. `laptop`).
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Whether the client socket is encrypted.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// `<conn_name>-<client_name>`, used as a log field.
    pub fn log_name(&self) -> String {
        format!("{}-{}", self.conn_name, self.client_name)
    }

    /// Queue a line for this client.
    ///
    /// Fails with [`SendError::SendQExceeded`] when the client is not keeping
    /// up; the connection is then closed and the handle should be dropped.
    pub fn send(&self, msg: Message) -> Result<(), SendError> {
        self.queue.push(Outbound::Line(msg))
    }

    /// Queue a reply addressed to this client only.
    pub fn transient_response(&self, msg: Message) -> Result<(), SendError> {
        self.queue.push(Outbound::Transient(msg))
    }

    /// Whether the connection task has gone away.
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClientHandle {}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("id", &self.id)
            .field("conn_name", &self.conn_name)
            .field("client_name", &self.client_name)
            .field("secure", &self.secure)
            .finish()
    }
}
