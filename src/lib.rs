//! tkellem - IRC bouncer client connection handling.
//!
//! One [`Connection`] runs per client socket. It authenticates the client to
//! the bouncer, attaches it to a shared upstream [`BackendSession`], replays
//! missed history from a [`Backlog`] and then proxies lines in both
//! directions.
//!
//! ```text
//!  client socket ──▶ IrcCodec ──▶ BouncerSession ──▶ BackendSession::forward
//!        ▲                              │
//!        └──── outbound queue ◀─────────┴──── ClientHandle (backend, backlog)
//! ```
//!
//! The upstream IRC connection manager, the persistent backlog store and the
//! listener setup live outside this crate and plug in through the traits in
//! [`backend`].

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod network;
pub mod security;
pub mod session;

pub use backend::{BackendSession, Backlog, ClientSet, Registry};
pub use client::{ClientHandle, ClientId, DEFAULT_SENDQ, Outbound};
pub use config::Config;
pub use error::{BouncerError, ConnectionError, SendError};
pub use memory::{MemoryBacklog, StaticRegistry};
pub use network::Connection;
pub use session::{BouncerSession, Flow, HandshakeState};

/// Identity the bouncer uses as the source of its own synthetic lines.
pub const BOUNCER_IDENTITY: &str = "tkellem";
