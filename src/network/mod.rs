//! Network module.
//!
//! Drives one client socket through a [`BouncerSession`](crate::BouncerSession).
//! Accepting sockets and transport encryption are left to the embedder.

mod codec;
mod connection;

pub use codec::ClientCodec;
pub use connection::Connection;
