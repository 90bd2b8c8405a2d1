//! Join simulation and room-scoped backlog replay.
//!
//! A client attaching mid-session never saw the original `JOIN`s. For each
//! room the backend is in, the client gets a synthetic `JOIN` and the
//! backend is asked for `NAMES`. When the matching end-of-names (366)
//! comes back through the transient path, that room's history is replayed,
//! so the client sees members first and history second.

use super::BouncerSession;
use crate::metrics;
use tkellem_proto::{Message, Prefix};
use tracing::debug;

/// `RPL_ENDOFNAMES`
pub const RPL_ENDOFNAMES: u16 = 366;

/// Host part of synthetic join prefixes.
const SYNTHETIC_HOST: &str = "tkellem";

impl BouncerSession {
    /// Synthesize `JOIN` + `NAMES` for every room the backend has joined,
    /// in the backend's room order.
    pub(super) async fn simulate_joins(&self) {
        let Some(attachment) = &self.attachment else {
            return;
        };
        let nick = attachment.backend.current_nick();
        let client_name = attachment.handle.client_name();

        for room in attachment.backend.joined_rooms() {
            debug!(conn = %attachment.handle.log_name(), room = %room, "Simulating join");
            self.send(
                Message::new("JOIN", [room.as_str()])
                    .with_prefix(Prefix::new(nick.as_str(), client_name, SYNTHETIC_HOST)),
            );
            attachment
                .backend
                .forward(Message::new("NAMES", [room.as_str()]))
                .await;
        }
    }

    /// Inspect a backend reply that has just been written to this client.
    ///
    /// End of `NAMES` for a room triggers that room's backlog replay.
    pub async fn transient_response(&self, msg: &Message) {
        if msg.numeric() != Some(RPL_ENDOFNAMES) {
            return;
        }
        let (Some(attachment), Some(room)) = (&self.attachment, msg.arg(1)) else {
            return;
        };

        debug!(conn = %attachment.handle.log_name(), room = %room, "got final NAMES, sending backlog");
        attachment.backlog.replay(&attachment.handle, Some(room)).await;
        metrics::record_replay("room");
    }
}
