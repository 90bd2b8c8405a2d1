//! Attach: turning collected credentials into a backend attachment.

use super::{Attachment, BouncerSession, PendingCredentials};
use crate::client::ClientHandle;
use crate::error::BouncerError;
use crate::metrics;
use tkellem_proto::irc_to_lower;
use tracing::{debug, info};

impl BouncerSession {
    /// Resolve, authenticate and attach using the pending credentials.
    ///
    /// Any failure leaves the session exactly as pristine as a fresh one:
    /// no pending credentials and no attachment.
    pub(super) async fn attach(&mut self) -> Result<(), BouncerError> {
        let pending = std::mem::take(&mut self.pending);

        match self.try_attach(&pending).await {
            Ok(attachment) => {
                self.attachment = Some(attachment);
                self.after_attach().await;
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "Attach failed, credentials reset");
                Err(e)
            }
        }
    }

    async fn try_attach(&self, pending: &PendingCredentials) -> Result<Attachment, BouncerError> {
        let requested = pending.conn_name().unwrap_or_default();
        let conn_name = irc_to_lower(requested);

        let backend = self
            .registry
            .resolve(&conn_name)
            .filter(|backend| backend.is_connected())
            .ok_or_else(|| BouncerError::UnknownConnection(requested.to_owned()))?;

        let nick = pending.nick().unwrap_or_default();
        if !self
            .registry
            .authenticate(nick, pending.password(), backend.as_ref())
            .await
        {
            return Err(BouncerError::BadAuth);
        }

        // A USER line with a lone token names only the backend.
        let client_name = pending.client_name().unwrap_or(nick);
        let handle = ClientHandle::new(
            self.id,
            requested,
            client_name,
            self.transport_secure,
            self.queue.clone(),
        );

        let backlog = backend
            .attach(handle.clone())
            .await
            .ok_or_else(|| BouncerError::UnknownClient(client_name.to_owned()))?;

        Ok(Attachment {
            backend,
            backlog,
            handle,
        })
    }

    /// Bring a freshly attached client up to date: welcome burst, full
    /// backlog, then a simulated join for every room already joined.
    async fn after_attach(&mut self) {
        let Some(attachment) = &self.attachment else {
            return;
        };
        info!(conn = %attachment.handle.log_name(), secure = self.transport_secure, "connected");
        metrics::record_attach();

        attachment.backend.send_welcome(&attachment.handle).await;
        attachment.backlog.replay(&attachment.handle, None).await;
        metrics::record_replay("full");
        self.simulate_joins().await;
    }
}
