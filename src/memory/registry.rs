//! Name → backend map with config-driven accounts.

use crate::backend::{BackendSession, Registry};
use crate::config::{AccountConfig, Config};
use crate::security::verify_password;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tkellem_proto::irc_to_lower;
use tracing::{debug, warn};

/// Registry backed by a fixed account table.
///
/// Backends are registered at runtime; accounts come from configuration.
#[derive(Default)]
pub struct StaticRegistry {
    backends: DashMap<String, Arc<dyn BackendSession>>,
    accounts: DashMap<String, AccountConfig>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every `[[account]]` in `config`.
    pub fn from_config(config: &Config) -> Self {
        let registry = Self::new();
        for account in &config.account {
            registry.add_account(account.clone());
        }
        registry
    }

    pub fn add_account(&self, account: AccountConfig) {
        self.accounts.insert(irc_to_lower(&account.nick), account);
    }

    /// Register `backend` under `name`, replacing any previous entry.
    pub fn register(&self, name: &str, backend: Arc<dyn BackendSession>) {
        self.backends.insert(irc_to_lower(name), backend);
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn BackendSession>> {
        self.backends.remove(&irc_to_lower(name)).map(|(_, b)| b)
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn BackendSession>> {
        self.backends
            .get(&irc_to_lower(name))
            .map(|entry| Arc::clone(entry.value()))
    }

    async fn authenticate(
        &self,
        nick: &str,
        password: Option<&str>,
        backend: &dyn BackendSession,
    ) -> bool {
        let Some(password) = password else {
            debug!(nick, "No password supplied");
            return false;
        };
        let Some(account) = self
            .accounts
            .get(&irc_to_lower(nick))
            .map(|entry| entry.value().clone())
        else {
            debug!(nick, "No such account");
            return false;
        };
        if !account.allows_network(backend.name()) {
            debug!(nick, network = backend.name(), "Account not allowed on network");
            return false;
        }

        let password = password.to_owned();
        let hash = account.password_hash;
        match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
            Ok(Ok(valid)) => valid,
            Ok(Err(e)) => {
                warn!(nick, error = %e, "Stored password hash is unusable");
                false
            }
            Err(e) => {
                warn!(nick, error = %e, "Password verification task failed");
                false
            }
        }
    }
}
