//! Recording collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tkellem::{BackendSession, Backlog, ClientHandle, ClientSet, Registry};
use tkellem_proto::{Message, Prefix, irc_to_lower};

/// Backlog that records replay requests and emits one marker line per call.
#[derive(Default)]
pub struct MockBacklog {
    replays: Mutex<Vec<Option<String>>>,
}

impl MockBacklog {
    pub fn replays(&self) -> Vec<Option<String>> {
        self.replays.lock().clone()
    }
}

#[async_trait]
impl Backlog for MockBacklog {
    async fn replay(&self, client: &ClientHandle, room: Option<&str>) {
        self.replays.lock().push(room.map(str::to_owned));
        let _ = client.send(
            Message::new("NOTICE", [client.client_name()])
                .with_trailing(format!("replay {}", room.unwrap_or("*"))),
        );
    }
}

/// Upstream session double.
pub struct MockBackend {
    name: String,
    connected: AtomicBool,
    refuse: AtomicBool,
    nick: Mutex<String>,
    rooms: Vec<String>,
    pub clients: ClientSet,
    pub backlog: Arc<MockBacklog>,
    forwarded: Mutex<Vec<Message>>,
    nick_changes: Mutex<Vec<String>>,
    attaches: AtomicUsize,
    detaches: AtomicUsize,
}

impl MockBackend {
    pub fn new(name: &str, nick: &str, rooms: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_owned(),
            connected: AtomicBool::new(true),
            refuse: AtomicBool::new(false),
            nick: Mutex::new(nick.to_owned()),
            rooms: rooms.iter().map(|r| (*r).to_owned()).collect(),
            clients: ClientSet::new(),
            backlog: Arc::new(MockBacklog::default()),
            forwarded: Mutex::new(Vec::new()),
            nick_changes: Mutex::new(Vec::new()),
            attaches: AtomicUsize::new(0),
            detaches: AtomicUsize::new(0),
        })
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make `attach` return no backlog.
    pub fn refuse_clients(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    pub fn forwarded(&self) -> Vec<String> {
        self.forwarded.lock().iter().map(ToString::to_string).collect()
    }

    pub fn nick_changes(&self) -> Vec<String> {
        self.nick_changes.lock().clone()
    }

    pub fn attaches(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    pub fn detaches(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }

    /// Deliver an upstream reply to every attached client's transient path.
    pub fn reply_transient(&self, msg: Message) {
        for client in self.clients.handles() {
            self.clients.route_transient(client.id(), msg.clone());
        }
    }
}

#[async_trait]
impl BackendSession for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn attach(&self, client: ClientHandle) -> Option<Arc<dyn Backlog>> {
        if self.refuse.load(Ordering::SeqCst) {
            return None;
        }
        self.attaches.fetch_add(1, Ordering::SeqCst);
        self.clients.insert(client);
        Some(self.backlog.clone() as Arc<dyn Backlog>)
    }

    fn detach(&self, client: &ClientHandle) {
        self.detaches.fetch_add(1, Ordering::SeqCst);
        self.clients.remove(client);
    }

    fn current_nick(&self) -> String {
        self.nick.lock().clone()
    }

    fn joined_rooms(&self) -> Vec<String> {
        self.rooms.clone()
    }

    async fn forward(&self, msg: Message) {
        self.forwarded.lock().push(msg);
    }

    async fn change_nick(&self, _client: &ClientHandle, nick: &str) {
        self.nick_changes.lock().push(nick.to_owned());
        *self.nick.lock() = nick.to_owned();
    }

    async fn send_welcome(&self, client: &ClientHandle) {
        let nick = self.current_nick();
        let _ = client.send(
            Message::new("001", [nick.as_str()])
                .with_trailing("Welcome to the Internet Relay Network")
                .with_prefix(Prefix::ServerName("irc.example".to_owned())),
        );
    }
}

/// Registry with a fixed password table.
#[derive(Default)]
pub struct MockRegistry {
    backends: Mutex<HashMap<String, Arc<MockBackend>>>,
    passwords: Mutex<HashMap<String, String>>,
    auth_calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_backend(&self, backend: Arc<MockBackend>) {
        self.backends
            .lock()
            .insert(irc_to_lower(backend.name()), backend);
    }

    pub fn add_user(&self, nick: &str, password: &str) {
        self.passwords
            .lock()
            .insert(nick.to_owned(), password.to_owned());
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Registry for MockRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn BackendSession>> {
        self.backends
            .lock()
            .get(name)
            .map(|b| Arc::clone(b) as Arc<dyn BackendSession>)
    }

    async fn authenticate(
        &self,
        nick: &str,
        password: Option<&str>,
        _backend: &dyn BackendSession,
    ) -> bool {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        let passwords = self.passwords.lock();
        matches!((passwords.get(nick), password), (Some(expected), Some(given)) if expected == given)
    }
}

/// Registry holding one user `alice`/`secret` and the given backend.
pub fn standard_registry(backend: &Arc<MockBackend>) -> Arc<MockRegistry> {
    let registry = MockRegistry::new();
    registry.add_backend(Arc::clone(backend));
    registry.add_user("alice", "secret");
    registry
}
