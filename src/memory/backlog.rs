//! Bounded per-room history.

use crate::backend::Backlog;
use crate::client::ClientHandle;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tkellem_proto::{Message, irc_to_lower};
use tracing::debug;

#[derive(Debug, Default)]
struct Rooms {
    /// Folded room names in first-seen order.
    order: Vec<String>,
    lines: HashMap<String, VecDeque<Message>>,
}

/// Backlog keeping the last `capacity` lines of every room.
#[derive(Debug)]
pub struct MemoryBacklog {
    capacity: usize,
    rooms: Mutex<Rooms>,
}

impl MemoryBacklog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            rooms: Mutex::new(Rooms::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a line to `room`'s history, evicting the oldest when full.
    pub fn record(&self, room: &str, msg: Message) {
        let key = irc_to_lower(room);
        let mut rooms = self.rooms.lock();
        if !rooms.lines.contains_key(&key) {
            rooms.order.push(key.clone());
        }
        let lines = rooms.lines.entry(key).or_default();
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(msg);
    }

    /// Number of lines held for `room`.
    pub fn len(&self, room: &str) -> usize {
        self.rooms
            .lock()
            .lines
            .get(&irc_to_lower(room))
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.lock().lines.values().all(VecDeque::is_empty)
    }

    fn snapshot(&self, room: Option<&str>) -> Vec<Message> {
        let rooms = self.rooms.lock();
        match room {
            Some(room) => rooms
                .lines
                .get(&irc_to_lower(room))
                .map(|lines| lines.iter().cloned().collect())
                .unwrap_or_default(),
            None => rooms
                .order
                .iter()
                .filter_map(|key| rooms.lines.get(key))
                .flat_map(|lines| lines.iter().cloned())
                .collect(),
        }
    }
}

#[async_trait]
impl Backlog for MemoryBacklog {
    async fn replay(&self, client: &ClientHandle, room: Option<&str>) {
        let lines = self.snapshot(room);
        debug!(
            conn = %client.log_name(),
            room = room.unwrap_or("*"),
            count = lines.len(),
            "Replaying backlog"
        );
        for line in lines {
            if client.send(line).is_err() {
                break;
            }
        }
    }
}
