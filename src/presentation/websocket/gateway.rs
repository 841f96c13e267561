//! WebSocket Gateway
//!
//! Tracks connected devices per event and fans server messages out to
//! each device's outgoing channel.

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerMessage;

/// One connected device's outgoing channel.
struct Connection {
    sender: mpsc::UnboundedSender<ServerMessage>,
}

/// WebSocket gateway managing per-event audience rooms.
pub struct EventGateway {
    /// event_id -> device_id -> connection
    rooms: DashMap<i64, DashMap<Uuid, Connection>>,
}

impl EventGateway {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Register a device's connection in an event room.
    ///
    /// A reconnect from the same device replaces the old channel, so a
    /// device never holds two live connections in one room.
    pub fn register(
        &self,
        event_id: i64,
        device_id: Uuid,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) {
        self.rooms
            .entry(event_id)
            .or_default()
            .insert(device_id, Connection { sender });

        tracing::info!(event_id, device_id = %device_id, "Device joined sync room");
    }

    /// Remove a device's connection; drops the room when it empties.
    pub fn unregister(&self, event_id: i64, device_id: Uuid) {
        if let Some(room) = self.rooms.get(&event_id) {
            room.remove(&device_id);
            tracing::info!(event_id, device_id = %device_id, "Device left sync room");
        }

        self.rooms.remove_if(&event_id, |_, room| room.is_empty());
    }

    /// Send a message to every device in an event room.
    pub fn broadcast(&self, event_id: i64, message: ServerMessage) {
        if let Some(room) = self.rooms.get(&event_id) {
            for conn in room.iter() {
                let _ = conn.value().sender.send(message.clone());
            }
        }
    }

    /// Send a message to every device in a room except the originator.
    pub fn broadcast_except(&self, event_id: i64, origin: Uuid, message: ServerMessage) {
        if let Some(room) = self.rooms.get(&event_id) {
            for conn in room.iter() {
                if *conn.key() != origin {
                    let _ = conn.value().sender.send(message.clone());
                }
            }
        }
    }

    /// Number of devices connected to an event room.
    pub fn room_size(&self, event_id: i64) -> usize {
        self.rooms.get(&event_id).map(|r| r.len()).unwrap_or(0)
    }

    /// Total connections across all rooms.
    pub fn connection_count(&self) -> usize {
        self.rooms.iter().map(|r| r.len()).sum()
    }
}

impl Default for EventGateway {
    fn default() -> Self {
        Self::new()
    }
}
