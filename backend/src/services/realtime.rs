//! Realtime notification hub
//!
//! Events are published to named rooms (`farm:<id>`, `region:<id>`) over one
//! shared broadcast channel. Each [`Subscription`] keeps its own room set and
//! filters the stream; delivery is at-most-once and lagging subscribers skip
//! whatever they missed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Event names pushed to subscribers
pub mod events {
    pub const FARM_NOTIFICATION: &str = "farm-notification";
    pub const WEATHER_ALERT: &str = "weather-alert";
    pub const SCAN_UPDATE: &str = "scan-update";
    pub const OUTBREAK_ALERT: &str = "outbreak-alert";
    pub const TREATMENT_PROGRESS: &str = "treatment-progress";
    pub const WEATHER_NOTIFICATION: &str = "weather-notification";
}

pub fn farm_room(farm_id: &str) -> String {
    format!("farm:{}", farm_id)
}

pub fn region_room(region_id: &str) -> String {
    format!("region:{}", region_id)
}

/// Add a server timestamp to object payloads that do not carry one
pub fn stamp_payload(mut payload: Value) -> Value {
    if let Value::Object(map) = &mut payload {
        if !map.contains_key("timestamp") {
            map.insert("timestamp".to_string(), json!(Utc::now()));
        }
    }
    payload
}

/// Delivers named events to room subscribers
pub trait NotificationSink: Send + Sync {
    fn emit_to_room(&self, room: &str, event: &str, payload: Value);

    fn emit_to_farm(&self, farm_id: &str, event: &str, payload: Value) {
        self.emit_to_room(&farm_room(farm_id), event, payload);
    }

    fn emit_to_region(&self, region_id: &str, event: &str, payload: Value) {
        self.emit_to_room(&region_room(region_id), event, payload);
    }
}

/// One event addressed to one room
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomMessage {
    pub event: String,
    pub room: String,
    pub data: Value,
}

/// In-process room hub backed by a broadcast channel
#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<Arc<RoomMessage>>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// New subscriber with no joined rooms
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            rooms: HashSet::new(),
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Apply one client message for `subscription`.
    ///
    /// Room membership events change the subscription; relay events are
    /// re-published to the farm or region named in their payload.
    pub fn handle_client_event(
        &self,
        subscription: &mut Subscription,
        message: ClientEvent,
    ) -> AppResult<()> {
        let ClientEvent { event, data } = message;

        match event.as_str() {
            "join-farm" => {
                subscription.join(farm_room(&target_id(&data, "farmId")?));
            }
            "leave-farm" => {
                subscription.leave(&farm_room(&target_id(&data, "farmId")?));
            }
            "join-region" => {
                subscription.join(region_room(&target_id(&data, "regionId")?));
            }
            "leave-region" => {
                subscription.leave(&region_room(&target_id(&data, "regionId")?));
            }
            "new-outbreak" => {
                let region = target_id(&data, "region")?;
                self.emit_to_region(&region, events::OUTBREAK_ALERT, data);
            }
            "weather-alert" => {
                let region = target_id(&data, "region")?;
                self.emit_to_region(&region, events::WEATHER_NOTIFICATION, data);
            }
            "scan-complete" => {
                let farm_id = target_id(&data, "farmId")?;
                self.emit_to_farm(&farm_id, events::SCAN_UPDATE, data);
            }
            "treatment-update" => {
                let farm_id = target_id(&data, "farmId")?;
                self.emit_to_farm(&farm_id, events::TREATMENT_PROGRESS, data);
            }
            other => {
                return Err(AppError::ValidationError(format!(
                    "Unknown event: {}",
                    other
                )))
            }
        }

        tracing::debug!(subscriber = %subscription.id(), %event, "Handled client event");
        Ok(())
    }
}

impl NotificationSink for RealtimeHub {
    fn emit_to_room(&self, room: &str, event: &str, payload: Value) {
        let message = RoomMessage {
            event: event.to_string(),
            room: room.to_string(),
            data: stamp_payload(payload),
        };

        // No receivers is not an error: nobody is listening right now.
        if self.sender.send(Arc::new(message)).is_err() {
            tracing::trace!(room, event, "No subscribers for event");
        }
    }
}

/// Message sent by a connected client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// Accepts either a bare string id or an object carrying `key`
fn target_id(data: &Value, key: &'static str) -> AppResult<String> {
    let id = match data {
        Value::String(id) => Some(id.as_str()),
        Value::Object(map) => map.get(key).and_then(Value::as_str),
        _ => None,
    };

    match id {
        Some(id) if !id.trim().is_empty() => Ok(id.to_string()),
        _ => Err(AppError::Validation {
            field: key.to_string(),
            message: format!("{} is required", key),
        }),
    }
}

/// A subscriber's view of the hub
pub struct Subscription {
    id: Uuid,
    rooms: HashSet<String>,
    receiver: broadcast::Receiver<Arc<RoomMessage>>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns false when already joined
    pub fn join(&mut self, room: impl Into<String>) -> bool {
        self.rooms.insert(room.into())
    }

    pub fn leave(&mut self, room: &str) -> bool {
        self.rooms.remove(room)
    }

    pub fn is_member(&self, room: &str) -> bool {
        self.rooms.contains(room)
    }

    /// Next message for a joined room; `None` once the hub is gone
    pub async fn recv(&mut self) -> Option<Arc<RoomMessage>> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.rooms.contains(&message.room) => return Some(message),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscriber = %self.id, skipped, "Subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`]
    pub fn try_recv(&mut self) -> Option<Arc<RoomMessage>> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) if self.rooms.contains(&message.room) => return Some(message),
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
