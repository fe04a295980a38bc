use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::event_types::category_of;
use crate::routes::Route;

const BUS_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Loading,
    Success,
    Error,
    Info,
}

/// A transient, dismissible notification. Publishing a toast with the id of
/// an existing one replaces it in place (a loading toast turning into a
/// success toast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    pub level: ToastLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEventKind {
    Toast(Toast),
    Dismiss { toast_id: String },
    Navigate { route: Route },
    SessionChanged { authenticated: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiEvent {
    pub id: String,
    pub seq: i64,
    pub kind: UiEventKind,
    pub created_at: String,
}

pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
    seq: AtomicI64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            seq: AtomicI64::new(0),
        }
    }

    /// Publish a pre-built event onto the bus.
    pub fn publish(&self, event: UiEvent) {
        let category = category_of(&event);
        let seq = event.seq;
        match self.tx.send(event) {
            Ok(receivers) => tracing::trace!(category, seq, receivers, "ui event published"),
            // No view attached.
            Err(_) => tracing::trace!(category, seq, "ui event dropped (no receivers)"),
        }
    }

    /// Build and publish an event in one call.
    pub fn emit(&self, kind: UiEventKind) -> UiEvent {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = UiEvent {
            id: Uuid::new_v4().to_string(),
            seq,
            kind,
            created_at: Utc::now().to_rfc3339(),
        };
        self.publish(event.clone());
        event
    }

    /// Show a toast with a fresh id and return that id.
    pub fn toast(&self, level: ToastLevel, message: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.toast_with_id(&id, level, message);
        id
    }

    /// Show or replace the toast identified by `id`.
    pub fn toast_with_id(&self, id: &str, level: ToastLevel, message: impl Into<String>) {
        self.emit(UiEventKind::Toast(Toast {
            id: id.to_string(),
            level,
            message: message.into(),
        }));
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.toast(ToastLevel::Error, message)
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.toast(ToastLevel::Success, message)
    }

    pub fn dismiss(&self, toast_id: &str) {
        self.emit(UiEventKind::Dismiss {
            toast_id: toast_id.to_string(),
        });
    }

    pub fn navigate(&self, route: Route) {
        self.emit(UiEventKind::Navigate { route });
    }

    /// Get a new receiver for this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }
}
