//! Application event system.
//!
//! Components publish state changes on a broadcast channel instead of
//! calling each other directly: the settings sync announces a saved
//! configuration, the live data coordinator announces a refreshed
//! view, and failures are surfaced as [`AppEvent::Fault`] so a
//! frontend can show them without unwinding the engine.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Which part of the engine a fault came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultContext {
    /// Joint live snapshot + settings fetch.
    LiveData,
    /// History range query.
    History,
    /// Threshold configuration load/save.
    Settings,
}

/// Events emitted by the engine.
///
/// All events are serializable for logging and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event
/// types in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum AppEvent {
    /// The live view (snapshot + settings + status map) was replaced.
    LiveUpdated,
    /// A threshold configuration was saved successfully. The live
    /// data coordinator re-evaluates on this event.
    SettingsSaved,
    /// A new history series was applied.
    HistoryUpdated,
    /// A user-visible failure. Prior state is unchanged.
    Fault {
        /// Where the failure happened.
        context: FaultContext,
        /// Human-readable message.
        message: String,
    },
}

/// Sender for application events.
pub type EventSender = broadcast::Sender<AppEvent>;

/// Receiver for application events.
pub type EventReceiver = broadcast::Receiver<AppEvent>;

/// Event dispatcher for fanning events out to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: AppEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Send a fault event.
    pub fn fault(&self, context: FaultContext, message: impl Into<String>) {
        self.send(AppEvent::Fault {
            context,
            message: message.into(),
        });
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
