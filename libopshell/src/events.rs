//! Event bus for navigation and dialog lifecycle
//!
//! Uses `tokio::sync::broadcast` so any number of observers (status bars,
//! the `opshell-nav` JSON output, tests) can follow transitions without the
//! controller ever blocking on them. Emitting with no subscribers is free.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<ShellEvent>;

/// Broadcast bus for [`ShellEvent`]s
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ShellEvent>,
}

impl EventBus {
    /// Create a new event bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Never blocks. Lagging subscribers lose their oldest events.
    pub fn emit(&self, event: ShellEvent) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Events emitted by the controller and the modal registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    /// A transition passed the same-key check and began tearing down
    TransitionStarted {
        id: String,
        from: String,
        to: String,
    },

    /// A same-key transition was short-circuited
    TransitionSkipped { to: String },

    /// The destination page loaded and is now current
    TransitionCompleted { id: String, route: String },

    /// The destination failed; the controller is recovering onto the
    /// default route
    RecoveryStarted { id: String, requested: String },

    /// The destination failed and the default route was loaded instead
    TransitionFellBack {
        id: String,
        requested: String,
        error: String,
    },

    /// The outgoing page's cleanup failed; navigation continued anyway
    CleanupFailed { route: String, error: String },

    /// A dialog became the active modal
    DialogOpened { dialog: String },

    /// The active modal was torn down
    DialogClosed { dialog: String },

    /// Tearing down a dialog failed; the registry released it anyway
    DialogDestroyFailed { dialog: String, error: String },
}
