use std::sync::Mutex;

use event_emitter_rs::EventEmitter;

use super::LifecycleEvent;

/// Delivers lifecycle events to in-process listeners.
///
/// Listeners receive the JSON payload as a string. Delivery is asynchronous:
/// `event-emitter-rs` runs each listener on its own thread.
pub struct LifecycleNotifier {
    emitter: Mutex<EventEmitter>,
}

impl Default for LifecycleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleNotifier {
    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Register a listener for an event type such as `chapter.published`.
    pub fn on<F>(&self, event_type: &str, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        match self.emitter.lock() {
            Ok(mut emitter) => {
                emitter.on(event_type, listener);
            }
            Err(_) => tracing::warn!(event_type, "notifier lock poisoned, listener dropped"),
        }
    }

    /// Emit events that belong to a committed operation.
    pub fn emit_all(&self, events: Vec<LifecycleEvent>) {
        if events.is_empty() {
            return;
        }
        let Ok(mut emitter) = self.emitter.lock() else {
            tracing::warn!(count = events.len(), "notifier lock poisoned, events dropped");
            return;
        };
        for event in events {
            tracing::debug!(event_type = event.event_type, "emitting lifecycle event");
            emitter.emit(event.event_type, event.payload.to_string());
        }
    }
}
