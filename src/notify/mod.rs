//! Notify - Lifecycle notifications emitted after successful commits.
//!
//! Operations queue [`LifecycleEvent`]s while they build their writes and
//! hand them to a [`LifecycleNotifier`] only once the commit has landed, so
//! subscribers never hear about work that was rolled back.
//!
//! Requires the `emitter` feature for delivery; the event types are always
//! available.

#[cfg(feature = "emitter")]
mod notifier;

use serde::Serialize;
use serde_json::Value;

#[cfg(feature = "emitter")]
pub use notifier::LifecycleNotifier;

pub const CHAPTER_CREATED: &str = "chapter.created";
pub const CHAPTER_PUBLISHED: &str = "chapter.published";
pub const CHAPTER_DELETED: &str = "chapter.deleted";
pub const STORY_DELETED: &str = "story.deleted";
pub const ARTICLE_PUBLISHED: &str = "article.published";

/// A notification waiting for its commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent {
    pub event_type: &'static str,
    pub payload: Value,
}

impl LifecycleEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Events queued during one operation.
#[derive(Debug, Default)]
pub(crate) struct PendingEvents {
    events: Vec<LifecycleEvent>,
}

impl PendingEvents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&mut self, event_type: &'static str, payload: Value) {
        self.events.push(LifecycleEvent::new(event_type, payload));
    }

    #[cfg_attr(not(feature = "emitter"), allow(dead_code))]
    pub(crate) fn into_events(self) -> Vec<LifecycleEvent> {
        self.events
    }
}
