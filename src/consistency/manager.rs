use std::sync::Arc;

use crate::config::PressConfig;
use crate::error::PressError;
use crate::model::{Chapter, EditLogEntry, Story};
use crate::notify::PendingEvents;
#[cfg(feature = "emitter")]
use crate::notify::LifecycleNotifier;
use crate::store::{
    Collection, Document, DocumentStore, DocumentsExt, Fields, Filter, WriteBatch,
};

use super::locks::KeyedLocks;
use super::outcome::{Outcome, SecondaryEffectWarning};

pub(super) const CHAPTER_COUNT_EFFECT: &str = "chapter_count";

/// Enforces the story/chapter invariants on top of an injected document store.
pub struct ConsistencyManager {
    pub(super) store: Arc<dyn DocumentStore>,
    pub(super) config: PressConfig,
    pub(super) story_locks: KeyedLocks,
    #[cfg(feature = "emitter")]
    notifier: Option<Arc<LifecycleNotifier>>,
}

impl ConsistencyManager {
    pub fn new(store: Arc<dyn DocumentStore>, config: PressConfig) -> Self {
        Self {
            store,
            config,
            story_locks: KeyedLocks::new(),
            #[cfg(feature = "emitter")]
            notifier: None,
        }
    }

    /// Deliver lifecycle events to `notifier` after each successful commit.
    #[cfg(feature = "emitter")]
    pub fn with_notifier(mut self, notifier: Arc<LifecycleNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &PressConfig {
        &self.config
    }

    pub(super) fn stories(&self) -> Collection<'_, dyn DocumentStore, Story> {
        self.store.collection::<Story>()
    }

    pub(super) fn chapters(&self) -> Collection<'_, dyn DocumentStore, Chapter> {
        self.store.collection::<Chapter>()
    }

    pub(super) fn edit_logs(&self) -> Collection<'_, dyn DocumentStore, EditLogEntry> {
        self.store.collection::<EditLogEntry>()
    }

    pub(super) fn publish(&self, events: PendingEvents) {
        #[cfg(feature = "emitter")]
        {
            if let Some(notifier) = &self.notifier {
                notifier.emit_all(events.into_events());
            }
        }
        #[cfg(not(feature = "emitter"))]
        {
            let _ = events;
        }
    }

    pub(super) async fn load_story(&self, story_id: &str) -> Result<Story, PressError> {
        self.stories()
            .get(story_id)
            .await?
            .map(|story| story.data)
            .ok_or_else(|| PressError::not_found("story", story_id))
    }

    pub(super) async fn load_chapter(&self, chapter_id: &str) -> Result<Chapter, PressError> {
        self.chapters()
            .get(chapter_id)
            .await?
            .map(|chapter| chapter.data)
            .ok_or_else(|| PressError::not_found("chapter", chapter_id))
    }

    /// Reject `chapter_number` if another chapter of the story already uses it.
    pub(super) async fn ensure_number_free(
        &self,
        story_id: &str,
        chapter_number: u32,
        except_chapter: Option<&str>,
    ) -> Result<(), PressError> {
        let taken = self
            .chapters()
            .find(
                &Filter::eq("storyId", story_id).and_eq("chapterNumber", chapter_number),
            )
            .await?
            .into_iter()
            .any(|chapter| Some(chapter.data.id.as_str()) != except_chapter);

        if taken {
            return Err(PressError::DuplicateChapterNumber {
                story_id: story_id.to_string(),
                chapter_number,
            });
        }
        Ok(())
    }

    /// Recompute the story's chapter count from the live chapters and persist it.
    ///
    /// Never touches `updatedAt`.
    pub async fn recount_chapters(&self, story_id: &str) -> Result<u32, PressError> {
        self.load_story(story_id).await?;
        let live = self
            .chapters()
            .count(&Filter::eq("storyId", story_id))
            .await?;
        let count = u32::try_from(live).unwrap_or(u32::MAX);

        let mut batch = WriteBatch::new();
        batch.update(
            Story::COLLECTION,
            story_id,
            Fields::new().set("chapterCount", count),
        );
        self.store.commit(batch).await.map_err(PressError::from_commit)?;

        tracing::debug!(story_id, count, "chapter count persisted");
        Ok(count)
    }

    /// Best-effort recount: failures become a warning on `outcome`.
    pub(super) async fn sync_chapter_count<T>(&self, story_id: &str, outcome: &mut Outcome<T>) {
        if let Err(err) = self.recount_chapters(story_id).await {
            tracing::warn!(story_id, error = %err, "chapter count update failed");
            outcome.warn(SecondaryEffectWarning {
                effect: CHAPTER_COUNT_EFFECT,
                story_id: story_id.to_string(),
                message: err.to_string(),
            });
        }
    }
}
