use serde_json::json;

use crate::error::PressError;
use crate::media::{FallbackUploader, ImageUploader, UploadRequest};
use crate::model::{Chapter, NewStory, Status, Story, StoryChanges};
use crate::notify::{PendingEvents, STORY_DELETED};
use crate::store::{Document, Fields, Filter, Transaction, WriteBatch};

use super::manager::ConsistencyManager;

impl ConsistencyManager {
    pub async fn create_story(&self, input: NewStory) -> Result<Story, PressError> {
        PressError::require_title(&input.title)?;

        let story_id = self.store.allocate_id();
        let category = input.category.unwrap_or_default();
        let mut batch = WriteBatch::new();
        batch.create(
            Story::COLLECTION,
            &story_id,
            Fields::new()
                .set("id", story_id.as_str())
                .set("title", input.title.trim())
                .set("description", input.description.as_str())
                .set("category", category.as_str())
                .set("status", input.status.as_str())
                .set_opt("coverImage", input.cover_image.as_deref())
                .set("chapterCount", 0u32)
                .server_timestamp("createdAt")
                .server_timestamp("updatedAt"),
        );
        self.store.commit(batch).await.map_err(PressError::from_commit)?;

        tracing::info!(%story_id, status = %input.status, "story created");
        self.load_story(&story_id).await
    }

    /// Direct edit of a story. Moves `updatedAt` to the commit time.
    ///
    /// An empty change set writes nothing and returns the story as stored.
    pub async fn update_story(
        &self,
        story_id: &str,
        changes: StoryChanges,
    ) -> Result<Story, PressError> {
        if let Some(title) = &changes.title {
            PressError::require_title(title)?;
        }

        let mut tx = Transaction::new(&*self.store);
        let current = tx
            .get::<Story>(story_id)
            .await?
            .ok_or_else(|| PressError::not_found("story", story_id))?;
        if changes.is_empty() {
            return Ok(current.data);
        }

        tx.update(
            Story::COLLECTION,
            story_id,
            Fields::new()
                .set_opt("title", changes.title.as_deref().map(str::trim))
                .set_opt("description", changes.description.as_deref())
                .set_opt(
                    "category",
                    changes.category.as_ref().map(|category| category.as_str()),
                )
                .set_opt("status", changes.status.map(|status| status.as_str()))
                .set_opt("coverImage", changes.cover_image.as_deref())
                .server_timestamp("updatedAt"),
        );
        tx.commit().await.map_err(PressError::from_commit)?;

        tracing::info!(story_id, "story updated");
        self.load_story(story_id).await
    }

    /// Set or clear the story's cover image URL.
    pub async fn set_story_cover(
        &self,
        story_id: &str,
        cover_url: Option<String>,
    ) -> Result<Story, PressError> {
        let mut tx = Transaction::new(&*self.store);
        if tx.get::<Story>(story_id).await?.is_none() {
            return Err(PressError::not_found("story", story_id));
        }
        let cleared = cover_url.is_none();
        tx.update(
            Story::COLLECTION,
            story_id,
            Fields::new()
                .set("coverImage", cover_url)
                .server_timestamp("updatedAt"),
        );
        tx.commit().await.map_err(PressError::from_commit)?;

        tracing::info!(story_id, cleared, "story cover changed");
        self.load_story(story_id).await
    }

    /// Upload an image and make it the story's cover.
    ///
    /// The story is checked first so a missing story never costs an upload.
    pub async fn attach_cover<U: ImageUploader>(
        &self,
        story_id: &str,
        uploader: &FallbackUploader<U>,
        request: &UploadRequest,
    ) -> Result<Story, PressError> {
        self.load_story(story_id).await?;
        let image = uploader.upload(request).await?;
        self.set_story_cover(story_id, Some(image.url)).await
    }

    pub async fn get_story(&self, story_id: &str) -> Result<Story, PressError> {
        self.load_story(story_id).await
    }

    /// All stories, most recently updated first.
    pub async fn list_stories(&self) -> Result<Vec<Story>, PressError> {
        let stories = self.stories().all().await?;
        Ok(newest_first(stories.into_iter().map(|story| story.data).collect()))
    }

    pub async fn list_stories_by_status(&self, status: Status) -> Result<Vec<Story>, PressError> {
        let stories = self
            .stories()
            .find(&Filter::eq("status", status.as_str()))
            .await?;
        Ok(newest_first(stories.into_iter().map(|story| story.data).collect()))
    }

    /// Delete a story together with all of its chapters.
    ///
    /// Deletes run in atomic batches no larger than the configured or
    /// store-imposed write limit, chapters first and the story in the last
    /// batch. A cascade that fits one batch is all-or-nothing. A failure after
    /// at least one batch committed is reported as `PartialCascadeFailure`;
    /// calling again finishes the job, including when only orphaned chapters
    /// are left.
    pub async fn delete_story(&self, story_id: &str) -> Result<(), PressError> {
        let _guard = self.story_locks.acquire(story_id).await?;

        let story_exists = self.stories().get(story_id).await?.is_some();
        let chapter_ids: Vec<String> = self
            .chapters()
            .find(&Filter::eq("storyId", story_id))
            .await?
            .into_iter()
            .map(|chapter| chapter.data.id)
            .collect();
        if !story_exists && chapter_ids.is_empty() {
            return Err(PressError::not_found("story", story_id));
        }

        let mut targets: Vec<(&str, &str)> = chapter_ids
            .iter()
            .map(|id| (Chapter::COLLECTION, id.as_str()))
            .collect();
        if story_exists {
            targets.push((Story::COLLECTION, story_id));
        }

        let limit = self
            .config
            .max_batch_writes
            .min(self.store.max_batch_writes())
            .max(1);
        let mut committed_batches = 0usize;
        let mut deleted = 0usize;

        for chunk in targets.chunks(limit) {
            let mut batch = WriteBatch::new();
            for (collection, id) in chunk {
                batch.delete(collection, id);
            }

            if let Err(err) = self.store.commit(batch).await {
                let remaining = chapter_ids.len() - deleted;
                tracing::warn!(
                    story_id,
                    committed_batches,
                    deleted,
                    remaining,
                    error = %err,
                    "story cascade delete failed"
                );
                if committed_batches == 0 {
                    return Err(PressError::from_commit(err));
                }
                return Err(PressError::PartialCascadeFailure {
                    story_id: story_id.to_string(),
                    deleted,
                    remaining,
                    source: err,
                });
            }

            committed_batches += 1;
            deleted += chunk
                .iter()
                .filter(|(collection, _)| *collection == Chapter::COLLECTION)
                .count();
        }

        tracing::info!(
            story_id,
            chapters = deleted,
            batches = committed_batches,
            orphans_only = !story_exists,
            "story deleted"
        );
        let mut events = PendingEvents::new();
        events.enqueue(
            STORY_DELETED,
            json!({ "storyId": story_id, "chaptersDeleted": deleted }),
        );
        self.publish(events);
        Ok(())
    }
}

fn newest_first(mut stories: Vec<Story>) -> Vec<Story> {
    stories.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    stories
}
