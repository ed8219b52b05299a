use serde_json::json;

use crate::error::PressError;
use crate::model::{word_count, Chapter, ChapterChanges, EditLogEntry, NewChapter, Story};
use crate::notify::{PendingEvents, CHAPTER_CREATED, CHAPTER_DELETED, CHAPTER_PUBLISHED};
use crate::store::{Document, Fields, Filter, Transaction};

use super::manager::ConsistencyManager;
use super::outcome::Outcome;

fn require_number(chapter_number: u32) -> Result<(), PressError> {
    if chapter_number == 0 {
        return Err(PressError::Validation(
            "chapter number must be positive".into(),
        ));
    }
    Ok(())
}

fn new_chapter_fields(chapter_id: &str, input: &NewChapter) -> Fields {
    Fields::new()
        .set("id", chapter_id)
        .set("storyId", input.story_id.as_str())
        .set("chapterNumber", input.chapter_number)
        .set("title", input.title.trim())
        .set("content", input.content.as_str())
        .set("status", input.status.as_str())
        .set("wordCount", word_count(&input.content))
        .server_timestamp("createdAt")
        .server_timestamp("updatedAt")
}

fn changed_fields(changes: &ChapterChanges) -> Fields {
    let mut fields = Fields::new()
        .set_opt("title", changes.title.as_deref().map(str::trim))
        .set_opt("chapterNumber", changes.chapter_number)
        .set_opt("status", changes.status.map(|status| status.as_str()))
        .server_timestamp("updatedAt");
    if let Some(content) = &changes.content {
        fields = fields
            .set("content", content.as_str())
            .set("wordCount", word_count(content));
    }
    fields
}

impl ConsistencyManager {
    /// Create a chapter and apply its effects on the parent story.
    ///
    /// The chapter and, for a published chapter, the story's `updatedAt`
    /// commit together. The chapter count is recomputed afterwards.
    pub async fn create_chapter(&self, input: NewChapter) -> Result<Outcome<Chapter>, PressError> {
        PressError::require_title(&input.title)?;
        require_number(input.chapter_number)?;

        let story_id = input.story_id.as_str().to_string();
        let _guard = self.story_locks.acquire(&story_id).await?;
        self.ensure_number_free(&story_id, input.chapter_number, None)
            .await?;

        let mut tx = Transaction::new(&*self.store);
        if tx.get::<Story>(&story_id).await?.is_none() {
            return Err(PressError::not_found("story", story_id));
        }

        let chapter_id = self.store.allocate_id();
        tx.create(
            Chapter::COLLECTION,
            &chapter_id,
            new_chapter_fields(&chapter_id, &input),
        );

        let mut events = PendingEvents::new();
        let payload = json!({ "storyId": story_id, "chapterId": chapter_id });
        events.enqueue(CHAPTER_CREATED, payload.clone());
        if input.status.is_published() {
            tx.update(
                Story::COLLECTION,
                &story_id,
                Fields::new().server_timestamp("updatedAt"),
            );
            events.enqueue(CHAPTER_PUBLISHED, payload);
        }

        let receipt = tx.commit().await.map_err(PressError::from_commit)?;
        tracing::info!(
            %story_id,
            %chapter_id,
            chapter_number = input.chapter_number,
            status = %input.status,
            commit_time = %receipt.commit_time,
            "chapter created"
        );
        self.publish(events);

        let mut outcome = Outcome::clean(self.load_chapter(&chapter_id).await?);
        self.sync_chapter_count(&story_id, &mut outcome).await;
        Ok(outcome)
    }

    /// Apply a partial edit to a chapter in one atomic commit.
    ///
    /// A transition into `published` from any other status also moves the
    /// parent story's `updatedAt` to the commit time. Non-empty content
    /// appends one edit log entry stamped with the same commit time.
    pub async fn update_chapter(
        &self,
        chapter_id: &str,
        changes: ChapterChanges,
    ) -> Result<Outcome<Chapter>, PressError> {
        if let Some(title) = &changes.title {
            PressError::require_title(title)?;
        }
        if let Some(chapter_number) = changes.chapter_number {
            require_number(chapter_number)?;
        }

        let story_id = self.load_chapter(chapter_id).await?.story_id;
        let _guard = self.story_locks.acquire(story_id.as_str()).await?;

        let mut tx = Transaction::new(&*self.store);
        let current = tx
            .get::<Chapter>(chapter_id)
            .await?
            .ok_or_else(|| PressError::not_found("chapter", chapter_id))?
            .data;

        if let Some(chapter_number) = changes.chapter_number {
            if chapter_number != current.chapter_number {
                self.ensure_number_free(story_id.as_str(), chapter_number, Some(chapter_id))
                    .await?;
            }
        }

        let was_published = current.status.is_published();
        let becomes_published =
            !was_published && changes.status.map_or(false, |status| status.is_published());

        let mut events = PendingEvents::new();
        if becomes_published {
            if tx.get::<Story>(story_id.as_str()).await?.is_none() {
                return Err(PressError::not_found("story", story_id.as_str()));
            }
            tx.update(
                Story::COLLECTION,
                story_id.as_str(),
                Fields::new().server_timestamp("updatedAt"),
            );
            events.enqueue(
                CHAPTER_PUBLISHED,
                json!({ "storyId": story_id, "chapterId": chapter_id }),
            );
        }

        if changes.has_content() {
            let entry_id = self.store.allocate_id();
            tx.create(
                EditLogEntry::COLLECTION,
                &entry_id,
                Fields::new()
                    .set("id", entry_id.as_str())
                    .set("storyId", story_id.as_str())
                    .set("chapterId", chapter_id)
                    .server_timestamp("editedAt"),
            );
        }

        tx.update(Chapter::COLLECTION, chapter_id, changed_fields(&changes));

        let receipt = tx.commit().await.map_err(PressError::from_commit)?;
        tracing::info!(
            %story_id,
            chapter_id,
            published_transition = becomes_published,
            logged_edit = changes.has_content(),
            commit_time = %receipt.commit_time,
            "chapter updated"
        );
        self.publish(events);

        Ok(Outcome::clean(self.load_chapter(chapter_id).await?))
    }

    /// Delete a chapter, then recompute its story's chapter count.
    ///
    /// The story's `updatedAt` is left alone.
    pub async fn delete_chapter(&self, chapter_id: &str) -> Result<Outcome<()>, PressError> {
        let mut tx = Transaction::new(&*self.store);
        let chapter = tx
            .get::<Chapter>(chapter_id)
            .await?
            .ok_or_else(|| PressError::not_found("chapter", chapter_id))?
            .data;
        let story_id = chapter.story_id.as_str().to_string();

        let _guard = self.story_locks.acquire(&story_id).await?;
        tx.delete(Chapter::COLLECTION, chapter_id);
        tx.commit().await.map_err(PressError::from_commit)?;

        tracing::info!(%story_id, chapter_id, "chapter deleted");
        let mut events = PendingEvents::new();
        events.enqueue(
            CHAPTER_DELETED,
            json!({ "storyId": story_id, "chapterId": chapter_id }),
        );
        self.publish(events);

        let mut outcome = Outcome::clean(());
        self.sync_chapter_count(&story_id, &mut outcome).await;
        Ok(outcome)
    }

    pub async fn get_chapter(&self, chapter_id: &str) -> Result<Chapter, PressError> {
        self.load_chapter(chapter_id).await
    }

    /// Chapters of a story in reading order.
    pub async fn list_chapters(&self, story_id: &str) -> Result<Vec<Chapter>, PressError> {
        let mut chapters: Vec<Chapter> = self
            .chapters()
            .find(&Filter::eq("storyId", story_id))
            .await?
            .into_iter()
            .map(|chapter| chapter.data)
            .collect();
        chapters.sort_by_key(|chapter| chapter.chapter_number);
        Ok(chapters)
    }

    /// `1` for a story without chapters, otherwise one past the highest number.
    ///
    /// Concurrent callers can receive the same number; `create_chapter`
    /// rejects the loser with `DuplicateChapterNumber`.
    pub async fn next_chapter_number(&self, story_id: &str) -> Result<u32, PressError> {
        let highest = self
            .chapters()
            .find(&Filter::eq("storyId", story_id))
            .await?
            .into_iter()
            .map(|chapter| chapter.data.chapter_number)
            .max();
        Ok(highest.map_or(1, |number| number.saturating_add(1)))
    }

    /// Most recent content edits across all stories, newest first.
    pub async fn recent_edits(&self, limit: Option<usize>) -> Result<Vec<EditLogEntry>, PressError> {
        let limit = limit.unwrap_or(self.config.recent_activity_limit);
        let mut entries: Vec<EditLogEntry> = self
            .edit_logs()
            .all()
            .await?
            .into_iter()
            .map(|entry| entry.data)
            .collect();
        entries.sort_by(|a, b| b.edited_at.cmp(&a.edited_at));
        entries.truncate(limit);
        Ok(entries)
    }

    /// Edit history of one chapter, newest first.
    pub async fn chapter_edits(&self, chapter_id: &str) -> Result<Vec<EditLogEntry>, PressError> {
        let mut entries: Vec<EditLogEntry> = self
            .edit_logs()
            .find(&Filter::eq("chapterId", chapter_id))
            .await?
            .into_iter()
            .map(|entry| entry.data)
            .collect();
        entries.sort_by(|a, b| b.edited_at.cmp(&a.edited_at));
        Ok(entries)
    }
}
