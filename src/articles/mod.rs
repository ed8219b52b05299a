//! Articles - Standalone posts with a draft/publish lifecycle.
//!
//! Articles have no parent and no derived fields beyond `publishedAt`,
//! which the commit that first publishes an article stamps and every later
//! write leaves alone.

use std::sync::Arc;

use serde_json::json;

use crate::error::PressError;
use crate::model::{Article, ArticleChanges, NewArticle, Status};
#[cfg(feature = "emitter")]
use crate::notify::LifecycleNotifier;
use crate::notify::{PendingEvents, ARTICLE_PUBLISHED};
use crate::store::{
    Collection, Document, DocumentStore, DocumentsExt, Fields, Filter, Transaction, WriteBatch,
};

pub struct ArticleDesk {
    store: Arc<dyn DocumentStore>,
    #[cfg(feature = "emitter")]
    notifier: Option<Arc<LifecycleNotifier>>,
}

impl ArticleDesk {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            #[cfg(feature = "emitter")]
            notifier: None,
        }
    }

    #[cfg(feature = "emitter")]
    pub fn with_notifier(mut self, notifier: Arc<LifecycleNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn articles(&self) -> Collection<'_, dyn DocumentStore, Article> {
        self.store.collection::<Article>()
    }

    fn publish(&self, events: PendingEvents) {
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

    async fn load(&self, article_id: &str) -> Result<Article, PressError> {
        self.articles()
            .get(article_id)
            .await?
            .map(|article| article.data)
            .ok_or_else(|| PressError::not_found("article", article_id))
    }

    pub async fn create_article(&self, input: NewArticle) -> Result<Article, PressError> {
        PressError::require_title(&input.title)?;

        let article_id = self.store.allocate_id();
        let mut fields = Fields::new()
            .set("id", article_id.as_str())
            .set("title", input.title.trim())
            .set("summary", input.summary.as_str())
            .set("content", input.content.as_str())
            .set_opt("coverImage", input.cover_image.as_deref())
            .set("tags", normalize_tags(input.tags))
            .set("status", input.status.as_str())
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");
        if input.status.is_published() {
            fields = fields.server_timestamp("publishedAt");
        }

        let mut batch = WriteBatch::new();
        batch.create(Article::COLLECTION, &article_id, fields);
        self.store.commit(batch).await.map_err(PressError::from_commit)?;

        tracing::info!(%article_id, status = %input.status, "article created");
        if input.status.is_published() {
            self.announce(&article_id);
        }
        self.load(&article_id).await
    }

    /// Apply a partial edit. The first move into `published` stamps `publishedAt`.
    pub async fn update_article(
        &self,
        article_id: &str,
        changes: ArticleChanges,
    ) -> Result<Article, PressError> {
        if let Some(title) = &changes.title {
            PressError::require_title(title)?;
        }

        let mut tx = Transaction::new(&*self.store);
        let current = tx
            .get::<Article>(article_id)
            .await?
            .ok_or_else(|| PressError::not_found("article", article_id))?
            .data;
        if changes.is_empty() {
            return Ok(current);
        }

        let first_publish = current.published_at.is_none()
            && changes.status.map_or(false, |status| status.is_published());
        let mut fields = Fields::new()
            .set_opt("title", changes.title.as_deref().map(str::trim))
            .set_opt("summary", changes.summary.as_deref())
            .set_opt("content", changes.content.as_deref())
            .set_opt("coverImage", changes.cover_image.as_deref())
            .set_opt("tags", changes.tags.map(normalize_tags))
            .set_opt("status", changes.status.map(|status| status.as_str()))
            .server_timestamp("updatedAt");
        if first_publish {
            fields = fields.server_timestamp("publishedAt");
        }
        tx.update(Article::COLLECTION, article_id, fields);
        tx.commit().await.map_err(PressError::from_commit)?;

        tracing::info!(article_id, first_publish, "article updated");
        if first_publish {
            self.announce(article_id);
        }
        self.load(article_id).await
    }

    pub async fn get_article(&self, article_id: &str) -> Result<Article, PressError> {
        self.load(article_id).await
    }

    /// All articles, most recently updated first.
    pub async fn list_articles(&self) -> Result<Vec<Article>, PressError> {
        let mut articles: Vec<Article> = self
            .articles()
            .all()
            .await?
            .into_iter()
            .map(|article| article.data)
            .collect();
        articles.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(articles)
    }

    /// Published articles, most recently published first.
    pub async fn list_published(&self) -> Result<Vec<Article>, PressError> {
        let mut articles: Vec<Article> = self
            .articles()
            .find(&Filter::eq("status", Status::Published.as_str()))
            .await?
            .into_iter()
            .map(|article| article.data)
            .collect();
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(articles)
    }

    pub async fn delete_article(&self, article_id: &str) -> Result<(), PressError> {
        let mut tx = Transaction::new(&*self.store);
        if tx.get::<Article>(article_id).await?.is_none() {
            return Err(PressError::not_found("article", article_id));
        }
        tx.delete(Article::COLLECTION, article_id);
        tx.commit().await.map_err(PressError::from_commit)?;

        tracing::info!(article_id, "article deleted");
        Ok(())
    }

    fn announce(&self, article_id: &str) {
        let mut events = PendingEvents::new();
        events.enqueue(ARTICLE_PUBLISHED, json!({ "articleId": article_id }));
        self.publish(events);
    }
}

/// Trim tags, dropping blanks and repeats while keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|seen| seen == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}
