use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Status, StoryId};
use crate::Document;

/// A numbered unit of content belonging to exactly one story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "chapters")]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub story_id: StoryId,
    /// Positive, unique within the story.
    pub chapter_number: u32,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub word_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new chapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewChapter {
    pub story_id: StoryId,
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
    pub status: Status,
}

/// Partial edit of a chapter. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChapterChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub chapter_number: Option<u32>,
    pub status: Option<Status>,
}

impl ChapterChanges {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.chapter_number.is_none()
            && self.status.is_none()
    }

    /// Whether the edit carries non-empty content, which is what gets logged.
    pub fn has_content(&self) -> bool {
        self.content
            .as_deref()
            .map(|content| !content.is_empty())
            .unwrap_or(false)
    }
}
