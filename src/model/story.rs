use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Status};
use crate::Document;

/// Typed reference from a chapter or edit log entry to its story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(String);

impl StoryId {
    pub fn new(id: impl Into<String>) -> Self {
        StoryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StoryId {
    fn from(id: &str) -> Self {
        StoryId(id.to_string())
    }
}

impl From<String> for StoryId {
    fn from(id: String) -> Self {
        StoryId(id)
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A serialized work made of numbered chapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "stories")]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Number of chapters referencing this story.
    #[serde(default)]
    pub chapter_count: u32,
    pub created_at: DateTime<Utc>,
    /// Last direct edit or chapter publication.
    pub updated_at: DateTime<Utc>,
}

impl Story {
    pub fn story_id(&self) -> StoryId {
        StoryId::new(self.id.clone())
    }
}

/// Input for a new story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStory {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub status: Status,
    pub cover_image: Option<String>,
}

impl NewStory {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial edit of a story. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub cover_image: Option<String>,
}

impl StoryChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.status.is_none()
            && self.cover_image.is_none()
    }
}
