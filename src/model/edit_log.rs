use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoryId;
use crate::Document;

/// Append-only record of a chapter content edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "edit_logs")]
#[serde(rename_all = "camelCase")]
pub struct EditLogEntry {
    pub id: String,
    pub story_id: StoryId,
    pub chapter_id: String,
    /// Commit time of the update that produced the entry.
    pub edited_at: DateTime<Utc>,
}
