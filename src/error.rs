use crate::media::UploadError;
use crate::store::StoreError;

/// Error type for consistency manager, article and upload operations.
#[derive(Debug, thiserror::Error)]
pub enum PressError {
    /// A referenced story, chapter or article does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Another chapter of the story already uses this number.
    #[error("chapter number {chapter_number} is already used in story {story_id}")]
    DuplicateChapterNumber {
        story_id: String,
        chapter_number: u32,
    },

    /// A concurrent writer invalidated the commit; nothing was written.
    #[error("transaction aborted: {0}")]
    TransactionAborted(#[source] StoreError),

    /// A cascade delete committed some batches before failing.
    #[error(
        "cascade delete of story {story_id} stopped after {deleted} chapter(s), {remaining} remaining: {source}"
    )]
    PartialCascadeFailure {
        story_id: String,
        deleted: usize,
        remaining: usize,
        #[source]
        source: StoreError,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl PressError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        PressError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Classify a failed commit. Nothing was written in any case.
    ///
    /// Conflicts with other writers abort the transaction, a write aimed at
    /// a document that is gone is `NotFound`, anything else is a store failure.
    pub(crate) fn from_commit(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } | StoreError::AlreadyExists { .. } => {
                PressError::TransactionAborted(err)
            }
            StoreError::NotFound { collection, id } => PressError::NotFound {
                kind: kind_of(&collection),
                id,
            },
            other => PressError::Store(other),
        }
    }

    pub(crate) fn require_title(title: &str) -> Result<(), Self> {
        if title.trim().is_empty() {
            return Err(PressError::Validation("title must not be empty".into()));
        }
        Ok(())
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            PressError::NotFound { .. } => 404,
            PressError::DuplicateChapterNumber { .. } => 409,
            PressError::TransactionAborted(_) => 409,
            PressError::PartialCascadeFailure { .. } => 500,
            PressError::Validation(_) => 422,
            PressError::Store(_) => 500,
            PressError::Upload(_) => 502,
            PressError::LockPoisoned(_) => 500,
        }
    }
}

fn kind_of(collection: &str) -> &'static str {
    match collection {
        "stories" => "story",
        "chapters" => "chapter",
        "edit_logs" => "edit log entry",
        "articles" => "article",
        _ => "document",
    }
}
