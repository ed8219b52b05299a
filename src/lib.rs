extern crate self as serial_press;

mod articles;
mod config;
mod consistency;
mod error;
mod media;
mod model;
mod notify;
mod store;

#[cfg(feature = "http")]
pub mod http;

pub use articles::ArticleDesk;
pub use config::{ConfigError, PressConfig, UploadConfig};
pub use consistency::{ConsistencyManager, Outcome, SecondaryEffectWarning};
pub use error::PressError;
pub use media::{
    FallbackUploader, ImageUploader, InMemoryImageHost, UploadError, UploadRequest, UploadedImage,
};
pub use model::{
    word_count, Article, ArticleChanges, Category, Chapter, ChapterChanges, EditLogEntry,
    NewArticle, NewChapter, NewStory, Status, Story, StoryChanges, StoryId,
};
#[cfg(feature = "emitter")]
pub use notify::LifecycleNotifier;
pub use notify::{
    LifecycleEvent, ARTICLE_PUBLISHED, CHAPTER_CREATED, CHAPTER_DELETED, CHAPTER_PUBLISHED,
    STORY_DELETED,
};
pub use store::{
    Collection, CommitReceipt, Document, DocumentStore, DocumentsExt, FieldValue, Fields, Filter,
    InMemoryDocumentStore, Precondition, StoreError, StoredDocument, Transaction, Versioned,
    WriteBatch, WriteOp, DEFAULT_MAX_BATCH_WRITES,
};

// Derive macro for `Document`, sharing the trait's name.
pub use serial_press_macros::Document;

// Re-export async_trait so custom stores can implement `DocumentStore`.
pub use async_trait::async_trait;
