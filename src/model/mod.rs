//! Records managed by the admin backend and the inputs that create or change them.

mod article;
mod chapter;
mod edit_log;
mod status;
mod story;
mod word_count;

pub use article::{Article, ArticleChanges, NewArticle};
pub use chapter::{Chapter, ChapterChanges, NewChapter};
pub use edit_log::EditLogEntry;
pub use status::{Category, Status};
pub use story::{NewStory, Story, StoryChanges, StoryId};
pub use word_count::word_count;
