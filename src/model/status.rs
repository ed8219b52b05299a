use std::fmt;

use serde::{Deserialize, Serialize};

/// Publication state shared by stories, chapters and articles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    #[serde(alias = "Draft")]
    Draft,
    #[serde(alias = "Published")]
    Published,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, Status::Published)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form genre tag for a story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub const DEFAULT: &'static str = "Original";

    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if tag.trim().is_empty() {
            Self::default()
        } else {
            Category(tag.trim().to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Category(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
