//! Consistency - Keeps stories and their chapters in agreement.
//!
//! The [`ConsistencyManager`] owns the rules, not the data:
//!
//! - a story's `chapterCount` follows the number of chapters that reference it;
//! - a story's `updatedAt` moves only on a direct edit of the story or when
//!   one of its chapters enters `published` (draft edits, renumbering and
//!   count changes leave it alone);
//! - every chapter update carrying content appends one edit log entry in the
//!   same commit.
//!
//! Primary writes and their required side effects commit as one batch.
//! Recomputing the chapter count needs a collection query and runs as a
//! follow-up write; if that fails, the operation still succeeds and reports
//! a [`SecondaryEffectWarning`] in its [`Outcome`].

mod chapters;
mod locks;
mod manager;
mod outcome;
mod stories;

pub use manager::ConsistencyManager;
pub use outcome::{Outcome, SecondaryEffectWarning};
