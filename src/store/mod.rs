/// Content store access
///
/// The content store is the hosted document database that holds every
/// title, chapter map and comment. This module defines the interface the
/// reader consumes and two implementations:
/// - `firestore.rs` - Firestore REST API over reqwest
/// - `memory.rs` - in-process store seeded from a JSON fixture
/// - `codec.rs` - Firestore typed-value documents <-> reader types
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::data::{ComicRecord, ComicSummary, Comment, Panel, RatingUpdate};

pub mod codec;
pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("request failed: {0}")]
    Transport(Arc<reqwest::Error>),
    #[error("store responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed document: {0}")]
    Decode(String),
    #[error("could not read fixture: {0}")]
    Fixture(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(Arc::new(err))
    }
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Reject ids that cannot name a document in the `contents` collection
pub(crate) fn check_id(id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(StoreError::NotFound(format!("comic {id:?}")));
    }
    Ok(())
}

/// Everything the reader reads from or writes to the content store
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Listing fields of every title
    async fn fetch_comic_summaries(&self) -> Result<Vec<ComicSummary>, StoreError>;

    /// Full record of one title
    async fn fetch_comic_by_id(&self, id: &str) -> Result<ComicRecord, StoreError>;

    /// Comments of one title, newest first
    async fn fetch_comments(&self, id: &str) -> Result<Vec<Comment>, StoreError>;

    /// Append a comment to a title's comment collection
    async fn add_comment(&self, id: &str, comment: &Comment) -> Result<(), StoreError>;

    /// Overwrite a title's average rating, vote count and comment count
    async fn update_rating(&self, id: &str, update: RatingUpdate) -> Result<(), StoreError>;

    /// Overwrite a title's like counter. Concurrent writers race; the last one wins.
    async fn update_like_count(&self, id: &str, likes: u32) -> Result<(), StoreError>;

    /// Panels of one chapter in reading order
    async fn fetch_panels_by_chapter(
        &self,
        id: &str,
        chapter: u32,
    ) -> Result<Vec<Panel>, StoreError> {
        let record = self.fetch_comic_by_id(id).await?;
        record
            .panels(chapter)
            .ok_or_else(|| StoreError::NotFound(format!("chapter {chapter} of {id:?}")))
    }

    /// Post a comment, fold its vote into the title's average rating and
    /// bump its comment count.
    ///
    /// The read-modify-write of the totals is not atomic: two readers
    /// posting at once can lose one vote.
    async fn post_comment(&self, id: &str, comment: &Comment) -> Result<RatingUpdate, StoreError> {
        self.add_comment(id, comment).await?;

        let record = self.fetch_comic_by_id(id).await?;
        let update = RatingUpdate::after_comment(&record, comment.rating);
        self.update_rating(id, update).await?;

        tracing::info!(
            comic = id,
            rating = update.rating,
            votes = update.rating_count,
            comments = update.comments_count,
            "Comment posted"
        );
        Ok(update)
    }
}
