/// Comment form state for the title detail page
///
/// The draft keeps whatever the reader typed until a post succeeds, so a
/// failed submission can be retried without retyping.
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::data::Comment;

/// Lowest and highest star vote
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Please enter your name.")]
    MissingAuthor,
    #[error("Please write a comment.")]
    MissingText,
    #[error("Please pick a rating.")]
    MissingRating,
    #[error("Ratings go from 1 to 5 stars.")]
    RatingOutOfRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub author: String,
    pub text: String,
    pub rating: Option<u8>,
}

impl CommentDraft {
    /// Check the draft and build the comment to post
    pub fn validate(&self, now: DateTime<Utc>) -> Result<Comment, DraftError> {
        let author = self.author.trim();
        let text = self.text.trim();

        if author.is_empty() {
            return Err(DraftError::MissingAuthor);
        }
        if text.is_empty() {
            return Err(DraftError::MissingText);
        }
        let rating = self.rating.ok_or(DraftError::MissingRating)?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(DraftError::RatingOutOfRange);
        }

        Ok(Comment {
            text: text.to_string(),
            author: author.to_string(),
            rating,
            timestamp: now,
        })
    }

    /// Reset after a successful post. The author name is kept.
    pub fn clear_after_post(&mut self) {
        self.text.clear();
        self.rating = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> CommentDraft {
        CommentDraft {
            author: "  Mika ".to_string(),
            text: " Loved the ending! ".to_string(),
            rating: Some(5),
        }
    }

    #[test]
    fn test_valid_draft_is_trimmed() {
        let now = Utc::now();
        let comment = draft().validate(now).unwrap();
        assert_eq!(comment.author, "Mika");
        assert_eq!(comment.text, "Loved the ending!");
        assert_eq!(comment.rating, 5);
        assert_eq!(comment.timestamp, now);
    }

    #[test]
    fn test_missing_fields() {
        let now = Utc::now();

        let mut no_author = draft();
        no_author.author = "   ".to_string();
        assert_eq!(no_author.validate(now), Err(DraftError::MissingAuthor));

        let mut no_text = draft();
        no_text.text.clear();
        assert_eq!(no_text.validate(now), Err(DraftError::MissingText));

        let mut no_rating = draft();
        no_rating.rating = None;
        assert_eq!(no_rating.validate(now), Err(DraftError::MissingRating));

        let mut too_high = draft();
        too_high.rating = Some(6);
        assert_eq!(too_high.validate(now), Err(DraftError::RatingOutOfRange));
    }

    #[test]
    fn test_clear_keeps_author() {
        let mut draft = draft();
        draft.clear_after_post();
        assert_eq!(draft.author, "  Mika ");
        assert!(draft.text.is_empty());
        assert_eq!(draft.rating, None);
    }
}
