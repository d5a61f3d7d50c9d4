/// Shared data structures for the reader
///
/// These structs represent the content model that flows between
/// the content store and the UI layer.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Chapter number -> panel image URLs, in reading order
pub type ChapterMap = BTreeMap<u32, Vec<String>>;

/// A single image of a comic chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    /// Remote image URL
    pub image: String,
}

/// The fields needed to list a title (landing grid, hero rotator)
#[derive(Debug, Clone, PartialEq)]
pub struct ComicSummary {
    pub id: String,
    pub title: String,
    /// Average rating (0.0 - 5.0)
    pub rating: f64,
    pub description: String,
    /// Thumbnail image URL
    pub thumbnail: String,
    pub genre: Vec<String>,
}

/// A full comic/story document
#[derive(Debug, Clone, PartialEq)]
pub struct ComicRecord {
    pub id: String,
    pub title: String,
    /// Average rating over `rating_count` votes
    pub rating: f64,
    pub rating_count: u32,
    pub likes: u32,
    pub description: String,
    pub chapters: ChapterMap,
    pub genre: Vec<String>,
    pub thumbnail: String,
    pub author: String,
    pub comments_count: u32,
}

impl ComicRecord {
    /// Project the record down to its listing fields
    pub fn summary(&self) -> ComicSummary {
        ComicSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            rating: self.rating,
            description: self.description.clone(),
            thumbnail: self.thumbnail.clone(),
            genre: self.genre.clone(),
        }
    }

    /// Panels of one chapter, or None if the chapter does not exist
    pub fn panels(&self, chapter: u32) -> Option<Vec<Panel>> {
        self.chapters.get(&chapter).map(|urls| {
            urls.iter()
                .map(|url| Panel { image: url.clone() })
                .collect()
        })
    }

    /// Chapter numbers in ascending order
    pub fn chapter_numbers(&self) -> Vec<u32> {
        self.chapters.keys().copied().collect()
    }

    pub fn first_chapter(&self) -> Option<u32> {
        self.chapters.keys().next().copied()
    }

    pub fn latest_chapter(&self) -> Option<u32> {
        self.chapters.keys().next_back().copied()
    }
}

/// A reader comment with its star vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub author: String,
    /// Star vote, 1 to 5
    pub rating: u8,
    pub timestamp: DateTime<Utc>,
}

/// A title's totals after one more comment and its vote have been counted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub rating: f64,
    pub rating_count: u32,
    pub comments_count: u32,
}

impl RatingUpdate {
    /// Fold a new vote into the running average and count the comment
    pub fn after_comment(record: &ComicRecord, vote: u8) -> Self {
        let count = record.rating_count;
        let rating_count = count + 1;
        let rating =
            (record.rating * f64::from(count) + f64::from(vote)) / f64::from(rating_count);
        Self {
            rating,
            rating_count,
            comments_count: record.comments_count + 1,
        }
    }
}

/// The `chapter` field as stored documents may contain it.
///
/// Current documents key panel lists by chapter number. Older documents
/// hold a single flat list of panel URLs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawChapters {
    Keyed(BTreeMap<String, Vec<String>>),
    Flat(Vec<String>),
}

impl RawChapters {
    /// Normalize to the canonical chapter map.
    ///
    /// A flat list becomes chapter 1. Keys that are not chapter numbers
    /// are dropped.
    pub fn normalize(self, comic_id: &str) -> ChapterMap {
        match self {
            RawChapters::Flat(urls) => {
                let mut chapters = ChapterMap::new();
                chapters.insert(1, urls);
                chapters
            }
            RawChapters::Keyed(keyed) => keyed
                .into_iter()
                .filter_map(|(key, urls)| match key.trim().parse::<u32>() {
                    Ok(number) => Some((number, urls)),
                    Err(_) => {
                        warn!(comic = comic_id, key = %key, "Skipping chapter with non-numeric key");
                        None
                    }
                })
                .collect(),
        }
    }
}
