/// In-process content store
///
/// Seeded from a JSON fixture so the reader can run without network
/// access, and used as the store double in tests. Writes are kept in
/// memory for the lifetime of the process.
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::Deserialize;

use super::{check_id, ContentStore, StoreError};
use crate::state::data::{ComicRecord, ComicSummary, Comment, RatingUpdate, RawChapters};

/// Top level of a fixture file
#[derive(Debug, Deserialize)]
struct Fixture {
    contents: Vec<FixtureComic>,
}

/// A title as written in a fixture file; field names follow the stored documents
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureComic {
    id: String,
    title: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    rating_count: u32,
    #[serde(default)]
    likes: u32,
    #[serde(default)]
    description: String,
    chapter: Option<RawChapters>,
    #[serde(default)]
    genre: Vec<String>,
    #[serde(default)]
    thumbnail: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Clone)]
struct Entry {
    record: ComicRecord,
    comments: Vec<Comment>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file
    pub fn from_fixture(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Fixture(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), "Loaded content fixture");
        Ok(store)
    }

    /// Parse fixture JSON
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let fixture: Fixture =
            serde_json::from_str(json).map_err(|e| StoreError::Fixture(e.to_string()))?;

        let store = Self::new();
        for comic in fixture.contents {
            let chapters = comic
                .chapter
                .map(|raw| raw.normalize(&comic.id))
                .unwrap_or_default();
            let record = ComicRecord {
                id: comic.id,
                title: comic.title,
                rating: comic.rating,
                rating_count: comic.rating_count,
                likes: comic.likes,
                description: comic.description,
                chapters,
                genre: comic.genre,
                thumbnail: comic.thumbnail,
                author: comic.author,
                comments_count: comic.comments.len() as u32,
            };
            store.insert(record, comic.comments);
        }
        Ok(store)
    }

    /// Add or replace a title
    pub fn insert(&self, record: ComicRecord, comments: Vec<Comment>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(record.id.clone(), Entry { record, comments });
    }

    fn read<T>(&self, id: &str, f: impl FnOnce(&Entry) -> T) -> Result<T, StoreError> {
        check_id(id)?;
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .map(f)
            .ok_or_else(|| StoreError::NotFound(format!("comic {id:?}")))
    }

    fn write<T>(&self, id: &str, f: impl FnOnce(&mut Entry) -> T) -> Result<T, StoreError> {
        check_id(id)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .get_mut(id)
            .map(f)
            .ok_or_else(|| StoreError::NotFound(format!("comic {id:?}")))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn fetch_comic_summaries(&self) -> Result<Vec<ComicSummary>, StoreError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.values().map(|entry| entry.record.summary()).collect())
    }

    async fn fetch_comic_by_id(&self, id: &str) -> Result<ComicRecord, StoreError> {
        self.read(id, |entry| entry.record.clone())
    }

    async fn fetch_comments(&self, id: &str) -> Result<Vec<Comment>, StoreError> {
        self.read(id, |entry| {
            let mut comments = entry.comments.clone();
            comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            comments
        })
    }

    async fn add_comment(&self, id: &str, comment: &Comment) -> Result<(), StoreError> {
        self.write(id, |entry| {
            entry.comments.push(comment.clone());
        })
    }

    async fn update_rating(&self, id: &str, update: RatingUpdate) -> Result<(), StoreError> {
        self.write(id, |entry| {
            entry.record.rating = update.rating;
            entry.record.rating_count = update.rating_count;
            entry.record.comments_count = update.comments_count;
        })
    }

    async fn update_like_count(&self, id: &str, likes: u32) -> Result<(), StoreError> {
        self.write(id, |entry| entry.record.likes = likes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::viewer::{PanelViewer, ViewMode};
    use chrono::{TimeZone, Utc};

    const FIXTURE: &str = r#"{
        "contents": [
            {
                "id": "why-me",
                "title": "Why Me",
                "rating": 4.0,
                "ratingCount": 3,
                "likes": 12,
                "author": "Ana Cruz",
                "genre": ["Drama"],
                "thumbnail": "https://cdn.example/why-me.png",
                "chapter": {"1": ["https://cdn.example/1/a.png", "https://cdn.example/1/b.png", "https://cdn.example/1/c.png"], "2": []},
                "comments": [
                    {"text": "First!", "author": "Jo", "rating": 4, "timestamp": "2025-01-01T00:00:00Z"},
                    {"text": "Later", "author": "Mo", "rating": 4, "timestamp": "2025-02-01T00:00:00Z"}
                ]
            },
            {
                "id": "ocean-door",
                "title": "Beyond the Ocean Door",
                "chapter": ["https://cdn.example/od/1.png"]
            }
        ]
    }"#;

    fn store() -> MemoryStore {
        MemoryStore::from_json(FIXTURE).unwrap()
    }

    #[tokio::test]
    async fn test_summaries() {
        let summaries = store().fetch_comic_summaries().await.unwrap();
        let ids: Vec<_> = summaries.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ocean-door", "why-me"]);
    }

    #[tokio::test]
    async fn test_panels_by_chapter() {
        let store = store();
        let panels = store.fetch_panels_by_chapter("why-me", 1).await.unwrap();
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].image, "https://cdn.example/1/a.png");

        let legacy = store.fetch_panels_by_chapter("ocean-door", 1).await.unwrap();
        assert_eq!(legacy.len(), 1);

        assert!(store
            .fetch_panels_by_chapter("why-me", 9)
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .fetch_panels_by_chapter("missing", 1)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_empty_chapter_reports_no_panels() {
        let panels = store().fetch_panels_by_chapter("why-me", 2).await.unwrap();
        let mut viewer = PanelViewer::new(panels);

        assert!(viewer.is_empty());
        assert!(viewer.visible_panels().is_empty());
        viewer.switch_mode(ViewMode::Paged);
        assert!(viewer.visible_panels().is_empty());
    }

    #[tokio::test]
    async fn test_post_comment_recomputes_rating() {
        let store = store();
        let comment = Comment {
            text: "Wow".to_string(),
            author: "Lee".to_string(),
            rating: 5,
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        };

        let update = store.post_comment("why-me", &comment).await.unwrap();
        assert_eq!(update.rating, 4.25);
        assert_eq!(update.rating_count, 4);
        assert_eq!(update.comments_count, 3);

        let record = store.fetch_comic_by_id("why-me").await.unwrap();
        assert_eq!(record.rating, 4.25);
        assert_eq!(record.rating_count, 4);
        assert_eq!(record.comments_count, 3);

        let comments = store.fetch_comments("why-me").await.unwrap();
        assert_eq!(comments[0], comment);
        assert_eq!(comments[2].text, "First!");
    }

    #[tokio::test]
    async fn test_post_comment_to_missing_comic() {
        let comment = Comment {
            text: "?".to_string(),
            author: "Lee".to_string(),
            rating: 3,
            timestamp: Utc::now(),
        };
        let err = store().post_comment("missing", &comment).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_like_count_overwrite() {
        let store = store();
        store.update_like_count("why-me", 13).await.unwrap();
        store.update_like_count("why-me", 2).await.unwrap();
        assert_eq!(store.fetch_comic_by_id("why-me").await.unwrap().likes, 2);
    }

    #[test]
    fn test_bad_fixture() {
        let err = MemoryStore::from_json("{\"contents\": 3}").unwrap_err();
        assert!(matches!(err, StoreError::Fixture(_)));
    }
}
