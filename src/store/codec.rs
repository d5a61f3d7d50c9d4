/// Firestore REST documents
///
/// Firestore wraps every field in a typed value (`{"stringValue": "..."}`,
/// `{"integerValue": "3"}`, ...). These types mirror that shape and the
/// functions below turn documents into reader types and back. Missing
/// fields fall back to empty/zero values, the way the web client treated
/// them.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::data::{
    ChapterMap, ComicRecord, ComicSummary, Comment, RatingUpdate, RawChapters,
};

pub type Fields = BTreeMap<String, Value>;

/// A Firestore typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// int64 values travel as decimal strings
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: Fields,
}

impl Value {
    fn as_str(&self) -> Option<&str> {
        match self {
            Value::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::DoubleValue(n) => Some(*n),
            Value::IntegerValue(s) => s.parse::<i64>().ok().map(|n| n as f64),
            _ => None,
        }
    }

    fn integer(n: u32) -> Self {
        Value::IntegerValue(n.to_string())
    }
}

/// One document as returned by the REST API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full resource name; empty when creating a document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn with_fields(fields: Fields) -> Self {
        Self {
            name: String::new(),
            fields,
        }
    }

    /// Document id (last segment of the resource name)
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// Response of a collection listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

/// One row of a `runQuery` response; rows without a document only carry a read time
#[derive(Debug, Deserialize)]
pub struct QueryRow {
    pub document: Option<Document>,
}

fn string(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number(fields: &Fields, key: &str) -> f64 {
    fields.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn count(fields: &Fields, key: &str) -> u32 {
    number(fields, key).max(0.0).min(f64::from(u32::MAX)) as u32
}

fn strings(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn string_list(fields: &Fields, key: &str) -> Vec<String> {
    match fields.get(key) {
        Some(Value::ArrayValue(array)) => strings(&array.values),
        _ => Vec::new(),
    }
}

/// Decode the `chapter` field in either of its stored shapes
fn chapters(fields: &Fields, comic_id: &str) -> ChapterMap {
    let raw = match fields.get("chapter") {
        Some(Value::MapValue(map)) => {
            let keyed = map
                .fields
                .iter()
                .filter_map(|(key, value)| match value {
                    Value::ArrayValue(array) => Some((key.clone(), strings(&array.values))),
                    _ => {
                        warn!(comic = comic_id, chapter = %key, "Chapter is not a list of panels");
                        None
                    }
                })
                .collect();
            RawChapters::Keyed(keyed)
        }
        Some(Value::ArrayValue(array)) => RawChapters::Flat(strings(&array.values)),
        None | Some(Value::NullValue(())) => return ChapterMap::new(),
        Some(other) => {
            warn!(comic = comic_id, value = ?other, "Chapter data is not in a recognized format");
            return ChapterMap::new();
        }
    };
    raw.normalize(comic_id)
}

pub fn summary_from_document(doc: &Document) -> ComicSummary {
    let fields = &doc.fields;
    ComicSummary {
        id: doc.id().to_string(),
        title: string(fields, "title"),
        rating: number(fields, "rating"),
        description: string(fields, "description"),
        thumbnail: string(fields, "thumbnail"),
        genre: string_list(fields, "genre"),
    }
}

pub fn record_from_document(doc: &Document) -> ComicRecord {
    let fields = &doc.fields;
    let id = doc.id().to_string();
    ComicRecord {
        chapters: chapters(fields, &id),
        title: string(fields, "title"),
        rating: number(fields, "rating"),
        rating_count: count(fields, "ratingCount"),
        likes: count(fields, "likes"),
        description: string(fields, "description"),
        genre: string_list(fields, "genre"),
        thumbnail: string(fields, "thumbnail"),
        author: string(fields, "author"),
        comments_count: count(fields, "commentsCount"),
        id,
    }
}

/// Decode a comment; comments without a timestamp cannot be ordered and are skipped
pub fn comment_from_document(doc: &Document) -> Option<Comment> {
    let fields = &doc.fields;
    let timestamp = match fields.get("timestamp") {
        Some(Value::TimestampValue(ts)) => *ts,
        _ => {
            warn!(comment = doc.id(), "Skipping comment without timestamp");
            return None;
        }
    };

    Some(Comment {
        text: string(fields, "text"),
        author: string(fields, "author"),
        rating: number(fields, "rating").clamp(0.0, 5.0) as u8,
        timestamp,
    })
}

pub fn comment_fields(comment: &Comment) -> Fields {
    let mut fields = Fields::new();
    fields.insert("text".into(), Value::StringValue(comment.text.clone()));
    fields.insert("author".into(), Value::StringValue(comment.author.clone()));
    fields.insert("rating".into(), Value::integer(u32::from(comment.rating)));
    fields.insert("timestamp".into(), Value::TimestampValue(comment.timestamp));
    fields
}

pub fn rating_fields(update: RatingUpdate) -> Fields {
    let mut fields = Fields::new();
    fields.insert("rating".into(), Value::DoubleValue(update.rating));
    fields.insert("ratingCount".into(), Value::integer(update.rating_count));
    fields.insert("commentsCount".into(), Value::integer(update.comments_count));
    fields
}

pub fn likes_fields(likes: u32) -> Fields {
    let mut fields = Fields::new();
    fields.insert("likes".into(), Value::integer(likes));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMIC: &str = r#"{
        "name": "projects/codetales/databases/(default)/documents/contents/why-me",
        "fields": {
            "title": {"stringValue": "Why Me"},
            "rating": {"doubleValue": 4.5},
            "ratingCount": {"integerValue": "8"},
            "likes": {"integerValue": "21"},
            "author": {"stringValue": "Ana Cruz"},
            "genre": {"arrayValue": {"values": [{"stringValue": "Drama"}, {"stringValue": "Slice of Life"}]}},
            "thumbnail": {"stringValue": "https://cdn.example/why-me.png"},
            "chapter": {"mapValue": {"fields": {
                "1": {"arrayValue": {"values": [{"stringValue": "https://cdn.example/1/a.png"}, {"stringValue": "https://cdn.example/1/b.png"}]}},
                "2": {"arrayValue": {}}
            }}}
        },
        "createTime": "2025-02-01T10:00:00.000000Z",
        "updateTime": "2025-03-01T10:00:00.000000Z"
    }"#;

    #[test]
    fn test_record_from_document() {
        let doc: Document = serde_json::from_str(COMIC).unwrap();
        let record = record_from_document(&doc);

        assert_eq!(record.id, "why-me");
        assert_eq!(record.title, "Why Me");
        assert_eq!(record.rating, 4.5);
        assert_eq!(record.rating_count, 8);
        assert_eq!(record.likes, 21);
        assert_eq!(record.genre, vec!["Drama", "Slice of Life"]);
        assert_eq!(record.description, "");
        assert_eq!(record.chapter_numbers(), vec![1, 2]);
        assert_eq!(record.panels(1).unwrap().len(), 2);
        assert!(record.panels(2).unwrap().is_empty());
    }

    #[test]
    fn test_legacy_flat_chapter() {
        let doc: Document = serde_json::from_str(
            r#"{"name": "a/b/contents/old", "fields": {
                "chapter": {"arrayValue": {"values": [{"stringValue": "x.png"}]}}
            }}"#,
        )
        .unwrap();
        let record = record_from_document(&doc);
        assert_eq!(record.chapters[&1], vec!["x.png"]);
    }

    #[test]
    fn test_summary_from_document() {
        let doc: Document = serde_json::from_str(COMIC).unwrap();
        let summary = summary_from_document(&doc);
        assert_eq!(summary.id, "why-me");
        assert_eq!(summary.thumbnail, "https://cdn.example/why-me.png");
        assert_eq!(summary.genre.len(), 2);
    }

    #[test]
    fn test_comment_fields_roundtrip() {
        let comment = Comment {
            text: "Great!".to_string(),
            author: "Jo".to_string(),
            rating: 4,
            timestamp: "2025-04-02T08:30:00Z".parse().unwrap(),
        };

        let doc = Document::with_fields(comment_fields(&comment));
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["fields"]["rating"]["integerValue"], "4");
        assert!(json.get("name").is_none());

        let decoded: Document = serde_json::from_value(json).unwrap();
        assert_eq!(comment_from_document(&decoded), Some(comment));
    }

    #[test]
    fn test_comment_without_timestamp_is_skipped() {
        let doc = Document::with_fields(Fields::from([(
            "text".to_string(),
            Value::StringValue("pending".to_string()),
        )]));
        assert_eq!(comment_from_document(&doc), None);
    }

    #[test]
    fn test_rating_fields() {
        let fields = rating_fields(RatingUpdate {
            rating: 4.25,
            rating_count: 4,
            comments_count: 7,
        });
        assert_eq!(fields["rating"], Value::DoubleValue(4.25));
        assert_eq!(fields["ratingCount"], Value::IntegerValue("4".to_string()));
        assert_eq!(fields["commentsCount"], Value::IntegerValue("7".to_string()));
    }

    #[test]
    fn test_null_value() {
        let value: Value = serde_json::from_str(r#"{"nullValue": null}"#).unwrap();
        assert_eq!(value, Value::NullValue(()));
    }
}
