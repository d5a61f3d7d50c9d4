/// Firestore REST client
///
/// Titles live in the `contents` collection and each title's comments in
/// its `comments` sub-collection:
///   GET   {base}/contents                  list titles (paged)
///   GET   {base}/contents/{id}             one title
///   POST  {base}/contents/{id}/comments    add a comment
///   POST  {base}/contents/{id}:runQuery    comments, newest first
///   PATCH {base}/contents/{id}             overwrite selected fields
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::json;
use tracing::debug;

use super::codec::{self, Document, Fields, ListResponse, QueryRow};
use super::{check_id, ContentStore, StoreError};
use crate::state::data::{ComicRecord, ComicSummary, Comment, RatingUpdate};

const API_ROOT: &str = "https://firestore.googleapis.com/v1";
const COLLECTION: &str = "contents";
const PAGE_SIZE: &str = "100";

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    /// `.../projects/{project}/databases/(default)/documents`
    base: String,
    api_key: Option<String>,
}

impl FirestoreStore {
    pub fn new(
        project_id: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, API_ROOT, project_id, api_key))
    }

    /// Build against another API root (emulator, tests)
    pub fn with_client(
        client: Client,
        api_root: &str,
        project_id: &str,
        api_key: Option<String>,
    ) -> Self {
        let base = format!(
            "{}/projects/{}/databases/(default)/documents",
            api_root.trim_end_matches('/'),
            project_id
        );
        Self {
            client,
            base,
            api_key,
        }
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}/{}", self.base, COLLECTION, id)
    }

    fn keyed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn patch(&self, id: &str, fields: Fields) -> Result<(), StoreError> {
        check_id(id)?;
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect();

        let request = self
            .client
            .patch(self.document_url(id))
            .query(&mask)
            .query(&[("currentDocument.exists", "true")])
            .json(&Document::with_fields(fields.clone()));

        let response = self.keyed(request).send().await?;
        check(response, || format!("comic {id:?}")).await?;
        Ok(())
    }
}

/// Map HTTP failures onto store errors
async fn check(
    response: Response,
    what: impl FnOnce() -> String,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(what()));
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

#[async_trait]
impl ContentStore for FirestoreStore {
    async fn fetch_comic_summaries(&self) -> Result<Vec<ComicSummary>, StoreError> {
        let url = format!("{}/{}", self.base, COLLECTION);
        let mut summaries = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = self.keyed(request).send().await?;
            let page: ListResponse = check(response, || "contents collection".to_string())
                .await?
                .json()
                .await?;

            summaries.extend(page.documents.iter().map(codec::summary_from_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(count = summaries.len(), "Fetched comic summaries");
        Ok(summaries)
    }

    async fn fetch_comic_by_id(&self, id: &str) -> Result<ComicRecord, StoreError> {
        check_id(id)?;
        let request = self.client.get(self.document_url(id));
        let response = self.keyed(request).send().await?;
        let doc: Document = check(response, || format!("comic {id:?}"))
            .await?
            .json()
            .await?;

        Ok(codec::record_from_document(&doc))
    }

    async fn fetch_comments(&self, id: &str) -> Result<Vec<Comment>, StoreError> {
        check_id(id)?;
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": "comments" }],
                "orderBy": [{
                    "field": { "fieldPath": "timestamp" },
                    "direction": "DESCENDING"
                }]
            }
        });

        let request = self
            .client
            .post(format!("{}:runQuery", self.document_url(id)))
            .json(&query);
        let response = self.keyed(request).send().await?;
        let rows: Vec<QueryRow> = check(response, || format!("comments of {id:?}"))
            .await?
            .json()
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| row.document.as_ref())
            .filter_map(codec::comment_from_document)
            .collect())
    }

    async fn add_comment(&self, id: &str, comment: &Comment) -> Result<(), StoreError> {
        check_id(id)?;
        let request = self
            .client
            .post(format!("{}/comments", self.document_url(id)))
            .json(&Document::with_fields(codec::comment_fields(comment)));

        let response = self.keyed(request).send().await?;
        check(response, || format!("comic {id:?}")).await?;
        Ok(())
    }

    async fn update_rating(&self, id: &str, update: RatingUpdate) -> Result<(), StoreError> {
        self.patch(id, codec::rating_fields(update)).await
    }

    async fn update_like_count(&self, id: &str, likes: u32) -> Result<(), StoreError> {
        self.patch(id, codec::likes_fields(likes)).await?;
        tracing::info!(comic = id, likes, "Like count updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(api_key: Option<&str>) -> FirestoreStore {
        FirestoreStore::with_client(
            Client::new(),
            "http://localhost:8080/v1/",
            "codetales",
            api_key.map(str::to_string),
        )
    }

    #[test]
    fn test_document_url() {
        let store = store(None);
        assert_eq!(
            store.document_url("why-me"),
            "http://localhost:8080/v1/projects/codetales/databases/(default)/documents/contents/why-me"
        );
    }

    #[test]
    fn test_api_key_is_appended() {
        let store = store(Some("secret"));
        let request = store
            .keyed(store.client.get(store.document_url("why-me")))
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("key=secret"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let store = store(None);
        let err = store.fetch_comic_by_id("a/b").await.unwrap_err();
        assert!(err.is_not_found());

        let err = store.fetch_panels_by_chapter("", 1).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
