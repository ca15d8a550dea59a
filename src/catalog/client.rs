use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::types::{SearchListResponse, SearchPage, VideoDetail, VideoListResponse, VideoSummary};

/// Public endpoint of the video catalog.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network-level error (DNS, connection, TLS, body read)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("catalog returned status {0}")]
    HttpStatus(u16),
    /// Response body not in the expected shape
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
    /// Detail request for an id the catalog has no record of
    #[error("video {0} not found in catalog")]
    NotFound(String),
}

/// HTTP client for the remote video catalog.
///
/// Performs exactly one attempt per call: no retry, no backoff, no request
/// timeout. A failed fetch surfaces as an error state and retrying is a
/// caller decision. The base URL is injectable so tests can point at a local
/// mock server.
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Fetch one page of search results for `term`.
    ///
    /// `page_token` carries the continuation token from the previous page;
    /// `None` requests the first page. The returned page's token is absent
    /// when the catalog has no further results.
    pub async fn search(
        &self,
        term: &str,
        page_size: u8,
        page_token: Option<&str>,
    ) -> Result<SearchPage, CatalogError> {
        tracing::debug!(term = %term, page_token = ?page_token, "Requesting search page");

        let mut params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("maxResults", page_size.to_string()),
            ("q", term.to_string()),
            ("type", "video".to_string()),
            ("key", self.api_key.expose_secret().to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }

        let body = self.get_json(&format!("{}/search", self.base_url), &params).await?;
        let parsed: SearchListResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_page())
    }

    /// Fetch videos related to `video_id`, capped at `page_size`.
    pub async fn related(
        &self,
        video_id: &str,
        page_size: u8,
    ) -> Result<Vec<VideoSummary>, CatalogError> {
        tracing::debug!(video_id = %video_id, "Requesting related videos");

        let params: Vec<(&str, String)> = vec![
            ("part", "snippet".to_string()),
            ("maxResults", page_size.to_string()),
            ("relatedToVideoId", video_id.to_string()),
            ("type", "video".to_string()),
            ("key", self.api_key.expose_secret().to_string()),
        ];

        let body = self.get_json(&format!("{}/search", self.base_url), &params).await?;
        let parsed: SearchListResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_page().items)
    }

    /// Fetch the full detail record for a single video.
    pub async fn video_detail(&self, video_id: &str) -> Result<VideoDetail, CatalogError> {
        tracing::debug!(video_id = %video_id, "Requesting video detail");

        let params: Vec<(&str, String)> = vec![
            ("part", "snippet,statistics".to_string()),
            ("id", video_id.to_string()),
            ("key", self.api_key.expose_secret().to_string()),
        ];

        let body = self.get_json(&format!("{}/videos", self.base_url), &params).await?;
        let parsed: VideoListResponse = serde_json::from_str(&body)?;
        parsed
            .items
            .into_iter()
            .next()
            .map(|item| item.into_detail())
            .ok_or_else(|| CatalogError::NotFound(video_id.to_string()))
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<String, CatalogError> {
        let response = self.http.get(url).query(params).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus(response.status().as_u16()));
        }

        // Decode happens outside reqwest so a malformed body is a Decode
        // error, not a Network one.
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CatalogClient {
        CatalogClient::new(
            reqwest::Client::new(),
            server.uri(),
            SecretString::from("test-key"),
        )
    }

    const SEARCH_BODY: &str = r#"{
        "items": [{
            "id": { "videoId": "vid1" },
            "snippet": {
                "title": "A video",
                "channelTitle": "A channel",
                "publishedAt": "2024-03-01T12:00:00Z",
                "thumbnails": { "medium": { "url": "https://img.example/1.jpg" } }
            }
        }],
        "nextPageToken": "NEXT"
    }"#;

    #[tokio::test]
    async fn test_search_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "trending"))
            .and(query_param("maxResults", "24"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_BODY))
            .mount(&server)
            .await;

        let page = client_for(&server)
            .search("trending", 24, None)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "vid1");
        assert_eq!(page.next_page_token.as_deref(), Some("NEXT"));
    }

    #[tokio::test]
    async fn test_search_sends_page_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("pageToken", "CURSOR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{ "items": [] }"#))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server)
            .search("Music", 24, Some("CURSOR"))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search("trending", 24, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::HttpStatus(403)));
    }

    #[tokio::test]
    async fn test_search_no_automatic_retry_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1) // exactly one attempt
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search("trending", 24, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_search_malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search("trending", 24, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn test_detail_success() {
        let server = MockServer::start().await;
        let body = r#"{
            "items": [{
                "id": "vid9",
                "snippet": {
                    "title": "Detail",
                    "channelTitle": "Chan",
                    "publishedAt": "2024-03-01T12:00:00Z",
                    "description": "words"
                },
                "statistics": { "viewCount": "42", "likeCount": "7" }
            }]
        }"#;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "vid9"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let detail = client_for(&server).video_detail("vid9").await.unwrap();
        assert_eq!(detail.view_count, 42);
        assert_eq!(detail.like_count, Some(7));
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{ "items": [] }"#))
            .mount(&server)
            .await;

        let err = client_for(&server).video_detail("ghost").await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_related_uses_related_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("relatedToVideoId", "vid1"))
            .and(query_param("maxResults", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let related = client_for(&server).related("vid1", 15).await.unwrap();
        assert_eq!(related.len(), 1);
    }
}
