use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::RecencyKey;

/// A video as it appears in search-result lists and the feed.
///
/// Immutable once fetched; the feed controller only ever appends these.
/// Serialized form is camelCase because the same shape is persisted in the
/// watch-history blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
}

impl RecencyKey for VideoSummary {
    fn recency_key(&self) -> &str {
        &self.id
    }
}

/// One page of search results plus the continuation token, if any.
///
/// Token absence is the catalog's only end-of-results signal; an empty
/// `items` with a token present still means more pages may exist.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub items: Vec<VideoSummary>,
    pub next_page_token: Option<String>,
}

/// Full record for a single video, from the detail endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetail {
    pub id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
    pub description: String,
    pub view_count: u64,
    pub like_count: Option<u64>,
}

impl VideoDetail {
    /// The summary-shaped projection of this detail record, used for the
    /// watch-history insert after a successful detail fetch.
    pub fn summary(&self) -> VideoSummary {
        VideoSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            channel_title: self.channel_title.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            published_at: self.published_at,
        }
    }
}

// ============================================================================
// Wire Format
// ============================================================================
//
// The catalog speaks YouTube Data v3 shapes. Search items carry their video
// id either wrapped (`id: { videoId: "..." }`) or bare (`id: "..."`), and
// statistics counts arrive as decimal strings.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
    pub next_page_token: Option<String>,
}

impl SearchListResponse {
    pub(crate) fn into_page(self) -> SearchPage {
        SearchPage {
            items: self.items.into_iter().map(SearchItem::into_summary).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub id: VideoRef,
    pub snippet: Snippet,
}

impl SearchItem {
    fn into_summary(self) -> VideoSummary {
        VideoSummary {
            id: self.id.into_id(),
            title: self.snippet.title,
            channel_title: self.snippet.channel_title,
            thumbnail_url: self.snippet.thumbnails.best_url().unwrap_or_default(),
            published_at: self.snippet.published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum VideoRef {
    Wrapped {
        #[serde(rename = "videoId")]
        video_id: String,
    },
    Bare(String),
}

impl VideoRef {
    fn into_id(self) -> String {
        match self {
            VideoRef::Wrapped { video_id } => video_id,
            VideoRef::Bare(id) => id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Snippet {
    pub title: String,
    pub channel_title: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Thumbnails {
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    #[serde(rename = "default")]
    pub fallback: Option<Thumbnail>,
}

impl Thumbnails {
    /// Medium is what the cards render; high and default are fallbacks.
    fn best_url(self) -> Option<String> {
        self.medium
            .or(self.high)
            .or(self.fallback)
            .map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    pub id: String,
    pub snippet: Snippet,
    pub statistics: Statistics,
}

impl VideoItem {
    pub(crate) fn into_detail(self) -> VideoDetail {
        VideoDetail {
            id: self.id,
            title: self.snippet.title,
            channel_title: self.snippet.channel_title,
            thumbnail_url: self.snippet.thumbnails.best_url().unwrap_or_default(),
            published_at: self.snippet.published_at,
            description: self.snippet.description,
            view_count: self.statistics.view_count,
            like_count: self.statistics.like_count,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Statistics {
    #[serde(deserialize_with = "u64_from_string")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "opt_u64_from_string")]
    pub like_count: Option<u64>,
}

fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

fn opt_u64_from_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<String>::deserialize(deserializer)?;
    s.map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}
