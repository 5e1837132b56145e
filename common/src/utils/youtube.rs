use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

const DATA_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const TIMEDTEXT_BASE: &str = "https://www.youtube.com/api/timedtext";

/// Snippet-level metadata for a single video, as returned by the Data API.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnail: Option<String>,
}

#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    api_key: String,
    data_api_base: String,
    timedtext_base: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    channel_id: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Deserialize)]
struct ChannelItem {
    snippet: ChannelSnippet,
}

#[derive(Deserialize)]
struct ChannelSnippet {
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best_url(self) -> Option<String> {
        self.high
            .or(self.medium)
            .or(self.default)
            .map(|thumbnail| thumbnail.url)
    }
}

impl YoutubeClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            data_api_base: DATA_API_BASE.to_string(),
            timedtext_base: TIMEDTEXT_BASE.to_string(),
        })
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_base_urls(mut self, data_api_base: String, timedtext_base: String) -> Self {
        self.data_api_base = data_api_base;
        self.timedtext_base = timedtext_base;
        self
    }

    pub async fn fetch_video(&self, video_id: &str) -> Result<VideoMetadata, AppError> {
        let url = format!("{}/videos", self.data_api_base);
        let response: ListResponse<VideoItem> = self
            .http
            .get(&url)
            .query(&[("part", "snippet"), ("id", video_id), ("key", &self.api_key)])
            .send()
            .await?
            .error_for_status()
            .map_err(|err| AppError::Upstream(format!("YouTube video lookup failed: {err}")))?
            .json()
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Video {video_id} not found")))?;

        Ok(VideoMetadata {
            video_id: video_id.to_string(),
            title: item.snippet.title,
            description: item.snippet.description,
            channel_id: item.snippet.channel_id,
            channel_title: item.snippet.channel_title,
            thumbnail: item.snippet.thumbnails.best_url(),
        })
    }

    pub async fn fetch_channel_thumbnail(
        &self,
        channel_id: &str,
    ) -> Result<Option<String>, AppError> {
        let url = format!("{}/channels", self.data_api_base);
        let response: ListResponse<ChannelItem> = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("id", channel_id),
                ("key", &self.api_key),
            ])
            .send()
            .await?
            .error_for_status()
            .map_err(|err| AppError::Upstream(format!("YouTube channel lookup failed: {err}")))?
            .json()
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.snippet.thumbnails.best_url()))
    }

    /// English captions via the timedtext endpoint. Returns `None` when the
    /// video has no caption track, which is common and not an error.
    pub async fn fetch_captions(&self, video_id: &str) -> Result<Option<String>, AppError> {
        let response = self
            .http
            .get(&self.timedtext_base)
            .query(&[("v", video_id), ("lang", "en"), ("fmt", "json3")])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(video_id, status = %response.status(), "No caption track available");
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        parse_json3_transcript(&body)
    }
}

#[derive(Deserialize)]
struct TimedTextBody {
    #[serde(default = "Vec::new")]
    events: Vec<TimedTextEvent>,
}

#[derive(Deserialize)]
struct TimedTextEvent {
    #[serde(default = "Vec::new")]
    segs: Vec<TimedTextSegment>,
}

#[derive(Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a json3 timedtext payload into one whitespace-normalized string.
pub fn parse_json3_transcript(body: &str) -> Result<Option<String>, AppError> {
    let parsed: TimedTextBody = serde_json::from_str(body)
        .map_err(|err| AppError::Upstream(format!("Malformed caption payload: {err}")))?;

    let text = parsed
        .events
        .iter()
        .flat_map(|event| event.segs.iter())
        .map(|seg| seg.utf8.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        Ok(None)
    } else {
        Ok(Some(normalized))
    }
}
