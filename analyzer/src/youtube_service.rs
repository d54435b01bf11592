use async_trait::async_trait;
use reqwest::Client;

use crate::config::YouTubeConfig;
use crate::error::SearchError;
use crate::models::*;

/// Looks up videos for a free-text query, best match first.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoResult>, SearchError>;
}

pub struct YouTubeService {
    client: Client,
    config: YouTubeConfig,
}

impl YouTubeService {
    pub fn new(client: Client, config: YouTubeConfig) -> Self {
        Self { client, config }
    }
}

fn to_video_results(response: YouTubeSearchResponse, max_results: u32) -> Vec<VideoResult> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            let thumbnails = item.snippet.thumbnails;
            let thumbnail_url = thumbnails
                .medium
                .or(thumbnails.high)
                .or(thumbnails.default)
                .map(|t| t.url)
                .unwrap_or_default();
            Some(VideoResult {
                title: item.snippet.title,
                video_id,
                thumbnail_url,
                description: item.snippet.description,
            })
        })
        .take(max_results as usize)
        .collect()
}

#[async_trait]
impl VideoSearch for YouTubeService {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoResult>, SearchError> {
        let url = format!("{}/youtube/v3/search", self.config.base_url.trim_end_matches('/'));
        log::debug!("YouTube search {:?} (max {})", query, max_results);

        let max = max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("part", "snippet"),
                ("maxResults", max.as_str()),
                ("type", "video"),
                ("relevanceLanguage", self.config.relevance_language.as_str()),
                ("order", "relevance"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: YouTubeSearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(to_video_results(parsed, max_results))
    }
}
