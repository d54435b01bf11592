use serde::{Deserialize, Serialize};

use crate::pipeline::PipelineStage;

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Uploads are accepted on extension alone; content is never sniffed.
    pub fn is_pdf(&self) -> bool {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    /// 1-based upload slot the text came from.
    pub index: usize,
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub summary: String,
    pub queries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResult {
    pub title: String,
    pub video_id: String,
    pub thumbnail_url: String,
    pub description: String,
}

impl VideoResult {
    pub fn watch_url(&self) -> String {
        format!("https://youtube.com/watch?v={}", self.video_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRecommendation {
    pub query: String,
    pub videos: Vec<VideoResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub stage: PipelineStage,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Rendered,
    Failed { stage: PipelineStage, error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub outcome: PipelineOutcome,
    pub documents_received: usize,
    pub documents_analyzed: usize,
    pub prompt_tokens: Option<usize>,
    pub summary: Option<String>,
    pub recommendations: Vec<TopicRecommendation>,
    pub notices: Vec<Notice>,
    pub processing_time_ms: u128,
}

impl PipelineReport {
    pub fn is_rendered(&self) -> bool {
        self.outcome == PipelineOutcome::Rendered
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeSearchResponse {
    #[serde(default)]
    pub items: Vec<YouTubeSearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeSearchItem {
    pub id: YouTubeItemId,
    pub snippet: YouTubeSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: YouTubeThumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct YouTubeThumbnails {
    pub default: Option<YouTubeThumbnail>,
    pub medium: Option<YouTubeThumbnail>,
    pub high: Option<YouTubeThumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct YouTubeThumbnail {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}
