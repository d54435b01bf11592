pub mod config;
pub mod document_processor;
pub mod error;
pub mod gemini_service;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod response_splitter;
pub mod temp_store;
pub mod youtube_service;

pub use config::{AppConfig, BlankLinePolicy, PipelineSettings, SearchErrorPolicy};
pub use document_processor::{PdfTextExtractor, TextExtractor};
pub use error::{AnalysisError, ConfigError, ExtractionError, SearchError, UploadError};
pub use gemini_service::{GeminiService, TextAnalyzer};
pub use models::*;
pub use pipeline::{PipelineStage, StudyPipeline};
pub use prompt::{compose_prompt, PromptBudget};
pub use response_splitter::split_response;
pub use temp_store::{SavedUpload, TempStore};
pub use youtube_service::{VideoSearch, YouTubeService};
