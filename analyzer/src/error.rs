use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{filename} is not a PDF file")]
    NotPdf { filename: String },
    #[error("please upload at least {min} PDF files to proceed ({found} received)")]
    TooFew { found: usize, min: usize },
    #[error("at most {max} PDF files can be analyzed at once ({found} received)")]
    TooMany { found: usize, max: usize },
    #[error("error saving file {filename}: {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("error extracting text from PDF: {0}")]
    Pdf(String),
    #[error("PDF reader crashed while decoding {}", .0.display())]
    Panicked(PathBuf),
    #[error("no extractable text in {} (scanned PDFs are not supported)", .0.display())]
    NoText(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("analysis quota exhausted: {0}")]
    Quota(String),
    #[error("Gemini API error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("Gemini returned no text")]
    EmptyResponse,
    #[error("failed to decode Gemini response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("video search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("YouTube API error: {status} {body}")]
    Api { status: u16, body: String },
    #[error("failed to decode YouTube response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("upload bounds are inconsistent: min {min}, max {max}")]
    UploadBounds { min: usize, max: usize },
}
