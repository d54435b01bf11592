use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::error::ExtractionError;

/// Turns a stored PDF into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    re_spaces: Regex,
    re_blank_runs: Regex,
}

impl PdfTextExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_spaces: Regex::new(r"[ \t]+")?,
            re_blank_runs: Regex::new(r"\n{3,}")?,
        })
    }

    /// pdf-extract pads glyph runs with spaces and stacks empty lines.
    fn clean_page(&self, page: &str) -> String {
        let collapsed = self.re_spaces.replace_all(page, " ");
        let trimmed_lines = collapsed
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        self.re_blank_runs
            .replace_all(&trimmed_lines, "\n\n")
            .trim()
            .to_string()
    }

    /// Page order is preserved and every page ends with a newline.
    pub fn join_pages<S: AsRef<str>>(&self, pages: &[S]) -> String {
        let mut text = String::new();
        for page in pages {
            let page = self.clean_page(page.as_ref());
            if page.is_empty() {
                continue;
            }
            text.push_str(&page);
            text.push('\n');
        }
        text
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let owned: PathBuf = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned))
            .await
            .map_err(|_| ExtractionError::Panicked(path.to_path_buf()))?
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

        let text = self.join_pages(&pages);
        if text.is_empty() {
            return Err(ExtractionError::NoText(path.to_path_buf()));
        }

        log::info!("Extracted {} chars from {}", text.len(), path.display());
        Ok(text)
    }
}
