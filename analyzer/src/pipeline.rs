use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, PipelineSettings, SearchErrorPolicy};
use crate::document_processor::{PdfTextExtractor, TextExtractor};
use crate::error::UploadError;
use crate::gemini_service::{GeminiService, TextAnalyzer};
use crate::models::*;
use crate::prompt::{compose_prompt, PromptBudget};
use crate::response_splitter::{split_parts, split_queries};
use crate::temp_store::TempStore;
use crate::youtube_service::{VideoSearch, YouTubeService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    AwaitingUploads,
    Extracting,
    Composing,
    Analyzing,
    Splitting,
    Searching,
    Rendered,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::AwaitingUploads => "awaiting uploads",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Composing => "composing",
            PipelineStage::Analyzing => "analyzing",
            PipelineStage::Splitting => "splitting",
            PipelineStage::Searching => "searching",
            PipelineStage::Rendered => "rendered",
        };
        f.write_str(name)
    }
}

struct StageFailure {
    stage: PipelineStage,
    error: String,
}

impl StageFailure {
    fn new(stage: PipelineStage, error: impl fmt::Display) -> Self {
        Self {
            stage,
            error: error.to_string(),
        }
    }
}

/// Everything gathered so far; survives an early failure.
struct RunState {
    documents_received: usize,
    documents_analyzed: usize,
    prompt_tokens: Option<usize>,
    summary: Option<String>,
    recommendations: Vec<TopicRecommendation>,
    notices: Vec<Notice>,
}

impl RunState {
    fn new(documents_received: usize) -> Self {
        Self {
            documents_received,
            documents_analyzed: 0,
            prompt_tokens: None,
            summary: None,
            recommendations: Vec::new(),
            notices: Vec::new(),
        }
    }

    fn notice(&mut self, stage: PipelineStage, level: NoticeLevel, message: impl fmt::Display) {
        self.notices.push(Notice {
            stage,
            level,
            message: message.to_string(),
        });
    }

    fn into_report(self, outcome: PipelineOutcome, processing_time_ms: u128) -> PipelineReport {
        PipelineReport {
            outcome,
            documents_received: self.documents_received,
            documents_analyzed: self.documents_analyzed,
            prompt_tokens: self.prompt_tokens,
            summary: self.summary,
            recommendations: self.recommendations,
            notices: self.notices,
            processing_time_ms,
        }
    }
}

/// Runs one analysis request: intake, extract, compose, analyze, split,
/// search. Stages run strictly in sequence.
pub struct StudyPipeline {
    extractor: Arc<dyn TextExtractor>,
    analyzer: Arc<dyn TextAnalyzer>,
    search: Arc<dyn VideoSearch>,
    store: TempStore,
    settings: PipelineSettings,
    budget: Option<PromptBudget>,
}

impl StudyPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        analyzer: Arc<dyn TextAnalyzer>,
        search: Arc<dyn VideoSearch>,
        store: TempStore,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            analyzer,
            search,
            store,
            settings,
            budget: None,
        }
    }

    pub fn with_budget(mut self, budget: PromptBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Wires the real PDF, Gemini and YouTube adapters from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = config.http_client()?;
        let extractor = Arc::new(PdfTextExtractor::new()?);
        let analyzer = Arc::new(GeminiService::new(client.clone(), config.gemini.clone()));
        let search = Arc::new(YouTubeService::new(client, config.youtube.clone()));
        let budget = PromptBudget::new(config.pipeline.max_prompt_tokens)?;

        Ok(Self::new(
            extractor,
            analyzer,
            search,
            TempStore::new(config.temp_dir.clone()),
            config.pipeline.clone(),
        )
        .with_budget(budget))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self, uploads: Vec<UploadedDocument>) -> PipelineReport {
        let start = Instant::now();
        let mut state = RunState::new(uploads.len());

        let outcome = match self.drive(uploads, &mut state).await {
            Ok(()) => {
                log::info!("Stage: {}", PipelineStage::Rendered);
                PipelineOutcome::Rendered
            }
            Err(failure) => {
                log::warn!("Analysis failed while {}: {}", failure.stage, failure.error);
                PipelineOutcome::Failed {
                    stage: failure.stage,
                    error: failure.error,
                }
            }
        };

        let elapsed = start.elapsed().as_millis();
        log::info!(
            "Processed {} of {} documents, {} topics in {} ms",
            state.documents_analyzed,
            state.documents_received,
            state.recommendations.len(),
            elapsed
        );
        state.into_report(outcome, elapsed)
    }

    async fn drive(&self, uploads: Vec<UploadedDocument>, state: &mut RunState) -> Result<(), StageFailure> {
        let pdfs = self.accept_uploads(uploads, state)?;
        let texts = self.extract_all(pdfs, state).await?;

        log::info!("Stage: {}", PipelineStage::Composing);
        let prompt = compose_prompt(&texts, &self.settings.marker);
        drop(texts);
        if let Some(budget) = &self.budget {
            let tokens = budget.count(&prompt);
            state.prompt_tokens = Some(tokens);
            if budget.exceeds(tokens) {
                log::warn!("Prompt is ~{} tokens, above the {} token budget", tokens, budget.limit());
                state.notice(
                    PipelineStage::Composing,
                    NoticeLevel::Warning,
                    format!(
                        "The combined papers are very long (~{} tokens); the analysis may be truncated.",
                        tokens
                    ),
                );
            }
        }

        log::info!("Stage: {}", PipelineStage::Analyzing);
        let raw = self.analyzer.analyze(&prompt).await.map_err(|e| {
            log::error!("Error analyzing papers: {}", e);
            state.notice(PipelineStage::Analyzing, NoticeLevel::Error, &e);
            StageFailure::new(PipelineStage::Analyzing, e)
        })?;

        log::info!("Stage: {}", PipelineStage::Splitting);
        let (summary, block) = split_parts(&raw, &self.settings.marker);
        let queries = block
            .map(|b| split_queries(b, self.settings.blank_lines))
            .unwrap_or_default();
        state.summary = Some(summary.to_string());
        if block.is_none() {
            log::warn!("Analysis has no '{}' section", self.settings.marker);
            state.notice(
                PipelineStage::Splitting,
                NoticeLevel::Warning,
                "No video search queries were found in the analysis.",
            );
        } else if queries.is_empty() {
            log::warn!("Analysis '{}' section lists no queries", self.settings.marker);
            state.notice(
                PipelineStage::Splitting,
                NoticeLevel::Warning,
                "The analysis suggested no video search queries.",
            );
        }

        log::info!("Stage: {}", PipelineStage::Searching);
        for query in queries {
            let videos = self.search_one(&query, state).await;
            state.recommendations.push(TopicRecommendation { query, videos });
        }

        Ok(())
    }

    fn accept_uploads(
        &self,
        uploads: Vec<UploadedDocument>,
        state: &mut RunState,
    ) -> Result<Vec<(usize, UploadedDocument)>, StageFailure> {
        log::info!("Stage: {}", PipelineStage::AwaitingUploads);

        let mut pdfs = Vec::with_capacity(uploads.len());
        for (idx, document) in uploads.into_iter().enumerate() {
            if document.is_pdf() {
                pdfs.push((idx + 1, document));
            } else {
                let err = UploadError::NotPdf {
                    filename: document.filename,
                };
                log::warn!("{}", err);
                state.notice(PipelineStage::AwaitingUploads, NoticeLevel::Warning, err);
            }
        }

        let found = pdfs.len();
        let bounds_error = if found < self.settings.min_uploads {
            Some(UploadError::TooFew {
                found,
                min: self.settings.min_uploads,
            })
        } else if found > self.settings.max_uploads {
            Some(UploadError::TooMany {
                found,
                max: self.settings.max_uploads,
            })
        } else {
            None
        };

        if let Some(err) = bounds_error {
            state.notice(PipelineStage::AwaitingUploads, NoticeLevel::Error, &err);
            return Err(StageFailure::new(PipelineStage::AwaitingUploads, err));
        }

        log::info!("{} PDFs uploaded successfully", found);
        Ok(pdfs)
    }

    async fn extract_all(
        &self,
        pdfs: Vec<(usize, UploadedDocument)>,
        state: &mut RunState,
    ) -> Result<Vec<ExtractedText>, StageFailure> {
        log::info!("Stage: {}", PipelineStage::Extracting);

        let mut texts = Vec::with_capacity(pdfs.len());
        for (slot, document) in pdfs {
            let saved = match self.store.save(slot, &document).await {
                Ok(saved) => saved,
                Err(e) => {
                    log::warn!("{}", e);
                    state.notice(PipelineStage::Extracting, NoticeLevel::Error, e);
                    continue;
                }
            };

            let extracted = self.extractor.extract(saved.path()).await;
            saved.close();

            match extracted {
                Ok(text) => texts.push(ExtractedText {
                    index: slot,
                    filename: document.filename,
                    text,
                }),
                Err(e) => {
                    log::warn!("Skipping {}: {}", document.filename, e);
                    state.notice(
                        PipelineStage::Extracting,
                        NoticeLevel::Error,
                        format!("{}: {}", document.filename, e),
                    );
                }
            }
        }

        state.documents_analyzed = texts.len();
        if texts.is_empty() {
            return Err(StageFailure::new(
                PipelineStage::Extracting,
                "no text could be extracted from the uploaded PDFs",
            ));
        }
        Ok(texts)
    }

    async fn search_one(&self, query: &str, state: &mut RunState) -> Vec<VideoResult> {
        if query.is_empty() {
            return Vec::new();
        }

        match self.search.search(query, self.settings.max_results).await {
            Ok(videos) => {
                log::info!("Found {} videos for {:?}", videos.len(), query);
                videos
            }
            Err(e) => {
                log::warn!("Error searching YouTube for {:?}: {}", query, e);
                if self.settings.on_search_error == SearchErrorPolicy::Surface {
                    state.notice(
                        PipelineStage::Searching,
                        NoticeLevel::Error,
                        format!("Error searching YouTube for \"{}\": {}", query, e),
                    );
                }
                Vec::new()
            }
        }
    }
}
