use minijinja::{context, Environment};
use paper_analyzer::{Notice, PipelineOutcome, PipelineReport, PipelineSettings};
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Serialize;

const BASE: &str = include_str!("../templates/base.html");
const INDEX: &str = include_str!("../templates/index.html");
const RESULTS: &str = include_str!("../templates/results.html");

#[derive(Serialize)]
struct VideoView<'a> {
    title: &'a str,
    thumbnail_url: &'a str,
    watch_url: String,
    description: &'a str,
}

#[derive(Serialize)]
struct TopicView<'a> {
    label: String,
    query: &'a str,
    videos: Vec<VideoView<'a>>,
}

#[derive(Serialize)]
struct FailureView<'a> {
    stage: String,
    error: &'a str,
}

/// HTML pages for the upload form and the analysis results.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", BASE)?;
        env.add_template("index.html", INDEX)?;
        env.add_template("results.html", RESULTS)?;
        Ok(Self { env })
    }

    pub fn index(&self, settings: &PipelineSettings) -> Result<String, minijinja::Error> {
        self.env.get_template("index.html")?.render(context! {
            min_uploads => settings.min_uploads,
            max_uploads => settings.max_uploads,
        })
    }

    pub fn results(&self, report: &PipelineReport) -> Result<String, minijinja::Error> {
        let failure = match &report.outcome {
            PipelineOutcome::Rendered => None,
            PipelineOutcome::Failed { stage, error } => Some(FailureView {
                stage: stage.to_string(),
                error,
            }),
        };

        let topics: Vec<TopicView> = report
            .recommendations
            .iter()
            .enumerate()
            .map(|(i, topic)| TopicView {
                label: format!("Topic {}", i + 1),
                query: &topic.query,
                videos: topic
                    .videos
                    .iter()
                    .map(|v| VideoView {
                        title: &v.title,
                        thumbnail_url: &v.thumbnail_url,
                        watch_url: v.watch_url(),
                        description: &v.description,
                    })
                    .collect(),
            })
            .collect();

        let notices: &[Notice] = &report.notices;
        self.env.get_template("results.html")?.render(context! {
            documents_received => report.documents_received,
            documents_analyzed => report.documents_analyzed,
            processing_time_ms => report.processing_time_ms as u64,
            notices => notices,
            failure => failure,
            summary_html => report.summary.as_deref().map(markdown_to_html),
            topics => topics,
        })
    }
}

/// Renders model output as HTML. Raw HTML in the source is shown as text.
pub fn markdown_to_html(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_analyzer::{NoticeLevel, PipelineStage, TopicRecommendation, VideoResult};

    fn report(outcome: PipelineOutcome) -> PipelineReport {
        PipelineReport {
            outcome,
            documents_received: 2,
            documents_analyzed: 2,
            prompt_tokens: Some(120),
            summary: Some("## Module 1\n- What is a linked list? [2]".to_string()),
            recommendations: vec![
                TopicRecommendation {
                    query: "linked list basics".to_string(),
                    videos: vec![VideoResult {
                        title: "Linked Lists <Intro>".to_string(),
                        video_id: "abc123".to_string(),
                        thumbnail_url: "https://i.ytimg.com/vi/abc123/mqdefault.jpg".to_string(),
                        description: "All about nodes".to_string(),
                    }],
                },
                TopicRecommendation {
                    query: "array vs linked list".to_string(),
                    videos: Vec::new(),
                },
            ],
            notices: vec![Notice {
                stage: PipelineStage::Searching,
                level: NoticeLevel::Error,
                message: "Error searching YouTube for \"array vs linked list\"".to_string(),
            }],
            processing_time_ms: 42,
        }
    }

    #[test]
    fn markdown_headers_become_html() {
        let html = markdown_to_html("## Module 1\n\n- stacks [3]");
        assert!(html.contains("<h2>Module 1</h2>"));
        assert!(html.contains("<li>stacks [3]</li>"));
    }

    #[test]
    fn raw_html_in_model_output_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script>\n\ntext <b>bold</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn index_has_one_input_per_slot() {
        let renderer = Renderer::new().unwrap();
        let page = renderer.index(&PipelineSettings::default()).unwrap();
        assert_eq!(page.matches("type=\"file\"").count(), 5);
        assert!(page.contains("PDF 5"));
        assert!(page.contains("at least 2 question papers (up to 5)"));
        assert!(page.contains("Analyze Papers"));
    }

    #[test]
    fn results_show_analysis_tabs_and_links() {
        let renderer = Renderer::new().unwrap();
        let page = renderer.results(&report(PipelineOutcome::Rendered)).unwrap();

        assert!(page.contains("Analysis Results"));
        assert!(page.contains("<h2>Module 1</h2>"));
        assert!(page.contains("Recommended Videos"));
        assert!(page.contains("Topic 1"));
        assert!(page.contains("Topic 2"));
        assert!(page.contains("https://youtube.com/watch?v=abc123"));
        assert!(page.contains("<details><summary>Description</summary>"));
        assert!(page.contains("Linked Lists &lt;Intro&gt;"));
        assert!(page.contains("No videos found for this topic."));
        assert!(page.contains("notice error"));
        assert!(!page.contains("Analysis stopped"));
    }

    #[test]
    fn failed_report_names_the_stage() {
        let renderer = Renderer::new().unwrap();
        let mut failed = report(PipelineOutcome::Failed {
            stage: PipelineStage::Analyzing,
            error: "analysis quota exhausted".to_string(),
        });
        failed.summary = None;
        failed.recommendations.clear();

        let page = renderer.results(&failed).unwrap();
        assert!(page.contains("Analysis stopped while analyzing:"));
        assert!(page.contains("analysis quota exhausted"));
        assert!(!page.contains("Analysis Results"));
        assert!(!page.contains("Recommended Videos"));
    }
}
