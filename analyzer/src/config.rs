use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MARKER: &str = "YOUTUBE_QUERIES:";
/// Largest `maxResults` the YouTube search endpoint accepts.
pub const MAX_VIDEOS_PER_QUERY: u32 = 50;

/// What to do with blank lines inside the queries block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankLinePolicy {
    #[default]
    Drop,
    Keep,
}

impl FromStr for BlankLinePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "keep" => Ok(Self::Keep),
            _ => Err(()),
        }
    }
}

/// Whether a failed video search is shown to the user or only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchErrorPolicy {
    #[default]
    Surface,
    Suppress,
}

impl FromStr for SearchErrorPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "surface" => Ok(Self::Surface),
            "suppress" => Ok(Self::Suppress),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
    pub relevance_language: String,
}

/// Knobs the orchestrator reads on every run.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub marker: String,
    pub blank_lines: BlankLinePolicy,
    pub on_search_error: SearchErrorPolicy,
    pub max_results: u32,
    pub min_uploads: usize,
    pub max_uploads: usize,
    pub max_prompt_tokens: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            blank_lines: BlankLinePolicy::Drop,
            on_search_error: SearchErrorPolicy::Surface,
            max_results: 3,
            min_uploads: 2,
            max_uploads: 5,
            max_prompt_tokens: 900_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub youtube: YouTubeConfig,
    pub pipeline: PipelineSettings,
    pub http_timeout: Option<Duration>,
    pub temp_dir: PathBuf,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// Reads the process environment. The binary loads `.env` before this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GOOGLE_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?;
        let youtube_api_key = get("YOUTUBE_API_KEY").ok_or(ConfigError::Missing("YOUTUBE_API_KEY"))?;

        let defaults = PipelineSettings::default();
        let pipeline = PipelineSettings {
            marker: get("QUERY_MARKER").unwrap_or(defaults.marker),
            blank_lines: parse_or(&get, "BLANK_QUERY_LINES", defaults.blank_lines)?,
            on_search_error: parse_or(&get, "SEARCH_ERROR_POLICY", defaults.on_search_error)?,
            max_results: parse_or(&get, "VIDEOS_PER_QUERY", defaults.max_results)?,
            min_uploads: parse_or(&get, "MIN_UPLOADS", defaults.min_uploads)?,
            max_uploads: parse_or(&get, "MAX_UPLOADS", defaults.max_uploads)?,
            max_prompt_tokens: parse_or(&get, "MAX_PROMPT_TOKENS", defaults.max_prompt_tokens)?,
        };

        if pipeline.max_results > MAX_VIDEOS_PER_QUERY {
            return Err(ConfigError::Invalid {
                key: "VIDEOS_PER_QUERY",
                value: pipeline.max_results.to_string(),
            });
        }

        if pipeline.min_uploads == 0 || pipeline.min_uploads > pipeline.max_uploads {
            return Err(ConfigError::UploadBounds {
                min: pipeline.min_uploads,
                max: pipeline.max_uploads,
            });
        }

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::Invalid {
                    key: "HTTP_TIMEOUT_SECS",
                    value: raw.clone(),
                }
            })?)),
            None => None,
        };

        Ok(Self {
            gemini: GeminiConfig {
                api_key: gemini_api_key,
                model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
                base_url: get("GEMINI_BASE_URL")
                    .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
                temperature: parse_or(&get, "GEMINI_TEMPERATURE", 0.3)?,
                max_output_tokens: parse_or(&get, "GEMINI_MAX_OUTPUT_TOKENS", 4096)?,
            },
            youtube: YouTubeConfig {
                api_key: youtube_api_key,
                base_url: get("YOUTUBE_BASE_URL")
                    .unwrap_or_else(|| "https://www.googleapis.com".to_string()),
                relevance_language: get("YOUTUBE_RELEVANCE_LANGUAGE")
                    .unwrap_or_else(|| "en".to_string()),
            },
            pipeline,
            http_timeout,
            temp_dir: get("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(env::temp_dir),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
        })
    }

    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("YOUTUBE_API_KEY", "y-key"),
        ]))
        .unwrap();

        assert_eq!(config.gemini.api_key, "g-key");
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.youtube.relevance_language, "en");
        assert_eq!(config.pipeline.marker, DEFAULT_MARKER);
        assert_eq!(config.pipeline.min_uploads, 2);
        assert_eq!(config.pipeline.max_uploads, 5);
        assert_eq!(config.pipeline.max_results, 3);
        assert_eq!(config.pipeline.on_search_error, SearchErrorPolicy::Surface);
        assert_eq!(config.pipeline.blank_lines, BlankLinePolicy::Drop);
        assert!(config.http_timeout.is_none());
    }

    #[test]
    fn gemini_key_falls_back_to_alternate_name() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "alt"),
            ("YOUTUBE_API_KEY", "y-key"),
        ]))
        .unwrap();
        assert_eq!(config.gemini.api_key, "alt");
    }

    #[test]
    fn missing_youtube_key_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "g-key")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("YOUTUBE_API_KEY")));
    }

    #[test]
    fn policies_and_bounds_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("YOUTUBE_API_KEY", "y"),
            ("SEARCH_ERROR_POLICY", "Suppress"),
            ("BLANK_QUERY_LINES", "keep"),
            ("MIN_UPLOADS", "5"),
            ("MAX_UPLOADS", "5"),
            ("HTTP_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.pipeline.on_search_error, SearchErrorPolicy::Suppress);
        assert_eq!(config.pipeline.blank_lines, BlankLinePolicy::Keep);
        assert_eq!(config.pipeline.min_uploads, 5);
        assert_eq!(config.http_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn inverted_upload_bounds_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("YOUTUBE_API_KEY", "y"),
            ("MIN_UPLOADS", "4"),
            ("MAX_UPLOADS", "3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::UploadBounds { min: 4, max: 3 }));
    }

    #[test]
    fn malformed_number_names_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("YOUTUBE_API_KEY", "y"),
            ("VIDEOS_PER_QUERY", "three"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "VIDEOS_PER_QUERY", .. }));
    }

    #[test]
    fn videos_per_query_is_capped_at_the_search_page_size() {
        let err = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("YOUTUBE_API_KEY", "y"),
            ("VIDEOS_PER_QUERY", "60"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "VIDEOS_PER_QUERY", ref value } if value == "60"
        ));

        let config = AppConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "g"),
            ("YOUTUBE_API_KEY", "y"),
            ("VIDEOS_PER_QUERY", "50"),
        ]))
        .unwrap();
        assert_eq!(config.pipeline.max_results, 50);
    }
}
