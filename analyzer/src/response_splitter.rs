use crate::config::BlankLinePolicy;
use crate::models::AnalysisResponse;

/// Splits at the first occurrence of `marker`. The block is `None` when the
/// marker is absent.
pub fn split_parts<'a>(raw: &'a str, marker: &str) -> (&'a str, Option<&'a str>) {
    match raw.split_once(marker) {
        Some((summary, block)) if !marker.is_empty() => (summary, Some(block)),
        _ => (raw, None),
    }
}

pub fn split_queries(block: &str, blank_lines: BlankLinePolicy) -> Vec<String> {
    let block = block.trim();
    if block.is_empty() {
        return Vec::new();
    }

    block
        .lines()
        .map(str::trim)
        .filter(|line| blank_lines == BlankLinePolicy::Keep || !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn split_response(raw: &str, marker: &str, blank_lines: BlankLinePolicy) -> AnalysisResponse {
    let (summary, block) = split_parts(raw, marker);
    AnalysisResponse {
        summary: summary.to_string(),
        queries: block
            .map(|b| split_queries(b, blank_lines))
            .unwrap_or_default(),
    }
}
