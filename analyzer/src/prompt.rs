use anyhow::Result;
use tiktoken_rs::CoreBPE;

use crate::models::ExtractedText;

/// Builds the analysis prompt. Blocks are labelled `PDF 1 Content:`,
/// `PDF 2 Content:`, ... in the order given.
pub fn compose_prompt(texts: &[ExtractedText], marker: &str) -> String {
    let combined_content = texts
        .iter()
        .enumerate()
        .map(|(idx, doc)| format!("PDF {} Content:\n{}", idx + 1, doc.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Analyze the following content from PDF question papers and provide:
1. Module-wise categorization of questions
2. Identification of repeated questions (mark frequency in brackets)
3. Key topics that students should focus on
4. Generate 3 specific YouTube search queries for the most important topics

Content:
{combined_content}

Format the response in clear sections with headers.
For YouTube queries, provide them in a separate section titled '{marker}' with one query per line."#
    )
}

/// Rough token count of a prompt, used for logging and an oversize warning.
pub struct PromptBudget {
    bpe: CoreBPE,
    limit: usize,
}

impl PromptBudget {
    pub fn new(limit: usize) -> Result<Self> {
        Ok(Self {
            bpe: tiktoken_rs::cl100k_base()?,
            limit,
        })
    }

    pub fn count(&self, prompt: &str) -> usize {
        self.bpe.encode_with_special_tokens(prompt).len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn exceeds(&self, tokens: usize) -> bool {
        tokens > self.limit
    }
}
