use std::fmt;

use fl_core::{EnrichmentService, Result};

/// Offline stand-in for the AI endpoints. Deterministic, never fails.
pub struct DummyEnrichment;

impl fmt::Debug for DummyEnrichment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyEnrichment").finish()
    }
}

impl DummyEnrichment {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyEnrichment {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop markup tags, keeping the text between them.
pub(crate) fn strip_markup(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut in_tag = false;
    for c in content.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait::async_trait]
impl EnrichmentService for DummyEnrichment {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, text: &str) -> Result<String> {
        // First 20 words of the plain text
        let plain = strip_markup(text);
        let words: Vec<&str> = plain.split_whitespace().take(20).collect();
        Ok(words.join(" "))
    }

    async fn improve(&self, text: &str) -> Result<String> {
        let collapsed = collapse_whitespace(text);
        let mut chars = collapsed.chars();
        Ok(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => collapsed,
        })
    }

    async fn apply_prompt(&self, text: &str, instruction: &str) -> Result<String> {
        let instruction = instruction.to_lowercase();
        Ok(if instruction.contains("uppercase") {
            text.to_uppercase()
        } else if instruction.contains("lowercase") {
            text.to_lowercase()
        } else {
            collapse_whitespace(text)
        })
    }
}
