use async_trait::async_trait;

use docqa_core::traits::Answerer;
use docqa_core::Result;

const CONTEXT_PREVIEW_CHARS: usize = 200;

/// Deterministic stand-in answerer that echoes the head of the context.
#[derive(Debug, Clone, Default)]
pub struct StubAnswerer;

impl StubAnswerer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Answerer for StubAnswerer {
    fn id(&self) -> &str {
        "stub"
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let preview: String = context.chars().take(CONTEXT_PREVIEW_CHARS).collect();
        Ok(format!(
            "Based on the provided documents about {question}, here is an answer derived from the context: {preview}..."
        ))
    }
}
