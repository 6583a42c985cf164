//! OpenAI-compatible HTTP providers.
//!
//! `base_url` points at any server speaking the OpenAI `/embeddings` and
//! `/chat/completions` dialect (OpenAI itself, OpenRouter, local gateways).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use docqa_core::config::ProviderConfig;
use docqa_core::traits::{Answerer, Embedder};
use docqa_core::types::Vector;
use docqa_core::{Error, Result};

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dim: usize,
    id: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &ProviderConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key,
            model: config.embedding_model.clone(),
            dim: config.embedding_dim,
            id: format!("openai:{}:d{}", config.embedding_model, config.embedding_dim),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .client
            .post(endpoint(&self.base_url, "embeddings"))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "input": texts,
            }))
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!("provider returned {status}: {body}")));
        }

        let mut parsed: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed response: {e}")))?;
        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "mismatched embedding count: got {}, expected {}",
                parsed.data.len(),
                texts.len()
            )));
        }
        parsed.data.sort_by_key(|item| item.index);
        let vectors: Vec<Vector> = parsed.data.into_iter().map(|item| item.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(Error::Embedding(format!(
                "provider returned {}-dimensional vectors, configured for {}",
                bad.len(),
                self.dim
            )));
        }
        Ok(vectors)
    }
}

pub struct OpenAiAnswerer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    id: String,
}

impl OpenAiAnswerer {
    pub fn new(config: &ProviderConfig, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key,
            model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            id: format!("openai:{}", config.chat_model),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// "Stuff" prompt: every retrieved chunk goes into one system message.
fn build_messages(question: &str, context: &str) -> serde_json::Value {
    serde_json::json!([
        {
            "role": "system",
            "content": format!(
                "Use the following pieces of context to answer the question at the end. \
                 If you don't know the answer, just say that you don't know.\n\n{context}"
            ),
        },
        { "role": "user", "content": question },
    ])
}

#[async_trait]
impl Answerer for OpenAiAnswerer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let resp = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": build_messages(question, context),
                "max_tokens": self.max_tokens,
                "temperature": self.temperature,
            }))
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("provider returned {status}: {body}")));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::Generation("provider returned no answer".to_string()))
    }
}
