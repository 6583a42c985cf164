//! Embedding and answering capabilities.
//!
//! Each capability has a deterministic stand-in and an OpenAI-compatible HTTP
//! implementation. [`select_providers`] picks one pair from configuration; the
//! rest of the system only sees the traits from `docqa_core::traits`.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod answer;
pub mod fake;
pub mod openai;

use std::sync::Arc;

use tracing::info;

use docqa_core::config::{ProviderConfig, ProviderKind};
use docqa_core::traits::{Answerer, Embedder};
use docqa_core::{Error, Result};

pub use answer::StubAnswerer;
pub use fake::FakeEmbedder;
pub use openai::{OpenAiAnswerer, OpenAiEmbedder};

/// The capabilities an engine is wired with.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn Embedder>,
    pub answerer: Arc<dyn Answerer>,
}

impl Providers {
    pub fn stub(dim: usize) -> Result<Self> {
        Ok(Self { embedder: Arc::new(FakeEmbedder::new(dim)?), answerer: Arc::new(StubAnswerer::new()) })
    }
}

/// Pick providers once. `auto` uses OpenAI when a key is available and the
/// stand-ins otherwise; `openai` without a key is a configuration error.
pub fn select_providers(config: &ProviderConfig) -> Result<Providers> {
    let providers = match (config.kind, config.resolved_api_key()) {
        (ProviderKind::Stub, _) | (ProviderKind::Auto, None) => Providers::stub(config.stub_dim)?,
        (ProviderKind::OpenAi | ProviderKind::Auto, Some(key)) => Providers {
            embedder: Arc::new(OpenAiEmbedder::new(config, key.clone())),
            answerer: Arc::new(OpenAiAnswerer::new(config, key)),
        },
        (ProviderKind::OpenAi, None) => {
            return Err(Error::InvalidConfig(
                "provider.kind is 'openai' but no API key is configured (provider.api_key or OPENAI_API_KEY)".into(),
            ))
        }
    };
    info!(
        embedder = providers.embedder.id(),
        answerer = providers.answerer.id(),
        "selected providers"
    );
    Ok(providers)
}
