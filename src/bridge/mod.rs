pub mod gemini;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::{timeout, Duration};

use crate::config::{Provider, RelayConfig};

pub use gemini::GeminiGenerator;
pub use openai::OpenAiGenerator;

/// Fixed sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_k: u32,
    pub top_p: f32,
}

pub const GENERATION_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.7,
    max_output_tokens: 1024,
    top_k: 40,
    top_p: 0.95,
};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("upstream request timed out after {0} ms")]
    Timeout(u64),

    #[error("failed to reach upstream: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider} API returned {status}: {body}")]
    UpstreamStatus {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl BridgeError {
    /// Status code reported by the upstream, if it answered with a non-success one.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, BridgeError>;
}

/// Builds the generator for the configured provider.
///
/// Returns `None` when the provider's credential is missing; callers must
/// report that as a configuration error without touching the network.
pub fn from_config(cfg: &RelayConfig, client: Client) -> Option<Arc<dyn TextGenerator>> {
    let api_key = cfg.api_key()?.clone();
    let generator: Arc<dyn TextGenerator> = match cfg.provider {
        Provider::Gemini => Arc::new(GeminiGenerator::new(
            client,
            &cfg.gemini_base_url,
            &cfg.gemini_model,
            api_key,
        )),
        Provider::OpenAi => Arc::new(OpenAiGenerator::new(
            client,
            &cfg.openai_base_url,
            &cfg.openai_model,
            api_key,
        )),
    };
    Some(generator)
}

pub async fn ask_via_bridge(
    prompt: &str,
    generator: &dyn TextGenerator,
    timeout_ms: u64,
) -> Result<String, BridgeError> {
    timeout(Duration::from_millis(timeout_ms), generator.generate(prompt))
        .await
        .map_err(|_| BridgeError::Timeout(timeout_ms))?
}

/// Reads the body of a non-success response into an `UpstreamStatus` error.
pub(crate) async fn status_error(
    provider: &'static str,
    response: reqwest::Response,
) -> BridgeError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unable to read response body>".to_string());
    BridgeError::UpstreamStatus {
        provider,
        status,
        body: body.trim().to_string(),
    }
}
