mod gemini;
mod prompt;

use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{info, warn};

pub use gemini::{GeminiClient, GeminiConfig};
pub use prompt::{itinerary_prompt, sign_explanation_prompt, strip_code_fences};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model response carried no text")]
    EmptyCompletion,

    #[error("invalid model endpoint: {0}")]
    Endpoint(String),
}

/// A text-completion backend. Completions are untyped text; callers decide
/// how to interpret them.
pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, GenerationError>>;
}

#[derive(Clone, Default)]
pub struct GenerativeStack {
    pub generator: Option<Arc<dyn TextGenerator>>,
}

impl GenerativeStack {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
        }
    }

    /// Builds the Gemini backend when credentials are present in the
    /// environment. Without them the stack is disabled and callers fall back
    /// to static content.
    pub fn load_default() -> Self {
        let Some(config) = GeminiConfig::from_env() else {
            warn!("no Gemini API key configured; generative features use mock output");
            return Self::disabled();
        };

        match GeminiClient::new(config) {
            Ok(client) => {
                info!(model = client.model_name(), "generative model configured");
                Self::with_generator(Arc::new(client))
            }
            Err(err) => {
                warn!(error = %err, "failed to build Gemini client; generative features use mock output");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }
}
