//! Language model backends for answer generation.

mod ollama;
mod openai;

pub use ollama::OllamaModel;
pub use openai::OpenAIModel;

use crate::config::{Provider, Settings};
use crate::error::Result;
use crate::ollama::OllamaClient;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a fully rendered prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Name of the model.
    fn model(&self) -> &str;
}

/// Build the language model selected by the settings.
pub fn create_model(settings: &Settings) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match settings.llm.provider {
        Provider::Ollama => Arc::new(OllamaModel::new(
            OllamaClient::new(&settings.ollama, settings.general.request_timeout())?,
            &settings.llm.model,
            settings.llm.temperature,
        )),
        Provider::OpenAI => Arc::new(OpenAIModel::new(
            &settings.llm.model,
            settings.llm.temperature,
            settings.general.request_timeout(),
        )?),
    };
    Ok(model)
}
