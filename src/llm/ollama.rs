//! Ollama completion backend.

use super::LanguageModel;
use crate::error::{PrimerError, Result};
use crate::ollama::OllamaClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Model served by Ollama's `/api/generate` endpoint.
pub struct OllamaModel {
    client: OllamaClient,
    model: String,
    temperature: f32,
}

impl OllamaModel {
    pub fn new(client: OllamaClient, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response: GenerateResponse = self
            .client
            .post_json("/api/generate", &request, PrimerError::Llm)
            .await?;

        debug!("Generated {} characters", response.response.len());
        Ok(response.response.trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
