//! Minimal HTTP client for a local Ollama server.

use crate::config::OllamaSettings;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// Ollama API client with retry on failed requests.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl OllamaClient {
    pub fn new(settings: &OllamaSettings, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if the server answers.
    pub async fn is_reachable(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// POST a JSON body to `path` and decode the JSON response.
    ///
    /// Failed attempts are retried with exponential backoff (1s, 2s, 4s, ...).
    /// `map_err` turns the final failure message into the caller's error variant.
    pub async fn post_json<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        map_err: impl Fn(String) -> crate::error::PrimerError,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = String::new();

        for attempt in 0..=self.max_retries {
            match self.try_post(&url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    last_error = e;
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.saturating_pow(attempt));
                        warn!(
                            "Ollama request to {} failed (attempt {}/{}), retrying in {:?}: {}",
                            path,
                            attempt + 1,
                            self.max_retries + 1,
                            delay,
                            last_error
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(map_err(last_error))
    }

    async fn try_post<Req, Resp>(&self, url: &str, body: &Req) -> std::result::Result<Resp, String>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {} - {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| format!("failed to parse response: {}", e))
    }
}
