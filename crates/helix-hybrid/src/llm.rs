//! Ollama `/api/generate` client.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use helix_core::config::LlmSettings;
use helix_core::traits::LanguageModel;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

pub struct OllamaModel {
    client: Client,
    endpoint: String,
    model: String,
}

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
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaModel {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        anyhow::ensure!(!settings.model.trim().is_empty(), "missing model name");
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        let endpoint = format!("{}/api/generate", settings.endpoint.trim_end_matches('/'));
        Ok(Self { client, endpoint, model: settings.model.clone() })
    }
}

impl LanguageModel for OllamaModel {
    fn generate(&self, prompt: &str, max_tokens: usize, temperature: f32) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature, num_predict: max_tokens },
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .with_context(|| format!("request to {} failed", self.endpoint))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("{} returned {status}: {body}", self.endpoint);
        }
        let body: GenerateResponse = response.json().context("invalid generate response")?;
        Ok(body.response.trim().to_string())
    }
}
