//! Generation model boundary.
//!
//! A generation model turns one fully rendered prompt into one completion.
//! It is stateless: conversation history is carried in the prompt.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docent_core::config::ModelConfig;
use docent_core::error::{DocentError, Result};
use docent_vector::http;

#[async_trait]
pub trait GenerationModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Completion model served by Ollama's `/api/generate`.
#[derive(Clone, Debug)]
pub struct OllamaGeneration {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGeneration {
    pub fn new(client: Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let client = http::build_client(config.request_timeout_secs, false)?;
        Ok(Self::new(client, &config.base_url, &config.generation_model))
    }
}

#[async_trait]
impl GenerationModel for OllamaGeneration {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocentError::Generation(format!("Ollama unreachable at {}: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DocentError::Generation(format!(
                "Ollama request failed with status {}: {}. Make sure Ollama is running with: ollama serve",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| DocentError::Generation(format!("Malformed generate response: {}", e)))?;

        debug!(model = %self.model, prompt_chars = prompt.len(), "Generated completion");
        Ok(parsed.response)
    }
}

/// Generation double that replays a fixed script and records every prompt.
///
/// Each call consumes the next scripted entry. An exhausted script fails
/// with `Generation`.
#[derive(Debug, Default)]
pub struct ScriptedGeneration {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGeneration {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(response.into()));
        }
    }

    /// Queue a failure for the next call.
    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(message.into()));
        }
    }

    /// Every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GenerationModel for ScriptedGeneration {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|e| DocentError::Generation(format!("Lock poisoned: {}", e)))?
            .push(prompt.to_string());

        let next = self
            .script
            .lock()
            .map_err(|e| DocentError::Generation(format!("Lock poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(DocentError::Generation(message)),
            None => Err(DocentError::Generation("Script exhausted".to_string())),
        }
    }
}
