use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::core::TextGenerator;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AIProvider {
    Gemini,
    OpenAI,
    Ollama,
}

impl AIProvider {
    /// Environment variable holding the credential, if the backend needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            AIProvider::Gemini => Some("GEMINI_API_KEY"),
            AIProvider::OpenAI => Some("OPENAI_API_KEY"),
            AIProvider::Ollama => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::Gemini => "gemini-2.5-flash",
            AIProvider::OpenAI => "gpt-4o-mini",
            AIProvider::Ollama => "qwen2.5",
        }
    }
}

impl std::fmt::Display for AIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AIProvider::Gemini => write!(f, "gemini"),
            AIProvider::OpenAI => write!(f, "openai"),
            AIProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for AIProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(AIProvider::Gemini),
            "openai" | "gpt" => Ok(AIProvider::OpenAI),
            "ollama" => Ok(AIProvider::Ollama),
            _ => Err(anyhow!("Unknown AI provider: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl Default for AIConfig {
    fn default() -> Self {
        AIConfig {
            provider: AIProvider::Gemini,
            model: AIProvider::Gemini.default_model().to_string(),
            api_key: None,
            base_url: None,
            max_tokens: Some(512),
            temperature: Some(0.9),
            timeout_secs: 30,
        }
    }
}

pub struct AIProviderClient {
    config: AIConfig,
    http_client: reqwest::Client,
}

impl AIProviderClient {
    pub fn new(config: AIConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(AIProviderClient {
            config,
            http_client,
        })
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        match self.config.provider {
            AIProvider::Gemini => self.complete_gemini(prompt).await,
            AIProvider::OpenAI => self.complete_openai(prompt).await,
            AIProvider::Ollama => self.complete_ollama(prompt).await,
        }
    }

    fn base_url(&self, fallback: &str) -> String {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(fallback)
            .trim_end_matches('/')
            .to_string()
    }

    async fn complete_gemini(&self, prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow!("Gemini API key required"))?;

        let request_body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens
            }
        });

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url(GEMINI_BASE_URL),
            self.config.model
        );
        let response = self.http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let response_json: Value = response.json().await?;
        parse_gemini_response(&response_json)
    }

    async fn complete_openai(&self, prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_ref()
            .ok_or_else(|| anyhow!("OpenAI API key required"))?;

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature
        });

        let url = format!("{}/v1/chat/completions", self.base_url(OPENAI_BASE_URL));
        let response = self.http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let response_json: Value = response.json().await?;
        parse_openai_response(&response_json)
    }

    async fn complete_ollama(&self, prompt: &str) -> Result<String> {
        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false
        });

        let url = format!("{}/api/chat", self.base_url(OLLAMA_BASE_URL));
        let response = self.http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("Ollama API error: {}", error_text));
        }

        let response_json: Value = response.json().await?;
        parse_ollama_response(&response_json)
    }

    pub fn get_model(&self) -> &str {
        &self.config.model
    }

    pub fn get_provider(&self) -> &AIProvider {
        &self.config.provider
    }
}

#[async_trait]
impl TextGenerator for AIProviderClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(provider = %self.config.provider, model = %self.config.model, "calling text generator");
        self.complete(prompt).await
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.config.provider, self.config.model)
    }
}

pub fn parse_gemini_response(response_json: &Value) -> Result<String> {
    if let Some(reason) = response_json["promptFeedback"]["blockReason"].as_str() {
        return Err(anyhow!("Gemini blocked the request: {}", reason));
    }

    let parts = response_json["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| anyhow!("Invalid Gemini response format"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    if text.is_empty() {
        return Err(anyhow!("Gemini response contained no text"));
    }
    Ok(text)
}

pub fn parse_openai_response(response_json: &Value) -> Result<String> {
    response_json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid OpenAI response format"))
}

pub fn parse_ollama_response(response_json: &Value) -> Result<String> {
    response_json["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid Ollama response format"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Gemini".parse::<AIProvider>().unwrap(), AIProvider::Gemini);
        assert_eq!("gpt".parse::<AIProvider>().unwrap(), AIProvider::OpenAI);
        assert_eq!("ollama".parse::<AIProvider>().unwrap(), AIProvider::Ollama);
        assert!("claude".parse::<AIProvider>().is_err());
    }

    #[test]
    fn test_api_key_env() {
        assert_eq!(AIProvider::Gemini.api_key_env(), Some("GEMINI_API_KEY"));
        assert_eq!(AIProvider::Ollama.api_key_env(), None);
    }

    #[test]
    fn test_parse_gemini_response() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "**Leaf Parade!** " }, { "text": "Collect leaves." }],
                    "role": "model"
                }
            }]
        });
        assert_eq!(parse_gemini_response(&body).unwrap(), "**Leaf Parade!** Collect leaves.");

        let blocked = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_gemini_response(&blocked).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));

        assert!(parse_gemini_response(&json!({ "candidates": [] })).is_err());
    }

    #[test]
    fn test_parse_openai_response() {
        let body = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Sock puppet show" } }],
            "usage": { "total_tokens": 42 }
        });
        assert_eq!(parse_openai_response(&body).unwrap(), "Sock puppet show");
        assert!(parse_openai_response(&json!({ "error": "nope" })).is_err());
    }

    #[test]
    fn test_parse_ollama_response() {
        let body = json!({ "message": { "role": "assistant", "content": "Cardboard fort" }, "done": true });
        assert_eq!(parse_ollama_response(&body).unwrap(), "Cardboard fort");
        assert!(parse_ollama_response(&json!({})).is_err());
    }

    #[test]
    fn test_client_describe() {
        let client = AIProviderClient::new(AIConfig {
            provider: AIProvider::Ollama,
            model: "llama3".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.describe(), "ollama (llama3)");
        assert_eq!(client.get_model(), "llama3");
    }

    #[tokio::test]
    async fn test_missing_key_is_an_error() {
        let client = AIProviderClient::new(AIConfig::default()).unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert!(err.to_string().contains("API key required"));
    }
}
