use std::path::PathBuf;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use anyhow::{Result, Context};

use crate::ai_provider::{AIConfig, AIProvider, AIProviderClient};
use crate::core::player::{default_roster, PlayerProfile};
use crate::core::{FinderError, SuggestionRequester};

pub const PROVIDER_ENV: &str = "FUNFINDER_PROVIDER";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub default_provider: String,
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_roster")]
    pub players: Vec<PlayerProfile>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub default_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn default_data_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("funfinder")
    }

    /// Loads `config.json` from the data directory, writing a default one on
    /// first run, then layers credentials from the environment on top.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(Self::default_data_dir);

        std::fs::create_dir_all(&data_dir)
            .context("Failed to create data directory")?;

        let config_path = data_dir.join("config.json");

        let mut config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .context("Failed to read config.json")?;

            if config_str.trim().is_empty() {
                tracing::warn!(path = %config_path.display(), "config file is empty, using defaults");
                Self::default_config(data_dir)
            } else {
                Self::from_json_str(&config_str, data_dir)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))?
            }
        } else {
            let config = Self::default_config(data_dir);
            config.save()?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            config
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_json_str(json: &str, data_dir: PathBuf) -> Result<Self> {
        let mut config: Config = serde_json::from_str(json)?;
        config.data_dir = data_dir;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = self.config_file();
        let json_str = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(&config_path, json_str)
            .context("Failed to write config.json")?;
        Ok(())
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Fills empty API keys from the environment and honors a provider
    /// override. `lookup` is `std::env::var` outside of tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = lookup(PROVIDER_ENV).filter(|p| !p.trim().is_empty()) {
            self.default_provider = provider.trim().to_lowercase();
        }

        for (name, provider_config) in self.providers.iter_mut() {
            let Ok(provider) = name.parse::<AIProvider>() else {
                continue;
            };
            let Some(env_name) = provider.api_key_env() else {
                continue;
            };
            if provider_config.api_key.as_ref().map_or(true, |key| key.trim().is_empty()) {
                provider_config.api_key = lookup(env_name).filter(|key| !key.trim().is_empty());
            }
        }
    }

    fn default_config(data_dir: PathBuf) -> Self {
        let mut providers = HashMap::new();

        providers.insert("gemini".to_string(), ProviderConfig {
            default_model: AIProvider::Gemini.default_model().to_string(),
            host: None,
            api_key: None,
            temperature: None,
            max_tokens: None,
        });

        providers.insert("openai".to_string(), ProviderConfig {
            default_model: AIProvider::OpenAI.default_model().to_string(),
            host: None,
            api_key: None,
            temperature: None,
            max_tokens: None,
        });

        providers.insert("ollama".to_string(), ProviderConfig {
            default_model: AIProvider::Ollama.default_model().to_string(),
            host: Some(crate::ai_provider::OLLAMA_BASE_URL.to_string()),
            api_key: None,
            temperature: None,
            max_tokens: None,
        });

        Config {
            data_dir,
            default_provider: "gemini".to_string(),
            providers,
            players: default_roster(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn get_provider(&self, provider_name: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider_name)
    }

    pub fn get_ai_config(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> std::result::Result<AIConfig, FinderError> {
        let ai_provider: AIProvider = provider
            .unwrap_or(&self.default_provider)
            .parse()
            .map_err(|e: anyhow::Error| FinderError::Config(e.to_string()))?;
        // Aliases such as "google" resolve to the canonical map key.
        let provider_name = ai_provider.to_string();
        let provider_config = self.get_provider(&provider_name).ok_or_else(|| {
            FinderError::Config(format!("provider '{}' has no entry in config.json", provider_name))
        })?;

        let api_key = provider_config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty());
        if let Some(env_name) = ai_provider.api_key_env() {
            if api_key.is_none() {
                return Err(FinderError::NotConfigured(format!(
                    "{} is not set; export it or add an api_key for '{}' in {}",
                    env_name,
                    provider_name,
                    self.config_file().display()
                )));
            }
        }

        let defaults = AIConfig::default();
        Ok(AIConfig {
            provider: ai_provider,
            model: model
                .map(str::to_string)
                .unwrap_or_else(|| provider_config.default_model.clone()),
            api_key,
            base_url: provider_config.host.clone(),
            max_tokens: provider_config.max_tokens.or(defaults.max_tokens),
            temperature: provider_config.temperature.or(defaults.temperature),
            timeout_secs: self.timeout_secs,
        })
    }

    /// Builds the requester for a session. Any configuration problem yields
    /// a requester that reports `NotConfigured` instead of failing start-up.
    pub fn suggestion_requester(&self, provider: Option<&str>, model: Option<&str>) -> SuggestionRequester {
        let client = self
            .get_ai_config(provider, model)
            .and_then(|ai_config| {
                AIProviderClient::new(ai_config).map_err(|e| FinderError::Config(e.to_string()))
            });

        match client {
            Ok(client) => {
                tracing::info!(provider = %client.get_provider(), model = client.get_model(), "text generator ready");
                SuggestionRequester::new(client)
            }
            Err(e) => {
                tracing::warn!(error = %e, "suggestions disabled");
                SuggestionRequester::not_configured(e.to_string())
            }
        }
    }
}

/// Shows only the last four characters of a credential.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(8), tail)
}
