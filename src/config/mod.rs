//! Configuration system
//!
//! Layered loading, later sources win:
//! - Global config (platform config dir, `config.toml`)
//! - Project config (`./adjutant.toml` or `.adjutant/config.toml`)
//! - Environment variables (`ADJUTANT_*`, `OLLAMA_HOST`)

use crate::provider::ollama::DEFAULT_BASE_URL;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub rag: RagConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name the backend should run
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Base URL of the Ollama-compatible backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature; tool-calling behaves best fully greedy
    #[serde(default)]
    pub temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_base_url(),
            temperature: 0.0,
        }
    }
}

fn default_model_name() -> String {
    "llama3.2".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum tool round trips per query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_max_iterations() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Where the index persists; defaults to the platform data dir
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_create_secs")]
    pub create_secs: u64,

    #[serde(default = "default_query_secs")]
    pub query_secs: u64,

    #[serde(default = "default_destroy_secs")]
    pub destroy_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_secs: default_create_secs(),
            query_secs: default_query_secs(),
            destroy_secs: default_destroy_secs(),
        }
    }
}

fn default_create_secs() -> u64 {
    30
}

fn default_query_secs() -> u64 {
    120
}

fn default_destroy_secs() -> u64 {
    5
}

impl Config {
    /// Load configuration from all sources (global, project, env)
    pub async fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let content = fs::read_to_string(&global_path).await?;
                let global: Config = toml::from_str(&content)?;
                config = global;
            }
        }

        for name in ["adjutant.toml", ".adjutant/config.toml"] {
            let path = PathBuf::from(name);
            if path.exists() {
                let content = fs::read_to_string(&path).await?;
                let project: Config = toml::from_str(&content)?;
                config = project;
            }
        }

        config.apply_env();
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "adjutant", "adjutant")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "adjutant", "adjutant").map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// The effective retrieval-store location.
    pub fn rag_store_path(&self) -> PathBuf {
        self.rag
            .store_path
            .clone()
            .or_else(|| Self::data_dir().map(|d| d.join("rag_store")))
            .unwrap_or_else(|| PathBuf::from("./data/rag_store"))
    }

    /// Write a default configuration file to the global location.
    pub async fn init_default() -> Result<()> {
        if let Some(path) = Self::global_config_path() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let content = toml::to_string_pretty(&Self::default())?;
            fs::write(&path, content).await?;
            tracing::info!(path = %path.display(), "Created config");
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("ADJUTANT_MODEL") {
            self.model.name = val;
        }
        if let Ok(val) = std::env::var("ADJUTANT_BACKEND_URL") {
            self.model.base_url = val;
        } else if let Ok(val) = std::env::var("OLLAMA_HOST") {
            self.model.base_url = val;
        }
        if let Ok(val) = std::env::var("ADJUTANT_RAG_STORE") {
            self.rag.store_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("ADJUTANT_MAX_ITERATIONS") {
            match val.parse() {
                Ok(n) => self.orchestrator.max_iterations = n,
                Err(_) => tracing::warn!(
                    value = %val,
                    "Invalid ADJUTANT_MAX_ITERATIONS; expected an integer"
                ),
            }
        }
        if let Ok(val) = std::env::var("ADJUTANT_BIND") {
            self.server.bind = val;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2");
        assert_eq!(config.orchestrator.max_iterations, 5);
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.overlap, 50);
    }

    #[test]
    fn toml_round_trip() {
        let config = Config::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.model.name, config.model.name);
        assert_eq!(parsed.timeouts.query_secs, config.timeouts.query_secs);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[model]\nname = \"mistral\"\n").unwrap();
        assert_eq!(parsed.model.name, "mistral");
        assert_eq!(parsed.orchestrator.max_iterations, 5);
    }
}
