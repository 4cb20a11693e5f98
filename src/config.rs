// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::models::CoinType;
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub graph: GraphConfig,
    pub text: TextConfig,
    pub pipeline: PipelineConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    Neo4j,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    pub backend: GraphBackend,
    pub uri: String,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub max_sessions: usize,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBackend {
    Tika,
    Plain,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextConfig {
    pub backend: TextBackend,
    pub tika_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
    pub hash_chunk_size: usize,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    pub emails: bool,
    pub ipv4: bool,
    #[serde(default)]
    pub coins: Vec<String>,
}

impl ExtractionConfig {
    pub fn coin_types(&self) -> Result<Vec<CoinType>> {
        self.coins
            .iter()
            .map(|ticker| {
                CoinType::from_ticker(ticker).ok_or_else(|| {
                    PipelineError::Config(format!("unsupported coin type: {}", ticker))
                })
            })
            .collect()
    }
}

impl Config {
    /// Built-in defaults, then the settings file if present, then `IOC_GRAPH__*`
    /// environment variables (after `.env` is loaded).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let file = path.unwrap_or_else(|| Path::new("config/default.toml"));

        let builder = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix("IOC_GRAPH")
                    .separator("__")
                    .try_parsing(true),
            );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            graph: GraphConfig {
                backend: GraphBackend::Neo4j,
                uri: "http://localhost:7474".to_string(),
                database: "neo4j".to_string(),
                username: "neo4j".to_string(),
                password: None,
                max_sessions: 8,
                retry_attempts: 3,
                retry_backoff_ms: 200,
                request_timeout_secs: 30,
            },
            text: TextConfig {
                backend: TextBackend::Tika,
                tika_url: "http://localhost:9998".to_string(),
                request_timeout_secs: 120,
            },
            pipeline: PipelineConfig {
                parallel_workers: 4,
                skip_patterns: vec![".git/".to_string()],
                max_file_size_mb: 0,
                hash_chunk_size: 64 * 1024,
                show_progress: true,
            },
            extraction: ExtractionConfig {
                emails: true,
                ipv4: true,
                coins: vec!["btc".to_string()],
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(PipelineError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.hash_chunk_size == 0 {
            return Err(PipelineError::Config(
                "hash_chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.graph.max_sessions == 0 {
            return Err(PipelineError::Config(
                "max_sessions must be greater than 0".to_string(),
            ));
        }

        if self.graph.retry_attempts == 0 {
            return Err(PipelineError::Config(
                "retry_attempts must be at least 1".to_string(),
            ));
        }

        if self.graph.backend == GraphBackend::Neo4j {
            Validator::validate_url(&self.graph.uri)?;
        }
        if self.text.backend == TextBackend::Tika {
            Validator::validate_url(&self.text.tika_url)?;
        }

        let coins = self.extraction.coin_types()?;
        if !self.extraction.emails && !self.extraction.ipv4 && coins.is_empty() {
            return Err(PipelineError::Config(
                "at least one indicator kind must be enabled".to_string(),
            ));
        }

        Ok(())
    }
}
