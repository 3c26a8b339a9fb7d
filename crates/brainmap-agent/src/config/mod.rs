//! Configuration loading for Brainmap.
//! Reads brainmap.toml from the current directory or path in BRAINMAP_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use brainmap_ingestion::repository::DEFAULT_DATA_DIR;
use brainmap_ingestion::sources::ALLEN_API_URL;
use brainmap_ranker::figures::{DEFAULT_RESULTS_DIR, DEFAULT_TOP_N};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub atlas: AtlasConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub figures: FiguresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url()     -> String { ALLEN_API_URL.to_string() }
fn default_timeout_secs() -> u64    { 30 }

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_secs: default_timeout_secs() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_genes")]
    pub genes: Vec<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

// Genes implicated in neurodegenerative disease
fn default_genes() -> Vec<String> {
    vec!["APP".to_string(), "MAPT".to_string(), "SNCA".to_string()]
}
fn default_data_dir() -> PathBuf { PathBuf::from(DEFAULT_DATA_DIR) }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { genes: default_genes(), data_dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiguresConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn bool_true()           -> bool    { true }
fn default_results_dir() -> PathBuf { PathBuf::from(DEFAULT_RESULTS_DIR) }
fn default_top_n()       -> usize   { DEFAULT_TOP_N }

impl Default for FiguresConfig {
    fn default() -> Self {
        Self { enabled: bool_true(), results_dir: default_results_dir(), top_n: default_top_n() }
    }
}


impl Config {
    /// Load configuration from brainmap.toml.
    /// Checks BRAINMAP_CONFIG env var first, then current directory.
    /// A missing file yields the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("BRAINMAP_CONFIG")
            .unwrap_or_else(|_| "brainmap.toml".to_string());

        if !Path::new(&path).exists() {
            tracing::warn!("Config file not found: {}, using defaults", path);
            return Ok(Self::default());
        }

        Self::from_file(Path::new(&path))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.atlas.timeout_secs == 0 {
            anyhow::bail!("atlas.timeout_secs must be greater than zero");
        }
        if self.figures.top_n == 0 {
            anyhow::bail!("figures.top_n must be greater than zero");
        }
        Ok(())
    }
}
