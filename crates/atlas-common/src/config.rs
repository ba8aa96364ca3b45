//! Configuration loading for the dashboard.
//! Reads atlas.toml from the current directory or the path in ATLAS_CONFIG.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::entities::Subject;
use crate::error::{AtlasError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub range: RangeConfig,
    #[serde(default)]
    pub genes: GeneConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Normalization requested for the detailed dataset.
    #[serde(default = "default_normalization")]
    pub detail_normalization: String,
}

fn default_base_url()      -> String { "http://127.0.0.1:5000".to_string() }
fn default_timeout_secs()  -> u64    { 30 }
fn default_normalization() -> String { "TPM_means".to_string() }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            detail_normalization: default_normalization(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Minimum distance between the low and high slider handles.
    #[serde(default = "default_min_gap")]
    pub min_gap: u32,
    /// Fraction of the domain where the low handle starts on the
    /// top-variant axis.
    #[serde(default = "default_top_variant_fraction")]
    pub top_variant_fraction: f64,
    #[serde(default = "default_top_variant_subject")]
    pub top_variant_subject: Subject,
}

fn default_min_gap()              -> u32     { 2 }
fn default_top_variant_fraction() -> f64     { 0.9 }
fn default_top_variant_subject()  -> Subject { Subject::A }

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min_gap: default_min_gap(),
            top_variant_fraction: default_top_variant_fraction(),
            top_variant_subject: default_top_variant_subject(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneConfig {
    /// How many leading symbols a gene picker preselects.
    #[serde(default = "default_gene_count")]
    pub default_count: usize,
}

fn default_gene_count() -> usize { 3 }

impl Default for GeneConfig {
    fn default() -> Self {
        Self { default_count: default_gene_count() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Serve two independent panels side by side.
    #[serde(default)]
    pub comparison: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_bind()       -> String { "127.0.0.1:3001".to_string() }
fn default_static_dir() -> String { "static".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            comparison: false,
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String { "atlas=debug,info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

impl DashboardConfig {
    /// Load configuration from atlas.toml.
    /// Checks ATLAS_CONFIG env var first, then current directory.
    /// A missing file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("ATLAS_CONFIG")
            .unwrap_or_else(|_| "atlas.toml".to_string());

        if !Path::new(&path).exists() {
            warn!(path = %path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AtlasError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| AtlasError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| AtlasError::Config(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| AtlasError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.base_url.trim().is_empty() {
            return Err(AtlasError::Config("source.base_url must not be empty".into()));
        }
        if self.range.min_gap == 0 {
            return Err(AtlasError::Config("range.min_gap must be at least 1".into()));
        }
        let fraction = self.range.top_variant_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(AtlasError::Config(format!(
                "range.top_variant_fraction must be in (0, 1], got {fraction}"
            )));
        }
        Ok(())
    }
}
