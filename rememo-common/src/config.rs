//! Configuration loading and resolution
//!
//! Bootstrap configuration lives in a single TOML file. Every section and
//! field has a compiled default, so a missing file never prevents startup.
//!
//! # Config file priority
//!
//! 1. Explicit path (command-line `--config`)
//! 2. `REMEMO_CONFIG` environment variable
//! 3. Platform config directory: `<config_dir>/rememo/<module>.toml`
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "REMEMO_CONFIG";

/// Environment variable holding the OpenAI API key
pub const OPENAI_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Root TOML configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub openai: OpenAiConfig,
    pub aesthetic: AestheticConfig,
    pub fetch: FetchConfig,
    pub selection: SelectionConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Multimodal model endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (the environment variable takes priority)
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used for diary writing and collage judging
    pub model: String,
    /// Small model used for emotion labelling
    pub emotion_model: String,
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4.1".to_string(),
            emotion_model: "gpt-4.1-nano".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Embedding & aesthetic provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AestheticConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for AestheticConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8765/evaluate".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Photo download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum simultaneous photo downloads per request
    pub max_concurrency: usize,
    pub timeout_secs: u64,
    /// Width photos are resized to before being sent to the diary model
    pub diary_image_width: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 25,
            timeout_secs: 30,
            diary_image_width: 800,
        }
    }
}

/// Which greedy selector drives the aesthetic ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategyKind {
    /// Visiting order fixed up front by composite score
    #[default]
    FrozenOrder,
    /// Re-pick the best remaining candidate after every selection
    MarginalRelevance,
}

/// Selection engine tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Result cap for the aesthetic path
    pub aesthetic_top_n: usize,
    /// Exact result size for the collage-vote path
    pub collage_top_n: usize,
    /// Multiplier on summed similarity to already-visited photos
    pub penalty_weight: f32,
    /// Share of the composite score given to aesthetics (rest is diversity)
    pub aesthetic_weight: f32,
    pub strategy: SelectionStrategyKind,
    /// Candidate collage is `collage_grid` x `collage_grid`
    pub collage_grid: u32,
    /// Reference collage is `reference_grid` x `reference_grid`
    pub reference_grid: u32,
    /// Edge length of one collage cell in pixels
    pub thumb_size: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            aesthetic_top_n: 10,
            collage_top_n: 9,
            penalty_weight: 0.8,
            aesthetic_weight: 0.5,
            strategy: SelectionStrategyKind::FrozenOrder,
            collage_grid: 4,
            reference_grid: 3,
            thumb_size: 500,
        }
    }
}

impl SelectionConfig {
    /// Reject settings that would make scores meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.aesthetic_weight.is_finite() || !(0.0..=1.0).contains(&self.aesthetic_weight) {
            return Err(Error::Config(format!(
                "selection.aesthetic_weight must be within [0, 1], got {}",
                self.aesthetic_weight
            )));
        }
        if !self.penalty_weight.is_finite() || self.penalty_weight < 0.0 {
            return Err(Error::Config(format!(
                "selection.penalty_weight must be a non-negative number, got {}",
                self.penalty_weight
            )));
        }
        if self.aesthetic_top_n == 0 || self.collage_top_n == 0 {
            return Err(Error::Config(
                "selection.aesthetic_top_n and selection.collage_top_n must be at least 1".to_string(),
            ));
        }
        if self.collage_grid == 0 || self.reference_grid == 0 || self.thumb_size == 0 {
            return Err(Error::Config(
                "selection grid sizes and thumb_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tier that supplied the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTier {
    CommandLine,
    Environment,
    UserConfigDir,
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from a file found at the given tier
    File { path: PathBuf, tier: ConfigTier },
    /// Compiled defaults; `looked_for` is the file that was expected but missing
    Defaults { looked_for: Option<PathBuf> },
}

/// Resolves and loads the TOML configuration for one module
pub struct ConfigResolver {
    module_name: String,
    explicit_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            explicit_path: None,
        }
    }

    /// Highest-priority path, usually from the command line
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// First configured location in priority order, whether or not it exists
    pub fn candidate_path(&self) -> Option<(PathBuf, ConfigTier)> {
        if let Some(path) = &self.explicit_path {
            return Some((path.clone(), ConfigTier::CommandLine));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some((PathBuf::from(path), ConfigTier::Environment));
            }
        }

        dirs::config_dir().map(|dir| {
            (
                dir.join("rememo").join(format!("{}.toml", self.module_name)),
                ConfigTier::UserConfigDir,
            )
        })
    }

    /// Load the effective configuration
    ///
    /// A missing file falls back to compiled defaults. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(&self) -> Result<(TomlConfig, ConfigSource)> {
        match self.candidate_path() {
            Some((path, tier)) if path.exists() => {
                let config = load_toml_config(&path)?;
                Ok((config, ConfigSource::File { path, tier }))
            }
            Some((path, _)) => Ok((
                TomlConfig::default(),
                ConfigSource::Defaults {
                    looked_for: Some(path),
                },
            )),
            None => Ok((TomlConfig::default(), ConfigSource::Defaults { looked_for: None })),
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    Ok(toml::from_str(&content)?)
}

/// Resolve the OpenAI API key
///
/// **Priority:** ENV → TOML
pub fn resolve_openai_api_key(config: &OpenAiConfig) -> Result<String> {
    let env_key = std::env::var(OPENAI_KEY_ENV_VAR)
        .ok()
        .filter(|key| is_valid_key(key));
    let toml_key = config.api_key.clone().filter(|key| is_valid_key(key));

    if env_key.is_some() && toml_key.is_some() {
        tracing::warn!(
            "OpenAI API key found in both environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        tracing::info!("OpenAI API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        tracing::info!("OpenAI API key loaded from TOML config");
        return Ok(key);
    }

    Err(Error::Config(format!(
        "OpenAI API key not configured. Set {} or openai.api_key in the TOML config",
        OPENAI_KEY_ENV_VAR
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_selection() {
        let config = TomlConfig::default();
        assert_eq!(config.selection.aesthetic_top_n, 10);
        assert_eq!(config.selection.collage_top_n, 9);
        assert!((config.selection.penalty_weight - 0.8).abs() < f32::EPSILON);
        assert!((config.selection.aesthetic_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.selection.strategy, SelectionStrategyKind::FrozenOrder);
        assert_eq!(config.fetch.max_concurrency, 25);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            [selection]
            penalty_weight = 0.5
            strategy = "marginal_relevance"
            "#,
        )
        .unwrap();

        assert!((config.selection.penalty_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.selection.strategy, SelectionStrategyKind::MarginalRelevance);
        assert_eq!(config.selection.aesthetic_top_n, 10);
        assert_eq!(config.server.port, 5780);
        assert_eq!(config.openai.model, "gpt-4.1");
    }

    #[test]
    fn test_validate_rejects_out_of_range_weights() {
        let mut selection = SelectionConfig::default();
        assert!(selection.validate().is_ok());

        selection.aesthetic_weight = 1.5;
        assert!(selection.validate().is_err());

        selection.aesthetic_weight = 0.5;
        selection.penalty_weight = -0.1;
        assert!(selection.validate().is_err());

        selection.penalty_weight = f32::NAN;
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let selection = SelectionConfig {
            collage_top_n: 0,
            ..SelectionConfig::default()
        };
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("sk-test"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }
}
