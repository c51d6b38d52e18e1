// Configuration loading and parsing (mnp.toml).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("could not determine a config directory for this platform")]
    NoConfigDir,
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

/// Top-level configuration. Every section is optional in the file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub confidence: ConfidenceConfig,
    pub database: DatabaseConfig,
}

/// Tunables shared by the analyses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// How many players per machine are treated as the team's likely players.
    pub likely_players: usize,
    /// Minimum games on a machine before it counts toward strongest/weakest.
    pub min_games: usize,
    /// Length of the strongest and weakest lists.
    pub summary_size: usize,
    /// P50 gap between best players beyond which a pick is strong or weak.
    pub verdict_margin: i64,
    /// Copied from the top-level `[confidence]` table at load time.
    #[serde(skip)]
    pub confidence: ConfidenceConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            likely_players: 2,
            min_games: 3,
            summary_size: 3,
            verdict_margin: 1_000_000,
            confidence: ConfidenceConfig::default(),
        }
    }
}

/// Average-games thresholds for matchup confidence.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub medium_games: f64,
    pub high_games: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        ConfidenceConfig {
            medium_games: 3.0,
            high_games: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: "mnp.db".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from an explicit file path. The file must
/// exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let config = parse_config(&text, path)?;
    debug!("Config loaded from {}", path.display());
    Ok(config)
}

/// Load configuration from the platform config directory
/// (e.g. `~/.config/mnp/mnp.toml`). A missing file yields the defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = default_config_path()?;
    if !path.exists() {
        info!("No config at {}; using defaults", path.display());
        return Ok(Config::default());
    }
    load_config_from(&path)
}

/// Where `load_config` looks for the config file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("", "", "mnp").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().join("mnp.toml"))
}

fn parse_config(text: &str, path: &Path) -> Result<Config, ConfigError> {
    let mut config: Config = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    config.analysis.confidence = config.confidence;
    validate(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let analysis = &config.analysis;
    let count_fields: &[(&str, usize)] = &[
        ("analysis.likely_players", analysis.likely_players),
        ("analysis.min_games", analysis.min_games),
        ("analysis.summary_size", analysis.summary_size),
    ];
    for (name, val) in count_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if analysis.verdict_margin < 0 {
        return Err(ConfigError::ValidationError {
            field: "analysis.verdict_margin".into(),
            message: format!("must be >= 0, got {}", analysis.verdict_margin),
        });
    }

    let c = &config.confidence;
    let thresholds = [
        ("confidence.medium_games", c.medium_games),
        ("confidence.high_games", c.high_games),
    ];
    for (name, val) in thresholds {
        if !val.is_finite() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite number, got {val}"),
            });
        }
    }
    if c.medium_games <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "confidence.medium_games".into(),
            message: format!("must be > 0, got {}", c.medium_games),
        });
    }
    if c.high_games < c.medium_games {
        return Err(ConfigError::ValidationError {
            field: "confidence.high_games".into(),
            message: format!(
                "must be >= confidence.medium_games ({}), got {}",
                c.medium_games, c.high_games
            ),
        });
    }

    if config.database.path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
