//! # Configuration Management for pgtypecast
//!
//! This crate provides the configuration structure for the literal codec:
//! leniency switches for decoding and the parser's nesting limit.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::CodecConfig;
//!
//! let config = CodecConfig::new(true, false, 16);
//! assert!(config.strict_booleans);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [codec]
//! strict_booleans = false
//! strict_composite_arity = false
//! max_nesting_depth = 32
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::CodecConfig;
//!
//! // Load from pgtypecast.toml (or the path in PGTYPECAST_CONFIG)
//! let config = CodecConfig::load()?;
//!
//! // Or load from custom path
//! let config = CodecConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./pgtypecast.toml";
const CONFIG_PATH_ENV: &str = "PGTYPECAST_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Layout of a configuration file; all settings live under `[codec]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    codec: CodecConfig,
}

/// Codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject boolean literals other than `t`, `true`, `f`, `false`
    /// instead of falling back to truthiness
    pub strict_booleans: bool,
    /// Reject composite literals whose field count differs from the declared type
    /// instead of padding missing fields with NULL
    pub strict_composite_arity: bool,
    /// Deepest brace nesting accepted when parsing array literals
    pub max_nesting_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            strict_booleans: false,
            strict_composite_arity: false,
            max_nesting_depth: 32,
        }
    }
}

impl CodecConfig {
    /// Create a new codec configuration
    pub fn new(
        strict_booleans: bool,
        strict_composite_arity: bool,
        max_nesting_depth: usize,
    ) -> Self {
        Self {
            strict_booleans,
            strict_composite_arity,
            max_nesting_depth,
        }
    }

    /// Configuration that turns every documented leniency into an error
    pub fn strict() -> Self {
        Self {
            strict_booleans: true,
            strict_composite_arity: true,
            ..Self::default()
        }
    }

    /// Load configuration from the TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is not an error
        dotenvy::dotenv().ok();

        // Try PGTYPECAST_CONFIG first
        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::from_file(&config_path)
        }
        // Try to load config from DEFAULT_CONFIG_PATH
        else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        }
        // Nothing configured: lenient defaults
        else {
            Ok(Self::default())
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.codec.validate()?;
        Ok(file.codec)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid(
                "Codec max_nesting_depth must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_lenient() {
        let config = CodecConfig::default();
        assert!(!config.strict_booleans);
        assert!(!config.strict_composite_arity);
        assert_eq!(config.max_nesting_depth, 32);
    }

    #[test]
    fn test_from_toml_str() {
        let config = CodecConfig::from_toml_str(
            r#"
            [codec]
            strict_booleans = true
            max_nesting_depth = 8
            "#,
        )
        .unwrap();

        assert!(config.strict_booleans);
        assert!(!config.strict_composite_arity);
        assert_eq!(config.max_nesting_depth, 8);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = CodecConfig::from_toml_str("").unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = CodecConfig::from_toml_str("[codec]\nmax_nesting_depth = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = CodecConfig::from_toml_str("[codec\nstrict_booleans = true");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_strict_preset() {
        let config = CodecConfig::strict();
        assert!(config.strict_booleans);
        assert!(config.strict_composite_arity);
        assert!(config.validate().is_ok());
    }
}
