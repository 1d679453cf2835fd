//! Interpreter configuration
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! eval_mode = "legacy"        # or "precedence"
//! scope_mode = "stack"        # or "single-slot"
//! max_iterations = 1000
//! max_call_depth = 256
//!
//! [canvas]
//! width = 640
//! height = 480
//! ```

use crate::interp::{EvalMode, ScopeMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loop iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Nested method call limit
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub eval_mode: EvalMode,
    pub scope_mode: ScopeMode,
    pub max_iterations: usize,
    pub max_call_depth: usize,
    pub canvas: CanvasConfig,
}

/// Size of the drawing surface the CLI and REPL create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: i64,
    pub height: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            eval_mode: EvalMode::default(),
            scope_mode: ScopeMode::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            canvas: CanvasConfig::default(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl Config {
    /// Read a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.canvas.width <= 0 || self.canvas.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be positive, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
        let config = Config::default();
        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.eval_mode, EvalMode::Legacy);
        assert_eq!(config.scope_mode, ScopeMode::Stack);
    }

    #[test]
    fn test_parse_all_fields() {
        let config = Config::from_toml_str(
            r#"
            eval_mode = "precedence"
            scope_mode = "single-slot"
            max_iterations = 50
            max_call_depth = 8

            [canvas]
            width = 200
            height = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.eval_mode, EvalMode::Precedence);
        assert_eq!(config.scope_mode, ScopeMode::SingleSlot);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.max_call_depth, 8);
        assert_eq!(config.canvas, CanvasConfig { width: 200, height: 100 });
    }

    #[test]
    fn test_partial_canvas_section() {
        let config = Config::from_toml_str("[canvas]\nwidth = 320\n").unwrap();
        assert_eq!(config.canvas.width, 320);
        assert_eq!(config.canvas.height, 480);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            Config::from_toml_str("eval_mode = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[canvas]\nwidth = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/boose.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/boose.toml"));
    }
}
