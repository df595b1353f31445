//! Compiler configuration.
//!
//! Resolved once at startup, later sources winning: built-in defaults, a
//! TOML file, then the `SQL_MAX_ROWS` / `SQL_LOGGING_ENABLE` environment
//! variables.
//!
//! ```toml
//! max_rows = 2000
//! logging = true
//! ```

use crate::error::{WeaveError, WeaveResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default row cap for reads and joined result sets.
pub const DEFAULT_MAX_ROWS: usize = 5000;

pub const ENV_MAX_ROWS: &str = "SQL_MAX_ROWS";
pub const ENV_LOGGING: &str = "SQL_LOGGING_ENABLE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Row cap used as the default read limit and after joins.
    pub max_rows: usize,
    /// Log every executed statement with its bindings.
    pub logging: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            logging: false,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    /// `$CONFIG_DIR/sqlweave/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqlweave").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> WeaveResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CompilerConfig = toml::from_str(&content)?;
        config.validate()
    }

    /// Defaults, then `path` (or the default file when present), then the
    /// process environment.
    pub fn load(path: Option<&Path>) -> WeaveResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "loading config file");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `SQL_MAX_ROWS` / `SQL_LOGGING_ENABLE` from `lookup`.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> WeaveResult<Self> {
        if let Some(raw) = lookup(ENV_MAX_ROWS) {
            self.max_rows = raw.trim().parse().map_err(|_| {
                WeaveError::Config(format!("{} must be a positive integer, got '{}'", ENV_MAX_ROWS, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_LOGGING) {
            self.logging = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()
    }

    fn validate(self) -> WeaveResult<Self> {
        if self.max_rows == 0 {
            return Err(WeaveError::Config("max_rows must be greater than zero".to_string()));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.max_rows, 5000);
        assert!(!config.logging);
    }

    #[test]
    fn test_env_overrides() {
        let config = CompilerConfig::default()
            .apply_overrides(env(&[("SQL_MAX_ROWS", "200"), ("SQL_LOGGING_ENABLE", "true")]))
            .unwrap();
        assert_eq!(config, CompilerConfig::new().max_rows(200).logging(true));
    }

    #[test]
    fn test_bad_max_rows() {
        for raw in ["abc", "0", "-1"] {
            let err = CompilerConfig::default()
                .apply_overrides(env(&[("SQL_MAX_ROWS", raw)]))
                .unwrap_err();
            assert!(matches!(err, WeaveError::Config(_)), "{}", raw);
        }
    }

    #[test]
    fn test_toml_partial() {
        let config: CompilerConfig = toml::from_str("logging = true").unwrap();
        assert_eq!(config.max_rows, DEFAULT_MAX_ROWS);
        assert!(config.logging);
    }
}
