#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! With the `config` feature the configuration can be loaded from TOML or
//! JSON:
//!
//! ```toml
//! # panesync.toml
//! encodings = ["utf-8", "utf-16le"]
//! algorithm = "myers"
//!
//! [history]
//! max_depth = 200
//! ```
//!
//! Missing keys fall back to [`EngineConfig::default`].

use panesync_runtime::LogConfig;

use crate::matcher::MatchAlgorithm;

/// Settings shared by every operation of one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct EngineConfig {
    /// Encoding labels tried in order by `load`.
    pub encodings: Vec<String>,
    /// Diff algorithm for the default matcher.
    pub algorithm: MatchAlgorithm,
    /// Undo history limits.
    pub history: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            encodings: vec!["utf-8".to_owned(), "windows-1252".to_owned()],
            algorithm: MatchAlgorithm::default(),
            history: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Replace the candidate encodings.
    #[must_use]
    pub fn with_encodings<I, S>(mut self, encodings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.encodings = encodings.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: MatchAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Cap the number of undo steps kept.
    #[must_use]
    pub fn with_max_undo_depth(mut self, max_depth: usize) -> Self {
        self.history = LogConfig::new(max_depth);
        self
    }
}

#[cfg(feature = "config")]
mod load {
    use std::path::Path;

    use super::EngineConfig;

    /// Errors that can occur when loading an [`EngineConfig`].
    #[derive(Debug, thiserror::Error)]
    pub enum ConfigError {
        #[error("failed to read config: {0}")]
        Io(#[from] std::io::Error),
        #[error("invalid TOML config: {0}")]
        Toml(#[from] toml::de::Error),
        #[error("invalid JSON config: {0}")]
        Json(#[from] serde_json::Error),
    }

    impl EngineConfig {
        /// Parse from a TOML string.
        pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
            Ok(toml::from_str(s)?)
        }

        /// Load from a TOML file.
        pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml_str(&content)
        }

        /// Parse from a JSON string.
        pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
            Ok(serde_json::from_str(s)?)
        }
    }
}

#[cfg(feature = "config")]
pub use load::ConfigError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tries_utf8_then_legacy() {
        let config = EngineConfig::default();
        assert_eq!(config.encodings, vec!["utf-8", "windows-1252"]);
        assert_eq!(config.algorithm, MatchAlgorithm::Patience);
        assert_eq!(config.history, LogConfig::unlimited());
    }

    #[test]
    fn builders_replace_fields() {
        let config = EngineConfig::default()
            .with_encodings(["latin1"])
            .with_algorithm(MatchAlgorithm::Myers)
            .with_max_undo_depth(5);
        assert_eq!(config.encodings, vec!["latin1"]);
        assert_eq!(config.algorithm, MatchAlgorithm::Myers);
        assert_eq!(config.history.max_depth, 5);
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_overrides_and_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            algorithm = "myers"
            [history]
            max_depth = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.algorithm, MatchAlgorithm::Myers);
        assert_eq!(config.history.max_depth, 3);
        assert_eq!(config.encodings, EngineConfig::default().encodings);
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_file_round_trip() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "encodings = [\"utf-16le\"]").unwrap();
        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.encodings, vec!["utf-16le"]);
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_and_errors() {
        let config = EngineConfig::from_json_str(r#"{"algorithm":"patience"}"#).unwrap();
        assert_eq!(config.algorithm, MatchAlgorithm::Patience);
        assert!(matches!(
            EngineConfig::from_toml_str("algorithm = 7"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_file("/definitely/not/here.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
