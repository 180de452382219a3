//! Backoffice configuration
//!
//! Loaded from TOML, then overridden by `BACKOFFICE_*` environment variables,
//! then validated. Every field has a default so an empty file is valid.
//!
//! ```toml
//! [notifications]
//! peek_duration_ms = 6000
//!
//! [modals]
//! default_type = "sidebar"
//!
//! [logging]
//! level = "debug"
//!
//! [extensions]
//! manifest_paths = ["plugins/umbraco-package.json"]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::modal::{ModalSize, ModalType};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "BACKOFFICE_";

/// Default auto-dismiss delay of peeked notifications.
pub const DEFAULT_PEEK_DURATION_MS: u64 = 6000;

/// Notification manager settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Auto-dismiss delay of `peek`, in milliseconds
    pub peek_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            peek_duration_ms: DEFAULT_PEEK_DURATION_MS,
        }
    }
}

/// Modal manager settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalDefaults {
    /// Presentation used when neither the token nor the caller picks one
    pub default_type: ModalType,
    /// Size used when neither the token nor the caller picks one
    pub default_size: ModalSize,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Colored output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Extension loading settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Manifest JSON files registered at startup
    pub manifest_paths: Vec<PathBuf>,
}

/// Complete backoffice configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackofficeConfig {
    /// Notification manager
    pub notifications: NotificationConfig,
    /// Modal manager
    pub modals: ModalDefaults,
    /// Logging
    pub logging: LoggingConfig,
    /// Extensions
    pub extensions: ExtensionConfig,
}

impl BackofficeConfig {
    /// Defaults, overridden by `path` if given, then by the environment, then
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Missing sections take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `BACKOFFICE_*` variables from the process environment.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply `BACKOFFICE_SECTION_KEY=value` pairs.
    ///
    /// Variables that do not map to a known key are ignored.
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let Some((section, key)) = rest.split_once('_') else {
                continue;
            };
            let dotted = format!("{}.{}", section.to_lowercase(), key.to_lowercase());
            if Self::is_known_key(&dotted) {
                tracing::debug!(variable = %name, key = %dotted, "config override from environment");
                self.set_from_string(&dotted, &value)?;
            }
        }
        Ok(())
    }

    /// Overlay every non-default field of `other`.
    pub fn merge_with(&mut self, other: &Self) {
        let defaults = Self::default();
        if other.notifications != defaults.notifications {
            self.notifications = other.notifications.clone();
        }
        if other.modals.default_type != defaults.modals.default_type {
            self.modals.default_type = other.modals.default_type;
        }
        if other.modals.default_size != defaults.modals.default_size {
            self.modals.default_size = other.modals.default_size;
        }
        if other.logging.level != defaults.logging.level {
            self.logging.level.clone_from(&other.logging.level);
        }
        if other.logging.ansi != defaults.logging.ansi {
            self.logging.ansi = other.logging.ansi;
        }
        self.extensions
            .manifest_paths
            .extend(other.extensions.manifest_paths.iter().cloned());
    }

    /// Set one value by dotted key, e.g. `notifications.peek_duration_ms`.
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "notifications.peek_duration_ms" => {
                self.notifications.peek_duration_ms = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::invalid(key, format!("'{value}' is not a number")))?;
            }
            "modals.default_type" => {
                self.modals.default_type = value.parse().map_err(|reason| ConfigError::invalid(key, reason))?;
            }
            "modals.default_size" => {
                self.modals.default_size = value.parse().map_err(|reason| ConfigError::invalid(key, reason))?;
            }
            "logging.level" => self.logging.level = value.trim().to_string(),
            "logging.ansi" => {
                self.logging.ansi = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::invalid(key, format!("'{value}' is not a boolean")))?;
            }
            "extensions.manifest_paths" => {
                self.extensions.manifest_paths = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            _ => return Err(ConfigError::invalid(key, "unknown configuration key")),
        }
        Ok(())
    }

    /// Reject values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.notifications.peek_duration_ms == 0 {
            return Err(ConfigError::invalid(
                "notifications.peek_duration_ms",
                "must be greater than zero",
            ));
        }
        if self.logging.level.is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        if let Some(path) = self
            .extensions
            .manifest_paths
            .iter()
            .find(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::invalid(
                "extensions.manifest_paths",
                format!("empty path {path:?}"),
            ));
        }
        Ok(())
    }

    /// Auto-dismiss delay of `peek`.
    pub fn peek_duration(&self) -> Duration {
        Duration::from_millis(self.notifications.peek_duration_ms)
    }

    fn is_known_key(key: &str) -> bool {
        matches!(
            key,
            "notifications.peek_duration_ms"
                | "modals.default_type"
                | "modals.default_size"
                | "logging.level"
                | "logging.ansi"
                | "extensions.manifest_paths"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = BackofficeConfig::default();
        assert_eq!(config.peek_duration(), Duration::from_secs(6));
        assert_eq!(config.modals.default_type, ModalType::Dialog);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BackofficeConfig::from_toml_str(
            "[modals]\ndefault_type = \"sidebar\"\n[extensions]\nmanifest_paths = [\"a.json\"]\n",
        )
        .unwrap();
        assert_eq!(config.modals.default_type, ModalType::Sidebar);
        assert_eq!(config.notifications.peek_duration_ms, DEFAULT_PEEK_DURATION_MS);
        assert_eq!(config.extensions.manifest_paths, vec![PathBuf::from("a.json")]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[notifications]\npeek_duration_ms = 2500").unwrap();
        let config = BackofficeConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.peek_duration(), Duration::from_millis(2500));

        let err = BackofficeConfig::load_from_file(Path::new("/nonexistent/backoffice.toml"));
        assert!(matches!(err, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BackofficeConfig::default();
        config
            .merge_with_vars(vars(&[
                ("BACKOFFICE_NOTIFICATIONS_PEEK_DURATION_MS", "1000"),
                ("BACKOFFICE_LOGGING_LEVEL", "debug"),
                ("BACKOFFICE_EXTENSIONS_MANIFEST_PATHS", "a.json, b.json"),
                ("BACKOFFICE_UNRELATED", "x"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();
        assert_eq!(config.notifications.peek_duration_ms, 1000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.extensions.manifest_paths.len(), 2);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = BackofficeConfig::default();
        let err = config
            .merge_with_vars(vars(&[("BACKOFFICE_MODALS_DEFAULT_TYPE", "popup")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "modals.default_type"));
    }

    #[test]
    fn test_validation() {
        let mut config = BackofficeConfig::default();
        config.notifications.peek_duration_ms = 0;
        assert!(config.validate().is_err());
        assert!(config.set_from_string("nope.key", "1").is_err());
    }

    #[test]
    fn test_merge_with_overlays_non_defaults() {
        let mut base = BackofficeConfig::default();
        base.logging.level = "warn".into();
        let mut other = BackofficeConfig::default();
        other.modals.default_type = ModalType::Sidebar;
        other.extensions.manifest_paths.push("x.json".into());

        base.merge_with(&other);
        assert_eq!(base.logging.level, "warn");
        assert_eq!(base.modals.default_type, ModalType::Sidebar);
        assert_eq!(base.extensions.manifest_paths.len(), 1);
    }
}
