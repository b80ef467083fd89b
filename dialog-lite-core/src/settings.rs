//! Build settings
//!
//! Resolution order, later wins:
//! 1. Built-in defaults
//! 2. `dialog-lite.yaml` (or the file named by `DIALOG_LITE_CONFIG`)
//! 3. `DIALOG_LITE_*` environment variables
//! 4. Command-line flags (applied by the caller)

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::xml::XmlOptions;

pub const DEFAULT_SETTINGS_FILE: &str = "dialog-lite.yaml";

pub const ENV_CONFIG: &str = "DIALOG_LITE_CONFIG";
pub const ENV_SOURCE: &str = "DIALOG_LITE_SOURCE";
pub const ENV_TARGET: &str = "DIALOG_LITE_TARGET";
pub const ENV_PACKAGE_BASE: &str = "DIALOG_LITE_PACKAGE_BASE";
pub const ENV_TERMINATE_ON: &str = "DIALOG_LITE_TERMINATE_ON";

fn default_source() -> PathBuf {
    PathBuf::from("descriptors")
}

fn default_target() -> PathBuf {
    PathBuf::from("target/dialog-lite")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Directory (or single file) holding type descriptors
    #[serde(default = "default_source")]
    pub source_root: PathBuf,
    /// Directory receiving component folders
    #[serde(default = "default_target")]
    pub target_root: PathBuf,
    /// Only types under this package are processed; empty means all
    #[serde(default)]
    pub package_base: String,
    /// Exception policy, see [`crate::exceptions::from_setting`]
    #[serde(default)]
    pub terminate_on: String,
    #[serde(default)]
    pub xml: XmlOptions,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            source_root: default_source(),
            target_root: default_target(),
            package_base: String::new(),
            terminate_on: String::new(),
            xml: XmlOptions::default(),
        }
    }
}

impl PluginSettings {
    /// Apply `DIALOG_LITE_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(source) = lookup(ENV_SOURCE) {
            self.source_root = PathBuf::from(source);
        }
        if let Some(target) = lookup(ENV_TARGET) {
            self.target_root = PathBuf::from(target);
        }
        if let Some(base) = lookup(ENV_PACKAGE_BASE) {
            self.package_base = base;
        }
        if let Some(terminate_on) = lookup(ENV_TERMINATE_ON) {
            self.terminate_on = terminate_on;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_root.as_os_str().is_empty() {
            return Err(anyhow!("source_root must not be empty"));
        }
        if self.target_root.as_os_str().is_empty() {
            return Err(anyhow!("target_root must not be empty"));
        }
        if self.source_root == self.target_root {
            return Err(anyhow!(
                "source_root and target_root must differ (both {})",
                self.source_root.display()
            ));
        }
        Ok(())
    }
}

pub struct SettingsLoader {
    file: Option<PathBuf>,
}

impl SettingsLoader {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    /// Locate the settings file.
    ///
    /// Path resolution order:
    /// 1. `DIALOG_LITE_CONFIG` environment variable (explicit override)
    /// 2. `dialog-lite.yaml` in the working directory, if present
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            return Self::new(Some(PathBuf::from(path)));
        }
        if Path::new(DEFAULT_SETTINGS_FILE).exists() {
            return Self::new(Some(PathBuf::from(DEFAULT_SETTINGS_FILE)));
        }
        Self::new(None)
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Defaults, then the settings file, then process environment.
    pub fn load(&self) -> Result<PluginSettings> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    pub fn load_with_env(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<PluginSettings> {
        let mut settings = match &self.file {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_yaml::from_str::<PluginSettings>(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => PluginSettings::default(),
        };
        settings.apply_env(lookup);
        settings.validate()?;
        Ok(settings)
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
    fn test_defaults_without_file() {
        let settings = SettingsLoader::new(None).load_with_env(env(&[])).unwrap();
        assert_eq!(settings, PluginSettings::default());
        assert_eq!(settings.xml.indent, 4);
    }

    #[test]
    fn test_file_then_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(
            &path,
            "source_root: model\npackage_base: com.acme\nterminate_on: Validation\nxml:\n  indent: 2\n",
        )
        .unwrap();

        let settings = SettingsLoader::new(Some(path))
            .load_with_env(env(&[(ENV_TERMINATE_ON, "all"), (ENV_TARGET, "out")]))
            .unwrap();
        assert_eq!(settings.source_root, PathBuf::from("model"));
        assert_eq!(settings.target_root, PathBuf::from("out"));
        assert_eq!(settings.package_base, "com.acme");
        assert_eq!(settings.terminate_on, "all");
        assert_eq!(settings.xml.indent, 2);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = SettingsLoader::new(Some(PathBuf::from("/nonexistent/dialog-lite.yaml")))
            .load_with_env(env(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_same_source_and_target_rejected() {
        let err = SettingsLoader::new(None)
            .load_with_env(env(&[(ENV_SOURCE, "x"), (ENV_TARGET, "x")]))
            .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }
}
