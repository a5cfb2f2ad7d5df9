//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/flowexport/flowexport.toml`
//! 3. Explicit config file (`--config`)
//! 4. Environment variables: `FLOWEXPORT_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{TypeCodes, MAX_ANCESTOR_DEPTH};

/// Unified configuration for flowexport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Instrument prefix all type codes derive from (e.g. LSR_FORTESSA)
    pub experiment_prefix: String,
    /// Offer "Export to your folder" next to the archive download
    pub enable_export_to_user_folder: bool,
    /// Bound on parent hops when searching for the owning experiment
    pub max_ancestor_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            experiment_prefix: "LSR_FORTESSA".into(),
            enable_export_to_user_folder: false,
            max_ancestor_depth: MAX_ANCESTOR_DEPTH,
        }
    }
}

/// Raw settings for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub experiment_prefix: Option<String>,
    pub enable_export_to_user_folder: Option<bool>,
    pub max_ancestor_depth: Option<usize>,
}

/// Get the XDG config directory for flowexport.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flowexport").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("flowexport.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    pub fn type_codes(&self) -> TypeCodes {
        TypeCodes::new(self.experiment_prefix.clone())
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            experiment_prefix: overlay
                .experiment_prefix
                .clone()
                .unwrap_or_else(|| self.experiment_prefix.clone()),
            enable_export_to_user_folder: overlay
                .enable_export_to_user_folder
                .unwrap_or(self.enable_export_to_user_folder),
            max_ancestor_depth: overlay.max_ancestor_depth.unwrap_or(self.max_ancestor_depth),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; must exist when given
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(path) = config_file {
            current = current.merge_with(&load_raw_settings(path)?);
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply FLOWEXPORT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("FLOWEXPORT").prefix_separator("_"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("experiment_prefix") {
            settings.experiment_prefix = val;
        }
        if let Ok(val) = config.get_bool("enable_export_to_user_folder") {
            settings.enable_export_to_user_folder = val;
        }
        if let Ok(val) = config.get_int("max_ancestor_depth") {
            settings.max_ancestor_depth = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_ancestor_depth must not be negative: {val}"),
            })?;
        }
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.experiment_prefix.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "experiment_prefix must not be empty".into(),
            });
        }
        if self.max_ancestor_depth == 0 {
            return Err(ApplicationError::Config {
                message: "max_ancestor_depth must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# flowexport configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/flowexport/flowexport.toml
#   File:   --config <path>
#   Env:    FLOWEXPORT_* environment variables (explicit overrides)

# Instrument prefix; type codes are <prefix>_PLATE, <prefix>_TUBESET, <prefix>_ALL_PLATES
# experiment_prefix = "LSR_FORTESSA"

# Offer "Export to your folder" in addition to the archive download
# enable_export_to_user_folder = false

# Maximum parent hops when looking up the experiment of a node
# max_ancestor_depth = 256
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_when_deriving_codes_then_uses_prefix() {
        let settings = Settings::default();
        assert_eq!(settings.type_codes().tubeset(), "LSR_FORTESSA_TUBESET");
        assert!(!settings.enable_export_to_user_folder);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_values() {
        let base = Settings::default();
        let overlay = RawSettings {
            experiment_prefix: Some("FACS_ARIA".into()),
            enable_export_to_user_folder: None,
            max_ancestor_depth: Some(16),
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.experiment_prefix, "FACS_ARIA");
        assert!(!merged.enable_export_to_user_folder);
        assert_eq!(merged.max_ancestor_depth, 16);
    }

    #[test]
    fn given_empty_prefix_when_validating_then_rejects() {
        let settings = Settings {
            experiment_prefix: " ".into(),
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_template_when_parsing_then_yields_no_overrides() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.experiment_prefix.is_none());
        assert!(raw.enable_export_to_user_folder.is_none());
    }
}
