//! Configuration management for config-forge
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (forge.toml)
//! - Environment variables (FORGE__*)
//!
//! ## Example config file (forge.toml):
//! ```toml
//! [repository]
//! path = "./data_models"
//! extensions = ["yaml", "yml"]
//!
//! [validation]
//! defaults = "exclude_unset"
//!
//! [output]
//! format = "yaml"
//!
//! [cache]
//! enabled = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::forge::ForgeOptions;
use crate::render::OutputFormat;
use crate::repository::{SchemaRepository, DEFAULT_EXTENSIONS};
use crate::validator::DefaultPolicy;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Where schema documents live
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Validation settings
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Compiled schema cache
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Schema repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Directory holding schema documents
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,

    /// File extensions, in lookup order
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

/// Validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether declared defaults of missing fields are written out
    #[serde(default)]
    pub defaults: DefaultPolicy,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Keep compiled schemas between calls
    #[serde(default = "default_true")]
    pub enabled: bool,
}

// Default value functions
fn default_repository_path() -> PathBuf {
    PathBuf::from("data_models")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repository_path(),
            extensions: default_extensions(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ForgeConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["forge.toml", ".forge.toml", "config/forge.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "config-forge") {
            let xdg_config = config_dir.config_dir().join("forge.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (FORGE__*)
        builder = builder.add_source(
            Environment::with_prefix("FORGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get the repository path (resolves relative paths)
    pub fn repository_path(&self) -> PathBuf {
        if self.repository.path.is_absolute() {
            self.repository.path.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.repository.path)
        }
    }

    /// Build the schema repository this config points at
    pub fn schema_repository(&self) -> SchemaRepository {
        SchemaRepository::new(self.repository_path()).with_extensions(self.repository.extensions.iter().cloned())
    }

    /// Pipeline options derived from this config
    pub fn forge_options(&self) -> ForgeOptions {
        ForgeOptions {
            default_policy: self.validation.defaults,
            output_format: self.output.format,
            cache_compiled: self.cache.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ForgeConfig::default();
        assert_eq!(config.repository.path, PathBuf::from("data_models"));
        assert_eq!(config.repository.extensions, vec!["yaml", "yml", "json"]);
        assert_eq!(config.validation.defaults, DefaultPolicy::ExcludeUnset);
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_serialize_config() {
        let config = ForgeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[repository]"));
        assert!(toml_str.contains("[validation]"));
        assert!(toml_str.contains("defaults = \"exclude_unset\""));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[repository]\npath = \"/srv/schemas\"\n\n[validation]\ndefaults = \"materialize\"\n\n[output]\nformat = \"json\"\n\n[cache]\nenabled = false\n",
        )
        .unwrap();

        let config = ForgeConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.repository_path(), PathBuf::from("/srv/schemas"));

        let options = config.forge_options();
        assert_eq!(options.default_policy, DefaultPolicy::Materialize);
        assert_eq!(options.output_format, OutputFormat::Json);
        assert!(!options.cache_compiled);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forge.toml");
        let path = path.to_str().unwrap();

        let mut config = ForgeConfig::default();
        config.output.format = OutputFormat::Toml;
        config.save(path).unwrap();

        let loaded = ForgeConfig::load_from(Some(path)).unwrap();
        assert_eq!(loaded.output.format, OutputFormat::Toml);
    }
}
