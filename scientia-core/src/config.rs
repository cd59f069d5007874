//! Configuration parsing and management.

use crate::namespace::Remapping;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid module name '{0}'")]
    InvalidModule(String),
}

/// Site configuration matching the `scientia.yml` schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub title: String,

    #[serde(default)]
    pub footer: String,

    /// Module directories, in display order
    pub modules: Vec<String>,

    #[serde(default)]
    pub paths: PathsConfig,

    /// origin namespace -> (local alias -> canonical namespace)
    #[serde(default)]
    pub remapping: Remapping,

    /// Whether `include[...]` directives also count as backlinks
    #[serde(default)]
    pub include_backlinks: bool,

    #[serde(default)]
    pub google_analytics: Option<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_source")]
    pub source: PathBuf,

    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from(".")
}

fn default_output() -> PathBuf {
    PathBuf::from("site")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            output: default_output(),
        }
    }
}

/// Per-module `config.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    pub description: String,

    /// Docid of the page shown when entering the module
    #[serde(default)]
    pub landing_page: Option<String>,

    /// Unrecognized keys, kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Optional `config.yaml` inside a module subdirectory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub sort: Option<f64>,
}

/// Name of the configuration file inside module directories
pub const CONFIG_FILE_NAME: &str = "config.yaml";

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config: Config = read_yaml(path)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from a string; relative paths stay relative
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Source root containing the module directories
    pub fn source_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.source)
    }

    /// Output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Directories of the configured modules, in configured order
    pub fn module_dirs(&self) -> Vec<PathBuf> {
        let source = self.source_dir();
        self.modules.iter().map(|m| source.join(m)).collect()
    }

    /// Override the source root (used by tests and the CLI)
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.source = dir.into();
        self
    }

    /// Override the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.output = dir.into();
        self
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_ref().and_then(|p| p.parent()) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl ModuleConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        read_yaml(path.as_ref())
    }
}

impl DirectoryConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        read_yaml(path.as_ref())
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_values() {
        let config = Config::from_yaml_str("title: Docs\nmodules: [guide]\n").unwrap();

        assert_eq!(config.paths.source, PathBuf::from("."));
        assert_eq!(config.paths.output, PathBuf::from("site"));
        assert!(!config.include_backlinks);
        assert!(config.remapping.is_empty());
        assert_eq!(config.footer, "");
    }

    #[test]
    fn test_paths_relative_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scientia.yml");
        fs::write(
            &path,
            "title: Docs\nmodules: [guide, api]\npaths:\n  source: src\n  output: out\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.source_dir(), dir.path().join("src"));
        assert_eq!(config.output_dir(), dir.path().join("out"));
        assert_eq!(
            config.module_dirs(),
            vec![dir.path().join("src/guide"), dir.path().join("src/api")]
        );
    }

    #[test]
    fn test_module_config_requires_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "name: Guide\n").unwrap();

        let err = ModuleConfig::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn test_module_config_keeps_extra_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "name: Guide\ndescription: How to\nlanding_page: intro\nicon: book\n",
        )
        .unwrap();

        let module = ModuleConfig::from_file(&path).unwrap();
        assert_eq!(module.landing_page.as_deref(), Some("intro"));
        assert!(module.extra.contains_key("icon"));
    }

    #[test]
    fn test_directory_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "title: Installation\nsort: -1.5\n").unwrap();

        let cfg = DirectoryConfig::from_file(&path).unwrap();
        assert_eq!(cfg.title.as_deref(), Some("Installation"));
        assert_eq!(cfg.sort, Some(-1.5));

        fs::write(&path, "titel: typo\n").unwrap();
        assert!(DirectoryConfig::from_file(&path).is_err());
    }
}
