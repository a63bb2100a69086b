//! Scoring configuration, optionally loaded from a TOML file

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Which package names the source end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePackagePolicy {
    /// The unit's own package statement, taken verbatim.
    #[default]
    Declared,
    /// The package derived from the unit's directory.
    Directory,
}

/// Limits applied to each isolated per-project process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// Address-space cap for the child, in MiB. `0` disables the cap.
    pub memory_limit_mb: u64,
    /// Per-project wall-clock limit, in seconds. `0` waits forever.
    pub timeout_secs: u64,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        IsolationConfig {
            memory_limit_mb: 16 * 1024,
            timeout_secs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Extensions (without the dot) of analyzable files.
    pub extensions: Vec<String>,
    /// Files whose name contains this substring are skipped.
    pub exclude_substring: String,
    /// Joins directory segments into a package name.
    pub package_separator: String,
    /// Extension of the per-project score file.
    pub score_extension: String,
    /// Directory prefixes (relative to the project root) stripped before
    /// deriving a package, e.g. `src/main/java`.
    pub source_roots: Vec<PathBuf>,
    pub source_package: SourcePackagePolicy,
    pub isolation: IsolationConfig,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        ScoreConfig {
            extensions: vec!["java".to_string()],
            exclude_substring: "Test".to_string(),
            package_separator: ".".to_string(),
            score_extension: "txt".to_string(),
            source_roots: Vec::new(),
            source_package: SourcePackagePolicy::Declared,
            isolation: IsolationConfig::default(),
        }
    }
}

impl ScoreConfig {
    /// Load a config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// File name of a project's score file.
    pub fn score_file_name(&self, project: &str) -> String {
        format!("{}.{}", project, self.score_extension)
    }
}
