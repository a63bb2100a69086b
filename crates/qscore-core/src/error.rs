//! Error taxonomy for scoring

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while scoring a single project.
///
/// Resolution misses and parse misses are not errors and never appear here.
#[derive(Error, Debug)]
pub enum ScoreError {
    #[error("no reference edges found, modularity is undefined")]
    NoEdges,

    #[error("normalizer 1 - A is zero across {packages} package(s), modularity is undefined")]
    DegenerateNormalizer { packages: usize },

    #[error("modularity evaluated to a non-finite value")]
    NonFinite,

    #[error("project root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot enumerate source tree under {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },
}

pub type ScoreResult<T> = Result<T, ScoreError>;

/// Errors loading a `ScoreConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid source extension pattern: {0}")]
    Glob(#[from] globset::Error),
}
