//! Canonical package set derived from a project's directory layout

use crate::config::ScoreConfig;
use crate::error::{ConfigError, ScoreError, ScoreResult};
use crate::model::PackageName;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Selects analyzable files: extension match, and the file name must not
/// contain the exclusion substring.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    globs: GlobSet,
    exclude_substring: String,
}

impl SourceFilter {
    pub fn new(extensions: &[String], exclude_substring: &str) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for ext in extensions {
            builder.add(Glob::new(&format!("*.{}", ext.trim_start_matches('.')))?);
        }
        Ok(SourceFilter {
            globs: builder.build()?,
            exclude_substring: exclude_substring.to_string(),
        })
    }

    pub fn from_config(config: &ScoreConfig) -> Result<Self, ConfigError> {
        Self::new(&config.extensions, &config.exclude_substring)
    }

    pub fn is_analyzable(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.exclude_substring.is_empty() && name.contains(&self.exclude_substring) {
            return false;
        }
        self.globs.is_match(name)
    }
}

/// The canonical package set of one project. Fixed once built.
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    root: PathBuf,
    separator: String,
    source_roots: Vec<PathBuf>,
    packages: HashSet<PackageName>,
}

impl PackageRegistry {
    /// Enumerate every analyzable file under `root` and derive the package
    /// set from their parent directories. Returns the registry and the
    /// analyzable files, sorted.
    pub fn discover(
        root: &Path,
        config: &ScoreConfig,
        filter: &SourceFilter,
    ) -> ScoreResult<(Self, Vec<PathBuf>)> {
        if !root.is_dir() {
            return Err(ScoreError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        let walker = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .build();
        for entry in walker {
            let entry = entry.map_err(|source| ScoreError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            if is_file && filter.is_analyzable(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        let mut registry = PackageRegistry {
            root: root.to_path_buf(),
            separator: config.package_separator.clone(),
            source_roots: config.source_roots.clone(),
            packages: HashSet::new(),
        };
        for file in &files {
            if let Some(package) = registry.package_of(file) {
                registry.packages.insert(package);
            }
        }

        tracing::debug!(
            "Discovered {} analyzable files in {} packages under {}",
            files.len(),
            registry.packages.len(),
            root.display()
        );
        Ok((registry, files))
    }

    /// Registry over an explicit package set.
    pub fn from_packages<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PackageName>,
    {
        PackageRegistry {
            root: PathBuf::new(),
            separator: ".".to_string(),
            source_roots: Vec::new(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }

    /// Directory-derived package of a file under the project root.
    pub fn package_of(&self, file: &Path) -> Option<PackageName> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let mut parent = relative.parent()?;
        for source_root in &self.source_roots {
            if let Ok(stripped) = parent.strip_prefix(source_root) {
                parent = stripped;
                break;
            }
        }
        let segments: Vec<String> = parent
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(segments.join(&self.separator))
    }

    pub fn contains(&self, package: &str) -> bool {
        self.packages.contains(package)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(String::as_str)
    }
}
