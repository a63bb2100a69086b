//! Project Runner: score one project and write its score file

use crate::languages::get_extractor;
use crate::parser_pool::{ParseRequest, ParserPool, create_parser_pool};
use crate::resolver::SymbolResolver;
use anyhow::{Context, Result};
use qscore_core::{
    ConfigError, EdgeExtractor, EdgeMultiset, Modularity, PackageRegistry, ScoreConfig,
    ScoreResult, SourceFilter, SourceUnit, SymbolTable, modularity,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How many analyzable files made it through parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub files: usize,
    pub parsed: usize,
    /// Unreadable files and files with syntax errors.
    pub misses: usize,
}

/// Everything known about a project before scoring.
pub struct ProjectIndex {
    pub registry: PackageRegistry,
    pub units: Vec<SourceUnit>,
    pub symbols: Arc<SymbolTable>,
    pub stats: ParseStats,
}

#[derive(Debug, Clone)]
pub struct ProjectScore {
    pub modularity: Modularity,
    pub stats: ParseStats,
    pub packages: usize,
}

pub struct ProjectRunner {
    config: ScoreConfig,
    filter: SourceFilter,
    pool: ParserPool,
}

impl ProjectRunner {
    pub fn new(config: ScoreConfig) -> Result<Self, ConfigError> {
        Self::with_pool(config, create_parser_pool())
    }

    pub fn with_pool(config: ScoreConfig, pool: ParserPool) -> Result<Self, ConfigError> {
        let filter = SourceFilter::from_config(&config)?;
        Ok(ProjectRunner {
            config,
            filter,
            pool,
        })
    }

    /// Discover packages, then parse and lower every analyzable file.
    pub fn index(&self, root: &Path) -> ScoreResult<ProjectIndex> {
        let (registry, files) = PackageRegistry::discover(root, &self.config, &self.filter)?;
        let mut stats = ParseStats {
            files: files.len(),
            ..ParseStats::default()
        };

        let mut requests = Vec::with_capacity(files.len());
        for path in files {
            match std::fs::read_to_string(&path) {
                Ok(content) => requests.push(ParseRequest { content, path }),
                Err(e) => {
                    tracing::debug!("Skipping unreadable {}: {}", path.display(), e);
                    stats.misses += 1;
                }
            }
        }

        let mut units = Vec::with_capacity(requests.len());
        for result in self.pool.parse_many(requests) {
            let parsed = match result {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::debug!("Parse failed: {}", e);
                    stats.misses += 1;
                    continue;
                }
            };
            if parsed.has_errors() {
                tracing::debug!("Skipping {} with syntax errors", parsed.path.display());
                stats.misses += 1;
                continue;
            }
            let Some(extractor) = get_extractor(&parsed.path) else {
                stats.misses += 1;
                continue;
            };
            units.push(extractor.extract(&parsed.path, &parsed.tree, parsed.content.as_bytes()));
            stats.parsed += 1;
        }

        let symbols = Arc::new(SymbolTable::new());
        for unit in &units {
            symbols.insert_unit(unit);
        }

        Ok(ProjectIndex {
            registry,
            units,
            symbols,
            stats,
        })
    }

    /// Edge multiset of an indexed project.
    pub fn edges(&self, index: &ProjectIndex) -> EdgeMultiset {
        let resolver = SymbolResolver::new(Arc::clone(&index.symbols));
        let extractor = EdgeExtractor::new(&index.registry, &resolver)
            .with_policy(self.config.source_package);
        index
            .units
            .iter()
            .flat_map(|unit| extractor.extract(unit))
            .collect()
    }

    pub fn score(&self, root: &Path) -> ScoreResult<ProjectScore> {
        let index = self.index(root)?;
        let edges = self.edges(&index);
        tracing::info!(
            "{}: {} file(s), {} parse miss(es), {} package(s), {} edge(s)",
            root.display(),
            index.stats.files,
            index.stats.misses,
            index.registry.len(),
            edges.len()
        );

        let modularity = modularity(&index.registry, &edges)?;
        tracing::debug!(
            "n = {}, internal = {}, e = {}, A = {}, Q = {}",
            modularity.edge_count,
            modularity.internal_count,
            modularity.e,
            modularity.a,
            modularity.q
        );

        Ok(ProjectScore {
            modularity,
            stats: index.stats,
            packages: index.registry.len(),
        })
    }

    /// Score `root` and write `<output_dir>/<project>.<ext>`.
    pub fn run(&self, root: &Path, output_dir: &Path) -> Result<PathBuf> {
        let name = project_name(root);
        let score = self
            .score(root)
            .with_context(|| format!("failed to score project {}", name))?;

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
        let path = output_dir.join(self.config.score_file_name(&name));
        std::fs::write(&path, score.modularity.q.to_string())
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::info!("Q = {} for {}", score.modularity.q, name);
        Ok(path)
    }

    /// Like [`run`](Self::run), but failures are logged and swallowed.
    pub fn run_logged(&self, root: &Path, output_dir: &Path) -> Option<PathBuf> {
        match self.run(root, output_dir) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(project = %project_name(root), "{:#}", e);
                None
            }
        }
    }
}

/// Last path component of the project root, or the whole path if it has none.
pub fn project_name(root: &Path) -> String {
    if let Some(name) = root.file_name() {
        return name.to_string_lossy().into_owned();
    }
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| root.display().to_string())
}
