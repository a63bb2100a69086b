//! qscore Core: package registry, reference edges, and the modularity score

pub mod config;
pub mod edges;
pub mod error;
pub mod extractor;
pub mod model;
pub mod modularity;
pub mod packages;
pub mod resolve;
pub mod symbols;


#[cfg(test)]
pub mod test_utils;

pub use config::{IsolationConfig, ScoreConfig, SourcePackagePolicy};
pub use edges::EdgeMultiset;
pub use error::{ConfigError, ScoreError, ScoreResult};
pub use extractor::EdgeExtractor;
pub use model::{
    EdgeKind, Expr, FileContext, PackageEdge, PackageName, Reference, ReferenceTarget, Scope,
    ScopeId, SourceUnit, TypeDecl,
};
pub use modularity::{Modularity, modularity};
pub use packages::{PackageRegistry, SourceFilter};
pub use resolve::{Declaration, Origin, Resolution, Resolver};
pub use symbols::{SymbolTable, TypeSymbol};
