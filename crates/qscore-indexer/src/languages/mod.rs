//! Language extractors: lower a parsed syntax tree into a `SourceUnit`

pub mod java;

use qscore_core::SourceUnit;
use std::path::Path;
use tree_sitter::Tree;

/// Trait for language-specific lowering of a syntax tree
pub trait LanguageExtractor: Send + Sync {
    /// Extract declarations and references from a parsed file
    fn extract(&self, path: &Path, tree: &Tree, source: &[u8]) -> SourceUnit;
}

/// Get the extractor for a file based on its extension
pub fn get_extractor(path: &Path) -> Option<Box<dyn LanguageExtractor>> {
    match path.extension()?.to_str()? {
        "java" => Some(Box::new(java::JavaExtractor::new())),
        _ => None,
    }
}
