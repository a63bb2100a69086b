//! Symbol table for cross-file resolution

use crate::model::{FileContext, SourceUnit, TypeDecl};
use dashmap::DashMap;
use std::sync::Arc;

/// A type declaration together with the file context it was declared in.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSymbol {
    pub decl: TypeDecl,
    pub context: Arc<FileContext>,
}

impl TypeSymbol {
    /// Declaring package; the default package is the empty string.
    pub fn package(&self) -> &str {
        self.context.package.as_deref().unwrap_or("")
    }

    pub fn qualified_name(&self) -> &str {
        &self.decl.qualified_name
    }
}

/// Symbol table mapping qualified type names to declarations. Thread-safe for concurrent access.
pub struct SymbolTable {
    types: DashMap<String, Arc<TypeSymbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            types: DashMap::new(),
        }
    }

    /// Register every type declared in a unit.
    pub fn insert_unit(&self, unit: &SourceUnit) {
        for decl in &unit.types {
            self.insert(decl.clone(), Arc::clone(&unit.context));
        }
    }

    /// Insert a type. A later declaration with the same name replaces the
    /// earlier one.
    pub fn insert(&self, decl: TypeDecl, context: Arc<FileContext>) {
        let name = decl.qualified_name.clone();
        self.types.insert(name, Arc::new(TypeSymbol { decl, context }));
    }

    /// Look up a type by qualified name.
    pub fn lookup(&self, qualified_name: &str) -> Option<Arc<TypeSymbol>> {
        self.types.get(qualified_name).map(|r| Arc::clone(r.value()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
