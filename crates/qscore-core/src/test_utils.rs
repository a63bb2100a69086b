//! Test utilities for qscore-core

use crate::model::*;
use crate::resolve::{Declaration, Resolution, Resolver};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub fn edge(a: &str, b: &str) -> PackageEdge {
    PackageEdge::new(a, b, EdgeKind::Calls)
}

/// Two packages: 3 internal edges in `a`, 2 internal edges in `b`, one
/// cross edge `(a, b)`. Modularity is exactly 5/11.
pub fn two_package_fixture() -> Vec<PackageEdge> {
    vec![
        edge("a", "a"),
        edge("a", "a"),
        edge("a", "a"),
        edge("b", "b"),
        edge("b", "b"),
        edge("a", "b"),
    ]
}

/// Write `files` (relative path, contents) under a fresh temp dir.
pub fn create_project(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for (relative, contents) in files {
        write_file(temp_dir.path(), relative, contents);
    }
    temp_dir
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Unit with the given package statement and references, all in scope 0.
pub fn unit(path: &str, package: Option<&str>, targets: Vec<ReferenceTarget>) -> SourceUnit {
    SourceUnit {
        path: PathBuf::from(path),
        context: Arc::new(FileContext {
            package: package.map(str::to_string),
            ..FileContext::default()
        }),
        types: Vec::new(),
        scopes: vec![Scope::default()],
        references: targets
            .into_iter()
            .map(|target| Reference {
                target,
                scope: ScopeId(0),
            })
            .collect(),
    }
}

pub fn call(name: &str) -> ReferenceTarget {
    ReferenceTarget::Call {
        receiver: None,
        name: name.to_string(),
    }
}

pub fn field(name: &str) -> ReferenceTarget {
    ReferenceTarget::Field {
        receiver: Expr::This,
        name: name.to_string(),
    }
}

pub fn supertype(name: &str) -> ReferenceTarget {
    ReferenceTarget::Supertype(name.to_string())
}

/// Resolves references by member or type name from a fixed table.
#[derive(Default)]
pub struct StubResolver {
    answers: HashMap<String, Declaration>,
}

impl StubResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, declaration: Declaration) -> Self {
        self.answers.insert(name.to_string(), declaration);
        self
    }
}

impl Resolver for StubResolver {
    fn resolve(&self, _unit: &SourceUnit, reference: &Reference) -> Resolution {
        let name = match &reference.target {
            ReferenceTarget::Supertype(name) => name,
            ReferenceTarget::Call { name, .. } => name,
            ReferenceTarget::Field { name, .. } => name,
        };
        self.answers.get(name).cloned().into()
    }
}
