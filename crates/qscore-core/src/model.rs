//! Core data structures for the package dependency graph

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Package name as written in a package statement, e.g. `com.example.util`.
pub type PackageName = String;

/// Which syntactic relationship produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// A supertype named in `extends` / `implements`.
    Inherits,
    /// A method invocation.
    Calls,
    /// A member read or write through `object.field`.
    FieldAccess,
}

/// One observed coupling occurrence between two packages.
///
/// Edges are treated as undirected: `(a, b)` and `(b, a)` count toward the
/// same pair. An edge whose ends are equal is internal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageEdge {
    pub source: PackageName,
    pub target: PackageName,
    pub kind: EdgeKind,
}

impl PackageEdge {
    pub fn new(
        source: impl Into<PackageName>,
        target: impl Into<PackageName>,
        kind: EdgeKind,
    ) -> Self {
        PackageEdge {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Self-loop: both ends name the same package.
    pub fn is_internal(&self) -> bool {
        self.source == self.target
    }
}

/// Shape of the receiver expression in a call or field access.
///
/// This is an owned projection of the syntax tree, kept only as deep as the
/// resolver can use.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    This,
    Super,
    /// A bare identifier: a local, a field, or a type name.
    Name(String),
    /// `object.field`
    Field(Box<Expr>, String),
    /// `object.method(..)`, or `method(..)` when there is no object.
    Call(Option<Box<Expr>>, String),
    /// `new T(..)`
    New(String),
    /// `(T) value`
    Cast(String),
    Unknown,
}

impl Expr {
    /// Dotted form of a chain of plain names (`a.b.C`), if it is one.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(name) => Some(name.clone()),
            Expr::Field(object, field) => object
                .dotted_name()
                .map(|prefix| format!("{}.{}", prefix, field)),
            _ => None,
        }
    }
}

/// What a reference points at, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceTarget {
    /// A supertype as written in the declaration.
    Supertype(String),
    /// A method invocation; `receiver` is `None` for an unqualified call.
    Call { receiver: Option<Expr>, name: String },
    /// `receiver.name`
    Field { receiver: Expr, name: String },
}

/// Index into [`SourceUnit::scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeId(pub usize);

/// A reference occurrence found in a source unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub target: ReferenceTarget,
    pub scope: ScopeId,
}

impl Reference {
    pub fn kind(&self) -> EdgeKind {
        match self.target {
            ReferenceTarget::Supertype(_) => EdgeKind::Inherits,
            ReferenceTarget::Call { .. } => EdgeKind::Calls,
            ReferenceTarget::Field { .. } => EdgeKind::FieldAccess,
        }
    }
}

/// Names visible at a reference site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Enclosing type declarations, innermost first, as qualified names.
    pub enclosing: Vec<String>,
    /// Locals and parameters of the enclosing method: name -> declared type.
    pub locals: HashMap<String, String>,
}

/// Package statement and imports of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileContext {
    pub package: Option<PackageName>,
    /// Single-type imports: simple name -> qualified name.
    pub single_imports: HashMap<String, String>,
    /// On-demand imports (`import a.b.*;`) stored as `a.b`.
    pub wildcard_imports: Vec<String>,
}

impl FileContext {
    /// Qualify a top-level simple name with this file's package.
    pub fn qualify(&self, name: &str) -> String {
        match self.package.as_deref() {
            Some(package) if !package.is_empty() => format!("{}.{}", package, name),
            _ => name.to_string(),
        }
    }
}

/// A type declaration (class, interface, enum, record, annotation type).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeDecl {
    pub qualified_name: String,
    /// Enclosing types, innermost first, not including this one.
    pub enclosing: Vec<String>,
    /// Supertypes as written.
    pub supertypes: Vec<String>,
    /// Field name -> declared type as written.
    pub fields: HashMap<String, String>,
    /// Method name -> return type as written (`None` for `void`).
    pub methods: HashMap<String, Option<String>>,
}

/// One analyzable file after a successful parse.
#[derive(Debug, Clone, Default)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub context: Arc<FileContext>,
    pub types: Vec<TypeDecl>,
    pub scopes: Vec<Scope>,
    pub references: Vec<Reference>,
}

impl SourceUnit {
    /// Package named by the file's own package statement.
    pub fn declared_package(&self) -> Option<&str> {
        self.context.package.as_deref()
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }
}
