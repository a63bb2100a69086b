//! Resolver seam between reference extraction and symbol resolution

use crate::model::{PackageName, Reference, SourceUnit};

/// Where a resolved declaration lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Declared in the analyzed sources.
    Source,
    /// Known only from outside the analyzed sources (an import of a library
    /// or runtime type).
    Library,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub package: PackageName,
    pub origin: Origin,
}

impl Declaration {
    pub fn source(package: impl Into<PackageName>) -> Self {
        Declaration {
            package: package.into(),
            origin: Origin::Source,
        }
    }

    pub fn library(package: impl Into<PackageName>) -> Self {
        Declaration {
            package: package.into(),
            origin: Origin::Library,
        }
    }
}

/// Outcome of resolving one reference. There is no error case: anything
/// that goes wrong inside a resolver is `Unresolved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Declaration),
    Unresolved,
}

impl From<Option<Declaration>> for Resolution {
    fn from(declaration: Option<Declaration>) -> Self {
        match declaration {
            Some(declaration) => Resolution::Resolved(declaration),
            None => Resolution::Unresolved,
        }
    }
}

/// Best-effort symbol resolution.
pub trait Resolver: Send + Sync {
    fn resolve(&self, unit: &SourceUnit, reference: &Reference) -> Resolution;
}
