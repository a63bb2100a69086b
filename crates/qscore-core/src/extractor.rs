//! Reference edge extraction for a single source unit

use crate::config::SourcePackagePolicy;
use crate::model::{EdgeKind, PackageEdge, PackageName, SourceUnit};
use crate::packages::PackageRegistry;
use crate::resolve::{Origin, Resolution, Resolver};

/// Turns a unit's references into package edges.
///
/// A reference becomes an edge only if it resolves, its declaration lies in
/// the canonical package set, and (for calls and field accesses) the
/// declaration comes from the analyzed sources.
pub struct EdgeExtractor<'a, R: Resolver + ?Sized> {
    registry: &'a PackageRegistry,
    resolver: &'a R,
    policy: SourcePackagePolicy,
}

impl<'a, R: Resolver + ?Sized> EdgeExtractor<'a, R> {
    pub fn new(registry: &'a PackageRegistry, resolver: &'a R) -> Self {
        EdgeExtractor {
            registry,
            resolver,
            policy: SourcePackagePolicy::Declared,
        }
    }

    pub fn with_policy(mut self, policy: SourcePackagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Package naming the source end of every edge from `unit`.
    pub fn source_package(&self, unit: &SourceUnit) -> Option<PackageName> {
        match self.policy {
            SourcePackagePolicy::Declared => unit.declared_package().map(str::to_string),
            SourcePackagePolicy::Directory => self.registry.package_of(&unit.path),
        }
    }

    pub fn extract(&self, unit: &SourceUnit) -> Vec<PackageEdge> {
        let Some(source) = self.source_package(unit) else {
            return Vec::new();
        };

        let mut edges = Vec::new();
        for reference in &unit.references {
            let kind = reference.kind();
            let Resolution::Resolved(declaration) = self.resolver.resolve(unit, reference) else {
                continue;
            };
            if kind != EdgeKind::Inherits && declaration.origin != Origin::Source {
                continue;
            }
            if !self.registry.contains(&declaration.package) {
                continue;
            }
            edges.push(PackageEdge::new(source.clone(), declaration.package, kind));
        }
        edges
    }
}
