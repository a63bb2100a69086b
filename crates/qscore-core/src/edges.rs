//! Order-independent multiset of reference edges

use crate::model::{PackageEdge, PackageName};
use crate::packages::PackageRegistry;
use std::collections::HashMap;

/// Undirected edge multiset keyed by package pair.
///
/// Pairs are stored with their ends sorted so `(a, b)` and `(b, a)` share a
/// count. Insertion order never affects any derived quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeMultiset {
    counts: HashMap<(PackageName, PackageName), usize>,
    total: usize,
    internal: usize,
}

impl EdgeMultiset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, edge: PackageEdge) {
        if edge.is_internal() {
            self.internal += 1;
        }
        let PackageEdge { source, target, .. } = edge;
        let key = if source <= target {
            (source, target)
        } else {
            (target, source)
        };
        *self.counts.entry(key).or_insert(0) += 1;
        self.total += 1;
    }

    /// Total number of edges, internal ones included.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of self-loops.
    pub fn internal_count(&self) -> usize {
        self.internal
    }

    /// How many edges join `a` and `b`, in either direction.
    pub fn multiplicity(&self, a: &str, b: &str) -> usize {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.counts
            .get(&(lo.to_string(), hi.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Incidence count per canonical package.
    ///
    /// A self-loop counts once toward its package. An edge between two
    /// packages counts toward both, but only when both are in `packages`;
    /// an edge with a non-canonical end adds to no incidence.
    pub fn incidences(&self, packages: &PackageRegistry) -> HashMap<&str, usize> {
        let mut incidence: HashMap<&str, usize> = HashMap::new();
        for ((a, b), count) in &self.counts {
            if !packages.contains(a) || !packages.contains(b) {
                continue;
            }
            *incidence.entry(a.as_str()).or_insert(0) += count;
            if a != b {
                *incidence.entry(b.as_str()).or_insert(0) += count;
            }
        }
        incidence
    }

    /// Distinct pairs with their counts.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, usize)> {
        self.counts
            .iter()
            .map(|((a, b), count)| (a.as_str(), b.as_str(), *count))
    }
}

impl Extend<PackageEdge> for EdgeMultiset {
    fn extend<T: IntoIterator<Item = PackageEdge>>(&mut self, iter: T) {
        for edge in iter {
            self.insert(edge);
        }
    }
}

impl FromIterator<PackageEdge> for EdgeMultiset {
    fn from_iter<T: IntoIterator<Item = PackageEdge>>(iter: T) -> Self {
        let mut edges = EdgeMultiset::new();
        edges.extend(iter);
        edges
    }
}
