//! Modularity score over a package edge multiset
//!
//! With `n` edges, `a_i` the incidence count of package `i` (self-loops
//! counted once, cross edges only when both ends are canonical), `e` the
//! fraction of internal edges and
//! `A = Σ (a_i / n)²` over the canonical package set:
//!
//! ```text
//! Q = (e - A) / (1 - A)
//! ```
//!
//! Multiplying through by `n²` gives `Q = (internal·n - Σ a_i²) / (n² - Σ a_i²)`,
//! which is what is evaluated here so the degenerate checks are exact.

use crate::edges::EdgeMultiset;
use crate::error::{ScoreError, ScoreResult};
use crate::packages::PackageRegistry;

/// Score together with the quantities it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modularity {
    /// Total edges `n`.
    pub edge_count: usize,
    pub internal_count: usize,
    /// `Σ a_i` over the canonical set.
    pub incidence_sum: usize,
    /// Fraction of internal edges.
    pub e: f64,
    /// Sum of squared incidence fractions.
    pub a: f64,
    pub q: f64,
}

/// Compute the modularity score of `edges` over the canonical `packages`.
///
/// Fails with [`ScoreError::NoEdges`] when `n == 0` and with
/// [`ScoreError::DegenerateNormalizer`] when `1 - A == 0`.
pub fn modularity(packages: &PackageRegistry, edges: &EdgeMultiset) -> ScoreResult<Modularity> {
    let n = edges.len();
    if n == 0 {
        return Err(ScoreError::NoEdges);
    }

    let incidences = edges.incidences(packages);
    let mut incidence_sum = 0usize;
    let mut squared_sum: i128 = 0;
    for package in packages.iter() {
        let a_i = incidences.get(package).copied().unwrap_or(0);
        incidence_sum += a_i;
        squared_sum += (a_i as i128) * (a_i as i128);
    }

    let n_wide = n as i128;
    let internal = edges.internal_count();
    let numerator = internal as i128 * n_wide - squared_sum;
    let denominator = n_wide * n_wide - squared_sum;
    if denominator == 0 {
        return Err(ScoreError::DegenerateNormalizer {
            packages: packages.len(),
        });
    }

    let q = numerator as f64 / denominator as f64;
    if !q.is_finite() {
        return Err(ScoreError::NonFinite);
    }

    Ok(Modularity {
        edge_count: n,
        internal_count: internal,
        incidence_sum,
        e: internal as f64 / n as f64,
        a: squared_sum as f64 / (n_wide * n_wide) as f64,
        q,
    })
}
