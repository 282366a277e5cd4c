//! Dependency graph and deployment ordering
//!
//! Link and constructor-argument edges are treated the same for ordering.
//! The sort is Kahn's algorithm where the ready set is drained lowest
//! declaration index first, which makes the order deterministic.

use crate::error::GraphError;
use crate::manifest::{DependencyEdge, Manifest, UnitSpec};
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

/// Validated dependency graph over a manifest's units
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    manifest: &'a Manifest,
    /// `upstream[i]` = declaration indices unit `i` depends on
    upstream: Vec<BTreeSet<usize>>,
    /// `downstream[i]` = declaration indices depending on unit `i`
    downstream: Vec<BTreeSet<usize>>,
}

impl<'a> DependencyGraph<'a> {
    /// Build the graph, rejecting duplicate names and undefined dependencies
    pub fn new(manifest: &'a Manifest) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(manifest.units.len());
        for (i, unit) in manifest.units.iter().enumerate() {
            if index.insert(unit.name.as_str(), i).is_some() {
                return Err(GraphError::DuplicateUnit(unit.name.clone()));
            }
        }

        let n = manifest.units.len();
        let mut upstream = vec![BTreeSet::new(); n];
        let mut downstream = vec![BTreeSet::new(); n];

        for DependencyEdge { from, to, .. } in manifest.edges() {
            let to_idx = index[to.as_str()];
            let from_idx = *index
                .get(from.as_str())
                .ok_or_else(|| GraphError::UnknownDependency {
                    unit: to.clone(),
                    dependency: from.clone(),
                })?;
            upstream[to_idx].insert(from_idx);
            downstream[from_idx].insert(to_idx);
        }

        Ok(Self {
            manifest,
            upstream,
            downstream,
        })
    }

    /// Units in an order where every dependency precedes its dependents
    ///
    /// Fails with [`GraphError::Cycle`] naming every unit that could not be
    /// scheduled.
    pub fn topological_order(&self) -> Result<Vec<&'a UnitSpec>, GraphError> {
        let n = self.manifest.units.len();
        let mut pending: Vec<usize> = self.upstream.iter().map(BTreeSet::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| pending[i] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(&self.manifest.units[i]);
            for &next in &self.downstream[i] {
                pending[next] -= 1;
                if pending[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() < n {
            let stuck = (0..n)
                .filter(|&i| pending[i] > 0)
                .map(|i| self.manifest.units[i].name.clone())
                .collect();
            return Err(GraphError::Cycle(stuck));
        }

        Ok(order)
    }

    /// Names of the units `name` depends on directly, in declaration order
    pub fn dependencies_of(&self, name: &str) -> Vec<&'a str> {
        let Some(i) = self.manifest.units.iter().position(|u| u.name == name) else {
            return Vec::new();
        };
        self.upstream[i]
            .iter()
            .map(|&j| self.manifest.units[j].name.as_str())
            .collect()
    }
}
