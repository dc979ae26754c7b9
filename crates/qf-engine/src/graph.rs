use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// Undirected adjacency over register axes.
///
/// Connected components are the sets of axes that collapse together when
/// any member is measured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntanglementGraph {
    adjacency: BTreeMap<usize, BTreeSet<usize>>,
}

impl EntanglementGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the undirected edge `a - b`. Self loops are ignored.
    pub fn link(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    /// Removes the edge `a - b`, returning whether it existed.
    pub fn unlink(&mut self, a: usize, b: usize) -> bool {
        let removed = self.adjacency.get_mut(&a).map_or(false, |set| set.remove(&b));
        if let Some(set) = self.adjacency.get_mut(&b) {
            set.remove(&a);
        }
        self.adjacency.retain(|_, set| !set.is_empty());
        removed
    }

    /// Whether `a` and `b` share an edge.
    pub fn are_linked(&self, a: usize, b: usize) -> bool {
        self.adjacency.get(&a).map_or(false, |set| set.contains(&b))
    }

    /// Whether the axis has at least one partner.
    pub fn is_entangled(&self, axis: usize) -> bool {
        self.adjacency.contains_key(&axis)
    }

    /// Direct partners of an axis.
    pub fn neighbors(&self, axis: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency.get(&axis).into_iter().flatten().copied()
    }

    /// Connected component containing `axis`; `{axis}` when it is isolated.
    pub fn component(&self, axis: usize) -> BTreeSet<usize> {
        let mut seen = BTreeSet::from([axis]);
        let mut queue = VecDeque::from([axis]);
        while let Some(current) = queue.pop_front() {
            for next in self.neighbors(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Drops every edge touching the given axes.
    pub fn remove_axes(&mut self, axes: &BTreeSet<usize>) {
        for axis in axes {
            self.adjacency.remove(axis);
        }
        for set in self.adjacency.values_mut() {
            set.retain(|partner| !axes.contains(partner));
        }
        self.adjacency.retain(|_, set| !set.is_empty());
    }

    /// Every axis with a partner.
    pub fn entangled_axes(&self) -> BTreeSet<usize> {
        self.adjacency.keys().copied().collect()
    }

    /// Edges as `(low, high)` pairs in ascending order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .flat_map(|(&a, set)| set.iter().filter(move |&&b| a < b).map(move |&b| (a, b)))
            .collect()
    }

    /// Removes every edge.
    pub fn clear(&mut self) {
        self.adjacency.clear();
    }
}
