//! Symbol-level graph view over a manifest, used for closure traversal

use crate::manifest::Manifest;
use crate::model::{FileId, SymbolId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A symbol addressed by its file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey {
    pub file: FileId,
    pub symbol: SymbolId,
}

impl SymbolKey {
    pub fn new(file: impl Into<FileId>, symbol: impl Into<SymbolId>) -> Self {
        SymbolKey {
            file: file.into(),
            symbol: symbol.into(),
        }
    }
}

/// Internal dependency edges between symbols. An edge `a -> b` means
/// `a` depends on `b`; walking incoming edges follows dependents.
pub struct SymbolGraph {
    inner: DiGraph<SymbolKey, ()>,
    index: HashMap<SymbolKey, NodeIndex>,
}

impl std::fmt::Debug for SymbolGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl SymbolGraph {
    /// Build the graph from every symbol and internal dependency in `manifest`.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut graph = SymbolGraph {
            inner: DiGraph::new(),
            index: HashMap::new(),
        };

        for file in manifest.files() {
            for symbol in file.symbols.values() {
                graph.add_node(SymbolKey::new(file.id.clone(), symbol.id.clone()));
            }
        }

        for file in manifest.files() {
            for symbol in file.symbols.values() {
                let key = SymbolKey::new(file.id.clone(), symbol.id.clone());
                let Some(source) = graph.node(&key) else {
                    continue;
                };
                for (target_file, target_symbol) in symbol.internal_targets() {
                    let target = SymbolKey::new(target_file, target_symbol);
                    if let Some(&target) = graph.index.get(&target) {
                        graph.inner.update_edge(source, target, ());
                    }
                }
            }
        }

        graph
    }

    fn add_node(&mut self, key: SymbolKey) -> NodeIndex {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.inner.add_node(key.clone());
        self.index.insert(key, idx);
        idx
    }

    /// Look up a symbol's node.
    pub fn node(&self, key: &SymbolKey) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    /// Get the key stored at a node.
    pub fn key(&self, idx: NodeIndex) -> Option<&SymbolKey> {
        self.inner.node_weight(idx)
    }

    /// Level-synchronous BFS from `seeds`, at most `depth` hops along `direction`.
    /// Seeds are always part of the result; cycles end at the visited set.
    pub fn bounded_closure(
        &self,
        seeds: &[NodeIndex],
        direction: Direction,
        depth: usize,
    ) -> HashSet<NodeIndex> {
        let mut visited: HashSet<NodeIndex> = seeds.iter().copied().collect();
        let mut frontier: Vec<NodeIndex> = seeds.to_vec();

        for _ in 0..depth {
            let mut next = Vec::new();
            for idx in frontier {
                for neighbor in self.inner.neighbors_directed(idx, direction) {
                    if visited.insert(neighbor) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        visited
    }
}
