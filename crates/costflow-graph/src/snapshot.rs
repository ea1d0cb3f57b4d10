//! Immutable per-date graph snapshot.
//!
//! A [`GraphSnapshot`] is built once per reporting day from the set of
//! non-archived nodes and the edges active on that day, and is disposed
//! after that day's allocation completes. It never mutates once built, so
//! it may be shared and read concurrently across day-tasks without
//! synchronization.

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use sha2::{Digest, Sha256};

use costflow_core::{CostDate, EdgeId, NodeId};
use costflow_traits::{Edge, Node, NodeType};

use crate::error::{GraphError, GraphResult};

/// Why an edge was dropped during snapshot construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// `parent_id` is not present among the snapshot's nodes.
    MissingParent(NodeId),
    /// `child_id` is not present among the snapshot's nodes.
    MissingChild(NodeId),
}

/// An edge excluded from the snapshot's graph, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEdge {
    /// The excluded edge's id.
    pub edge_id: EdgeId,
    /// Why it was excluded.
    pub reason: DropReason,
}

/// An immutable view of the active cost dependency graph on one date.
pub struct GraphSnapshot {
    date: CostDate,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    out_adjacency: BTreeMap<NodeId, Vec<EdgeId>>,
    in_adjacency: BTreeMap<NodeId, Vec<EdgeId>>,
    dropped: Vec<DroppedEdge>,
    hash: String,
}

impl GraphSnapshot {
    /// Builds a snapshot for `date` from `nodes` (already filtered to
    /// non-archived) and `edges` (already filtered to those active on
    /// `date`).
    ///
    /// Edges referencing a node id missing from `nodes` are excluded from
    /// the snapshot and recorded in [`GraphSnapshot::dropped_edges`] rather
    /// than failing construction; a warning is logged for each.
    #[must_use]
    pub fn build(date: CostDate, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let nodes: BTreeMap<NodeId, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut kept_edges = BTreeMap::new();
        let mut dropped = Vec::new();

        for edge in edges {
            if !nodes.contains_key(&edge.parent_id) {
                tracing::warn!(
                    edge = %edge.id,
                    parent = %edge.parent_id,
                    date = %date,
                    "dropping edge: parent node missing from snapshot"
                );
                dropped.push(DroppedEdge {
                    edge_id: edge.id,
                    reason: DropReason::MissingParent(edge.parent_id),
                });
                continue;
            }
            if !nodes.contains_key(&edge.child_id) {
                tracing::warn!(
                    edge = %edge.id,
                    child = %edge.child_id,
                    date = %date,
                    "dropping edge: child node missing from snapshot"
                );
                dropped.push(DroppedEdge {
                    edge_id: edge.id,
                    reason: DropReason::MissingChild(edge.child_id),
                });
                continue;
            }
            kept_edges.insert(edge.id, edge);
        }

        let mut out_adjacency: BTreeMap<NodeId, Vec<EdgeId>> = BTreeMap::new();
        let mut in_adjacency: BTreeMap<NodeId, Vec<EdgeId>> = BTreeMap::new();
        for edge in kept_edges.values() {
            out_adjacency.entry(edge.parent_id).or_default().push(edge.id);
            in_adjacency.entry(edge.child_id).or_default().push(edge.id);
        }
        // Sort each adjacency list by (child_id|parent_id, edge_id) for
        // reproducible traversal order.
        for edge_ids in out_adjacency.values_mut() {
            edge_ids.sort_by_key(|eid| (kept_edges[eid].child_id, *eid));
        }
        for edge_ids in in_adjacency.values_mut() {
            edge_ids.sort_by_key(|eid| (kept_edges[eid].parent_id, *eid));
        }

        let hash = compute_hash(date, &nodes, &kept_edges);

        Self {
            date,
            nodes,
            edges: kept_edges,
            out_adjacency,
            in_adjacency,
            dropped,
            hash,
        }
    }

    /// The date this snapshot was built for.
    #[must_use]
    pub fn date(&self) -> CostDate {
        self.date
    }

    /// Deterministic structural hash: two snapshots with identical graphs
    /// on the same date always hash identically, independent of input
    /// ordering.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Edges excluded from the graph because they referenced a node
    /// outside the snapshot.
    #[must_use]
    pub fn dropped_edges(&self) -> &[DroppedEdge] {
        &self.dropped
    }

    /// Returns the node with `id`, if present.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the edge with `id`, if present.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// All node ids in the snapshot, sorted.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes in the snapshot.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges retained in the snapshot (after dropping
    /// dangling-reference edges).
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges from `node`, sorted by `(child_id, edge_id)`.
    #[must_use]
    pub fn edges_from(&self, node: NodeId) -> &[EdgeId] {
        self.out_adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Incoming edges into `node`, sorted by `(parent_id, edge_id)`.
    #[must_use]
    pub fn edges_into(&self, node: NodeId) -> &[EdgeId] {
        self.in_adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes with no incoming edges, sorted by id.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .keys()
            .copied()
            .filter(move |id| self.edges_into(*id).is_empty())
    }

    /// Nodes with no outgoing edges, sorted by id.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .keys()
            .copied()
            .filter(move |id| self.edges_from(*id).is_empty())
    }

    /// Returns every ancestor of `node` (transitive sources), sorted by id.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` if `node` is not in the snapshot.
    pub fn ancestors(&self, node: NodeId) -> GraphResult<Vec<NodeId>> {
        self.require_node(node)?;
        let mut seen = std::collections::BTreeSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for edge_id in self.edges_into(current) {
                let parent = self.edges[edge_id].parent_id;
                if seen.insert(parent) {
                    stack.push(parent);
                }
            }
        }
        Ok(seen.into_iter().collect())
    }

    /// Returns every descendant of `node` (transitive receivers), sorted
    /// by id.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` if `node` is not in the snapshot.
    pub fn descendants(&self, node: NodeId) -> GraphResult<Vec<NodeId>> {
        self.require_node(node)?;
        let mut seen = std::collections::BTreeSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for edge_id in self.edges_from(current) {
                let child = self.edges[edge_id].child_id;
                if seen.insert(child) {
                    stack.push(child);
                }
            }
        }
        Ok(seen.into_iter().collect())
    }

    fn require_node(&self, node: NodeId) -> GraphResult<()> {
        if self.nodes.contains_key(&node) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(node))
        }
    }

    /// `true` iff `node` is a product with no outgoing edge to another
    /// product on this date — i.e. it is a final cost centre, whether or
    /// not it retains an unallocated residual.
    #[must_use]
    pub fn is_final_cost_centre(&self, node: NodeId) -> bool {
        let Some(n) = self.nodes.get(&node) else {
            return false;
        };
        if n.node_type != NodeType::Product {
            return false;
        }
        !self.edges_from(node).iter().any(|eid| {
            self.nodes
                .get(&self.edges[eid].child_id)
                .is_some_and(|child| child.node_type == NodeType::Product)
        })
    }

    /// Computes the topological order of the snapshot's nodes using
    /// Kahn's algorithm (via `petgraph`), with ties broken by node id for
    /// reproducibility.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::CycleDetected` if the graph contains a cycle.
    pub fn topological_order(&self) -> GraphResult<Vec<NodeId>> {
        let mut graph = DiGraph::<NodeId, ()>::new();
        let mut indices: BTreeMap<NodeId, NodeIndex> = BTreeMap::new();
        for id in self.nodes.keys() {
            indices.insert(*id, graph.add_node(*id));
        }
        for edge in self.edges.values() {
            graph.add_edge(indices[&edge.parent_id], indices[&edge.child_id], ());
        }

        let sorted = toposort(&graph, None).map_err(|_| GraphError::CycleDetected)?;
        Ok(sorted
            .into_iter()
            .map(|idx| graph[idx])
            .collect())
    }
}

fn compute_hash(
    date: CostDate,
    nodes: &BTreeMap<NodeId, Node>,
    edges: &BTreeMap<EdgeId, Edge>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|nodes|");

    let mut sorted_nodes: Vec<&Node> = nodes.values().collect();
    sorted_nodes.sort_by_key(|n| n.id);
    for node in sorted_nodes {
        hasher.update(node.id.to_string().as_bytes());
        hasher.update(b",");
        hasher.update(node.name.as_bytes());
        hasher.update(b",");
        hasher.update(format!("{:?}", node.node_type).as_bytes());
        hasher.update(b";");
    }

    hasher.update(b"|edges|");
    let mut sorted_edges: Vec<&Edge> = edges.values().collect();
    sorted_edges.sort_by_key(|e| (e.parent_id, e.child_id, e.id));
    for edge in sorted_edges {
        hasher.update(edge.parent_id.to_string().as_bytes());
        hasher.update(b",");
        hasher.update(edge.child_id.to_string().as_bytes());
        hasher.update(b",");
        hasher.update(edge.default_strategy.strategy.as_bytes());
        hasher.update(b",");
        hasher.update(edge.default_strategy.params.to_string().as_bytes());
        hasher.update(b";");
    }

    format!("{:x}", hasher.finalize())
}
