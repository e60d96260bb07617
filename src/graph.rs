//! Skeleton graph passed between the topology stages.
//!
//! Each stage takes a `RegionGraph` by value and returns a new one, so a
//! graph is only ever owned by the stage working on it.

use crate::geometry::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// Raw skeleton vertex, not yet classified.
    Skeleton,
    /// Local clearance maximum; becomes the centre of a region.
    Region,
    /// Clearance minimum between two regions.
    Chokepoint,
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    pub position: Point,
    /// Distance to the nearest obstacle boundary.
    pub clearance: f64,
    pub kind: NodeKind,
}

/// Intermediate skeleton point of an edge.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct SkeletonPoint {
    pub position: Point,
    pub clearance: f64,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct GraphEdge {
    pub a: NodeId,
    pub b: NodeId,
    /// Points strictly between `a` and `b`, ordered from `a` to `b`.
    pub path: Vec<SkeletonPoint>,
}

impl GraphEdge {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        GraphEdge {
            a,
            b,
            path: Vec::new(),
        }
    }

    pub fn with_path(a: NodeId, b: NodeId, path: Vec<SkeletonPoint>) -> Self {
        GraphEdge { a, b, path }
    }

    /// The endpoint opposite `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.a == node {
            self.b
        } else {
            self.a
        }
    }

    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }

    /// Path points ordered starting from the `from` endpoint.
    pub fn path_from(&self, from: NodeId) -> Vec<SkeletonPoint> {
        if from == self.a {
            self.path.clone()
        } else {
            self.path.iter().rev().copied().collect()
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct RegionGraph {
    nodes: BTreeMap<NodeId, GraphNode>,
    edges: Vec<GraphEdge>,
    next_id: u32,
}

impl RegionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, position: Point, clearance: f64, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            GraphNode {
                position,
                clearance,
                kind,
            },
        );
        id
    }

    /// Re-insert a node under an id taken from another graph.
    pub fn insert_node(&mut self, id: NodeId, node: GraphNode) {
        self.next_id = self.next_id.max(id.0 + 1);
        self.nodes.insert(id, node);
    }

    pub fn add_edge(&mut self, edge: GraphEdge) {
        debug_assert!(self.nodes.contains_key(&edge.a) && self.nodes.contains_key(&edge.b));
        self.edges.push(edge);
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Id that the next `add_node` will hand out.
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Start a graph that continues numbering after this one.
    pub fn empty_successor(&self) -> RegionGraph {
        RegionGraph {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            next_id: self.next_id,
        }
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(move |(_, node)| node.kind == kind)
            .map(|(id, _)| *id)
    }

    /// Incident edge indices per node; a self-loop is listed twice.
    pub fn incidence(&self) -> BTreeMap<NodeId, Vec<usize>> {
        let mut incidence: BTreeMap<NodeId, Vec<usize>> =
            self.nodes.keys().map(|id| (*id, Vec::new())).collect();
        for (index, edge) in self.edges.iter().enumerate() {
            if let Some(list) = incidence.get_mut(&edge.a) {
                list.push(index);
            }
            if let Some(list) = incidence.get_mut(&edge.b) {
                list.push(index);
            }
        }
        incidence
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.edges
            .iter()
            .map(|e| (e.a == id) as usize + (e.b == id) as usize)
            .sum()
    }

    /// Every point along an edge, endpoints included, ordered from `a`.
    pub fn edge_points(&self, edge: &GraphEdge) -> Vec<SkeletonPoint> {
        let endpoint = |id: NodeId| {
            let node = &self.nodes[&id];
            SkeletonPoint {
                position: node.position,
                clearance: node.clearance,
            }
        };

        let mut points = Vec::with_capacity(edge.path.len() + 2);
        points.push(endpoint(edge.a));
        points.extend(edge.path.iter().copied());
        points.push(endpoint(edge.b));
        points
    }

    /// Minimum clearance along an edge, endpoints included.
    pub fn edge_clearance(&self, edge: &GraphEdge) -> f64 {
        self.edge_points(edge)
            .iter()
            .map(|p| p.clearance)
            .fold(f64::INFINITY, f64::min)
    }

    /// Polyline length of an edge.
    pub fn edge_length(&self, edge: &GraphEdge) -> f64 {
        self.edge_points(edge)
            .windows(2)
            .map(|w| w[0].position.distance_to(w[1].position))
            .sum()
    }
}
