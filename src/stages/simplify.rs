//! Collapses chains of degree-2 nodes into single edges.

use crate::graph::*;
use log::*;
use std::collections::BTreeMap;

fn as_point(node: &GraphNode) -> SkeletonPoint {
    SkeletonPoint {
        position: node.position,
        clearance: node.clearance,
    }
}

/// The incident edge of a degree-2 node that is not `arrived_by`.
fn continuation(incidence: &BTreeMap<NodeId, Vec<usize>>, node: NodeId, arrived_by: usize) -> Option<usize> {
    incidence
        .get(&node)?
        .iter()
        .copied()
        .find(|e| *e != arrived_by)
}

struct ChainWalker<'a> {
    graph: &'a RegionGraph,
    incidence: BTreeMap<NodeId, Vec<usize>>,
    visited: Vec<bool>,
}

impl<'a> ChainWalker<'a> {
    /// Follow edges from `start` through `first` until `is_end` holds for a
    /// node, concatenating the geometry on the way.
    fn walk<F>(&mut self, start: NodeId, first: usize, is_end: F) -> Option<GraphEdge>
    where
        F: Fn(NodeId) -> bool,
    {
        let graph = self.graph;
        let mut path = Vec::new();
        let mut current = start;
        let mut edge_index = first;

        loop {
            self.visited[edge_index] = true;
            let edge = &graph.edges()[edge_index];
            let next = edge.other(current);
            path.extend(edge.path_from(current));

            if is_end(next) {
                return Some(GraphEdge::with_path(start, next, path));
            }

            path.push(as_point(graph.node(next)?));
            edge_index = continuation(&self.incidence, next, edge_index)?;
            if self.visited[edge_index] {
                return None;
            }
            current = next;
        }
    }
}

/// Replace every maximal chain of degree-2 nodes by one edge between the
/// surrounding anchors (nodes of any other degree). A cycle made only of
/// degree-2 nodes becomes a self-loop on its smallest node id.
pub fn simplify_graph(graph: RegionGraph) -> RegionGraph {
    let incidence = graph.incidence();
    let anchors: Vec<NodeId> = incidence
        .iter()
        .filter(|(_, edges)| edges.len() != 2)
        .map(|(id, _)| *id)
        .collect();

    let mut walker = ChainWalker {
        graph: &graph,
        visited: vec![false; graph.edge_count()],
        incidence,
    };

    let mut simplified = graph.empty_successor();
    let mut edges = Vec::new();

    let is_anchor = |id: NodeId| anchors.binary_search(&id).is_ok();
    for &anchor in &anchors {
        let incident = walker.incidence[&anchor].clone();
        for edge_index in incident {
            if walker.visited[edge_index] {
                continue;
            }
            if let Some(edge) = walker.walk(anchor, edge_index, is_anchor) {
                edges.push(edge);
            }
        }
    }

    let mut cycle_anchors = Vec::new();
    for edge_index in 0..graph.edge_count() {
        if walker.visited[edge_index] {
            continue;
        }
        // every node on this cycle has degree 2; restart from its smallest id
        let start = {
            let mut lowest = graph.edges()[edge_index].a;
            let mut current = lowest;
            let mut index = edge_index;
            loop {
                let next = graph.edges()[index].other(current);
                if next == graph.edges()[edge_index].a {
                    break;
                }
                lowest = lowest.min(next);
                index = match continuation(&walker.incidence, next, index) {
                    Some(i) => i,
                    None => break,
                };
                current = next;
            }
            lowest
        };

        let first = walker.incidence[&start][0];
        if let Some(edge) = walker.walk(start, first, |id| id == start) {
            edges.push(edge);
            cycle_anchors.push(start);
        }
    }

    for (id, node) in graph.nodes() {
        if is_anchor(id) || cycle_anchors.contains(&id) {
            simplified.insert_node(id, *node);
        }
    }
    for edge in edges {
        simplified.add_edge(edge);
    }

    debug!(
        "Simplified {} nodes / {} edges to {} / {}",
        graph.node_count(),
        graph.edge_count(),
        simplified.node_count(),
        simplified.edge_count()
    );

    simplified
}
