//! Removes dead-end skeleton spurs.
//!
//! Polygon corners make the Voronoi skeleton sprout short branches that run
//! into the walls. Such a branch ends in a leaf whose clearance falls off
//! towards the wall, so a leaf is removed when it is no wider than the node
//! it hangs from. Removal is repeated until the remaining leaves sit on
//! local clearance maxima.

use crate::graph::*;
use fnv::FnvHashSet;
use log::*;
use std::collections::{BTreeMap, VecDeque};

pub fn prune_graph(graph: RegionGraph, min_clearance: f64) -> RegionGraph {
    let incidence = graph.incidence();
    let mut degree: BTreeMap<NodeId, usize> = incidence
        .iter()
        .map(|(id, edges)| (*id, edges.len()))
        .collect();
    let mut removed_nodes = FnvHashSet::default();
    let mut removed_edges = vec![false; graph.edge_count()];

    let mut worklist: VecDeque<NodeId> = degree
        .iter()
        .filter(|(_, d)| **d == 1)
        .map(|(id, _)| *id)
        .collect();

    while let Some(leaf) = worklist.pop_front() {
        if removed_nodes.contains(&leaf) || degree[&leaf] != 1 {
            continue;
        }
        let edge_index = match incidence[&leaf].iter().find(|e| !removed_edges[**e]) {
            Some(index) => *index,
            None => continue,
        };
        let edge = &graph.edges()[edge_index];
        let parent = edge.other(leaf);

        let (leaf_clearance, parent_clearance) =
            match (graph.node(leaf), graph.node(parent)) {
                (Some(l), Some(p)) => (l.clearance, p.clearance),
                _ => continue,
            };
        if leaf_clearance >= min_clearance && leaf_clearance > parent_clearance {
            continue;
        }

        removed_nodes.insert(leaf);
        removed_edges[edge_index] = true;
        if let Some(d) = degree.get_mut(&parent) {
            *d -= 1;
            if *d == 1 {
                worklist.push_back(parent);
            }
        }
    }

    // components reduced to a single narrow vertex carry nothing useful
    for (id, d) in &degree {
        if *d == 0 && !removed_nodes.contains(id) {
            let narrow = graph
                .node(*id)
                .map(|n| n.clearance < min_clearance)
                .unwrap_or(true);
            if narrow {
                removed_nodes.insert(*id);
            }
        }
    }

    let mut pruned = graph.empty_successor();
    for (id, node) in graph.nodes() {
        if !removed_nodes.contains(&id) {
            pruned.insert_node(id, *node);
        }
    }
    for (index, edge) in graph.edges().iter().enumerate() {
        if !removed_edges[index] {
            pruned.add_edge(edge.clone());
        }
    }

    debug!(
        "Pruned {} nodes, {} remain",
        graph.node_count() - pruned.node_count(),
        pruned.node_count()
    );

    pruned
}
