//! Fuses region nodes that describe the same open area.

use super::classify::{is_constriction, valley_between};
use crate::graph::*;
use crate::pipeline::AnalysisConfig;
use fnv::FnvHashMap;
use log::*;
use pathfinding::prelude::connected_components;
use std::collections::BTreeMap;

fn as_point(node: &GraphNode) -> SkeletonPoint {
    SkeletonPoint {
        position: node.position,
        clearance: node.clearance,
    }
}

/// Split region-to-region edges that hide a constriction and collect the
/// pairs of region nodes that should be fused.
fn split_constrictions(
    graph: &RegionGraph,
    config: &AnalysisConfig,
) -> (RegionGraph, Vec<(NodeId, NodeId)>) {
    let mut split = graph.empty_successor();
    for (id, node) in graph.nodes() {
        split.insert_node(id, *node);
    }

    let mut links = Vec::new();
    for edge in graph.edges() {
        let both_regions = [edge.a, edge.b]
            .iter()
            .all(|id| graph.node(*id).map(|n| n.kind) == Some(NodeKind::Region));
        if !both_regions || edge.is_loop() {
            split.add_edge(edge.clone());
            continue;
        }

        let points = graph.edge_points(edge);
        let last = points.len() - 1;
        let valley = valley_between(&points, 0, last);
        let constricted = valley != 0
            && valley != last
            && is_constriction(
                points[valley].clearance,
                points[0].clearance,
                points[last].clearance,
                config,
            );

        if constricted {
            let p = points[valley];
            let choke = split.add_node(p.position, p.clearance, NodeKind::Chokepoint);
            split.add_edge(GraphEdge::with_path(edge.a, choke, points[1..valley].to_vec()));
            split.add_edge(GraphEdge::with_path(choke, edge.b, points[valley + 1..last].to_vec()));
        } else {
            links.push((edge.a, edge.b));
            split.add_edge(edge.clone());
        }
    }

    (split, links)
}

/// Map every region node to the representative of its merge group: the
/// widest node, lowest id on ties.
fn merge_groups(graph: &RegionGraph, links: &[(NodeId, NodeId)]) -> BTreeMap<NodeId, NodeId> {
    let mut neighbors: FnvHashMap<NodeId, Vec<NodeId>> = FnvHashMap::default();
    for &(a, b) in links {
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }

    let regions: Vec<NodeId> = graph.nodes_of_kind(NodeKind::Region).collect();
    let groups = connected_components(&regions, |id| {
        neighbors.get(id).cloned().unwrap_or_default()
    });

    let clearance = |id: &NodeId| graph.node(*id).map(|n| n.clearance).unwrap_or(0.0);
    let mut representative = BTreeMap::new();
    for group in groups {
        let best = group.iter().copied().max_by(|a, b| {
            clearance(a)
                .total_cmp(&clearance(b))
                .then_with(|| b.cmp(a))
        });
        if let Some(best) = best {
            for id in group {
                representative.insert(id, best);
            }
        }
    }
    representative
}

/// Merge adjacent region nodes unless the edge between them is a
/// constriction, then drop chokepoints left with the same region on both
/// sides.
pub fn merge_regions(graph: RegionGraph, config: &AnalysisConfig) -> RegionGraph {
    let (split, links) = split_constrictions(&graph, config);
    let representative = merge_groups(&split, &links);
    let resolve = |id: NodeId| representative.get(&id).copied().unwrap_or(id);

    // rewire edges onto representatives, keeping the geometry continuous
    let mut rewired = Vec::new();
    for edge in split.edges() {
        let (a, b) = (resolve(edge.a), resolve(edge.b));
        let region_edge = [edge.a, edge.b]
            .iter()
            .all(|id| representative.contains_key(id));
        if a == b && region_edge {
            continue;
        }

        let mut path = Vec::with_capacity(edge.path.len() + 2);
        if a != edge.a {
            if let Some(node) = split.node(edge.a) {
                path.push(as_point(node));
            }
        }
        path.extend(edge.path.iter().copied());
        if b != edge.b {
            if let Some(node) = split.node(edge.b) {
                path.push(as_point(node));
            }
        }
        rewired.push(GraphEdge::with_path(a, b, path));
    }

    // chokepoints that no longer separate two regions
    let mut sides: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for edge in &rewired {
        for (end, other) in [(edge.a, edge.b), (edge.b, edge.a)] {
            if split.node(end).map(|n| n.kind) == Some(NodeKind::Chokepoint) {
                sides.entry(end).or_default().push(other);
            }
        }
    }
    let dissolved: Vec<NodeId> = sides
        .iter()
        .filter(|(_, regions)| regions.len() != 2 || regions[0] == regions[1])
        .map(|(id, _)| *id)
        .collect();

    let mut merged = split.empty_successor();
    for (id, node) in split.nodes() {
        let absorbed = resolve(id) != id;
        if !absorbed && !dissolved.contains(&id) {
            merged.insert_node(id, *node);
        }
    }
    for edge in rewired {
        if !dissolved.contains(&edge.a) && !dissolved.contains(&edge.b) {
            merged.add_edge(edge);
        }
    }

    debug!(
        "Merged {} region nodes into {}, dissolved {} chokepoints",
        split.nodes_of_kind(NodeKind::Region).count(),
        merged.nodes_of_kind(NodeKind::Region).count(),
        dissolved.len()
    );

    merged
}
