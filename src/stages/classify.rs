//! Labels skeleton nodes as region centres or chokepoints.
//!
//! Along every simplified edge the clearance profile is a sequence of peaks
//! (wide spots) and valleys (narrow spots). Shallow valleys are noise from
//! the wall outline, so the lower peak next to the shallowest valley is
//! dissolved until every remaining valley is a real constriction. Remaining
//! interior peaks become region nodes, remaining valleys chokepoints.

use crate::graph::*;
use crate::pipeline::AnalysisConfig;
use log::*;

/// True if a clearance dip between two peaks is deep enough to separate
/// two open areas.
pub fn is_constriction(valley: f64, left_peak: f64, right_peak: f64, config: &AnalysisConfig) -> bool {
    let lower = left_peak.min(right_peak);
    let depth = lower - valley;
    depth >= config.choke_min_depth.max(config.choke_min_depth_ratio * lower)
}

/// Index of the lowest clearance in `points[from..=to]`; first wins on ties.
pub(crate) fn valley_between(points: &[SkeletonPoint], from: usize, to: usize) -> usize {
    (from..=to)
        .min_by(|a, b| points[*a].clearance.total_cmp(&points[*b].clearance))
        .unwrap_or(from)
}

/// Peak and valley indices of one edge profile after removing shallow
/// valleys. `peaks` always starts and ends with the two endpoints, and
/// `valleys[i]` lies between `peaks[i]` and `peaks[i + 1]`; a `None` valley
/// joins its peaks without a chokepoint.
pub(crate) fn reduce_profile(points: &[SkeletonPoint], config: &AnalysisConfig) -> (Vec<usize>, Vec<Option<usize>>) {
    let last = points.len() - 1;
    let mut peaks = vec![0];
    for i in 1..last {
        let c = points[i].clearance;
        if c > points[i - 1].clearance && c >= points[i + 1].clearance {
            peaks.push(i);
        }
    }
    peaks.push(last);

    loop {
        // shallowest valley that is not a constriction
        let shallow = peaks
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let valley = valley_between(points, pair[0], pair[1]);
                let left = points[pair[0]].clearance;
                let right = points[pair[1]].clearance;
                let c = points[valley].clearance;
                if is_constriction(c, left, right, config) {
                    None
                } else {
                    Some((i, left.min(right) - c))
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let (pair, _) = match shallow {
            Some(found) => found,
            None => break,
        };

        let left = peaks[pair];
        let right = peaks[pair + 1];
        if left == 0 && right == last {
            // both ends fixed: one open area from end to end
            return (peaks, vec![None]);
        }

        let remove = if left == 0 {
            pair + 1
        } else if right == last {
            pair
        } else if points[left].clearance < points[right].clearance {
            pair
        } else {
            pair + 1
        };
        peaks.remove(remove);
    }

    let valleys = peaks
        .windows(2)
        .map(|pair| Some(valley_between(points, pair[0], pair[1])))
        .collect();
    (peaks, valleys)
}

/// Every anchor becomes a region node; edges are split at their remaining
/// peaks and valleys.
pub fn classify_graph(graph: RegionGraph, config: &AnalysisConfig) -> RegionGraph {
    let mut classified = graph.empty_successor();
    for (id, node) in graph.nodes() {
        classified.insert_node(
            id,
            GraphNode {
                kind: NodeKind::Region,
                ..*node
            },
        );
    }

    for edge in graph.edges() {
        let points = graph.edge_points(edge);
        let (peaks, valleys) = reduce_profile(&points, config);

        // a loop with no wide spot of its own stays inside its anchor's area
        if edge.is_loop() && peaks.len() == 2 {
            classified.add_edge(edge.clone());
            continue;
        }

        // split points: endpoints, interior peaks, valleys, in path order
        let mut splits: Vec<(usize, NodeKind)> = Vec::new();
        for (i, peak) in peaks.iter().enumerate() {
            splits.push((*peak, NodeKind::Region));
            if let Some(Some(valley)) = valleys.get(i) {
                splits.push((*valley, NodeKind::Chokepoint));
            }
        }

        let last = points.len() - 1;
        let mut previous = edge.a;
        let mut previous_index = 0;
        for &(index, kind) in splits.iter().skip(1) {
            let node = if index == previous_index {
                // valley sitting on a peak: nothing to split
                continue;
            } else if index == last {
                edge.b
            } else {
                let p = points[index];
                classified.add_node(p.position, p.clearance, kind)
            };
            let path = points[previous_index + 1..index].to_vec();
            classified.add_edge(GraphEdge::with_path(previous, node, path));
            previous = node;
            previous_index = index;
        }
    }

    let regions = classified.nodes_of_kind(NodeKind::Region).count();
    let chokepoints = classified.nodes_of_kind(NodeKind::Chokepoint).count();
    if regions == 0 {
        warn!("Terrain analysis found no region nodes; the map may be degenerate");
    }
    debug!("Classified {} region nodes, {} chokepoint nodes", regions, chokepoints);

    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::*;

    fn profile(clearances: &[f64]) -> Vec<SkeletonPoint> {
        clearances
            .iter()
            .enumerate()
            .map(|(i, c)| SkeletonPoint {
                position: Point::new(i as f64, 0.0),
                clearance: *c,
            })
            .collect()
    }

    fn edge_graph(clearances: &[f64]) -> (RegionGraph, NodeId, NodeId) {
        let points = profile(clearances);
        let mut graph = RegionGraph::new();
        let first = points[0];
        let last = points[points.len() - 1];
        let a = graph.add_node(first.position, first.clearance, NodeKind::Skeleton);
        let b = graph.add_node(last.position, last.clearance, NodeKind::Skeleton);
        graph.add_edge(GraphEdge::with_path(a, b, points[1..points.len() - 1].to_vec()));
        (graph, a, b)
    }

    #[test]
    fn threshold_uses_depth_and_ratio() {
        let config = AnalysisConfig::default();
        assert!(is_constriction(4.0, 10.0, 12.0, &config));
        assert!(!is_constriction(9.0, 10.0, 12.0, &config));
        // 2 deep but under 10% of a 40 wide peak
        assert!(!is_constriction(37.0, 40.0, 40.0, &config));
    }

    #[test]
    fn narrow_corridor_gets_one_chokepoint() {
        let (graph, a, b) = edge_graph(&[10.0, 8.0, 5.0, 3.0, 5.0, 8.0, 10.0]);
        let classified = classify_graph(graph, &AnalysisConfig::default());
        let chokes: Vec<NodeId> = classified.nodes_of_kind(NodeKind::Chokepoint).collect();
        assert_eq!(chokes.len(), 1);
        assert_eq!(classified.node(chokes[0]).unwrap().clearance, 3.0);
        assert_eq!(classified.node(a).unwrap().kind, NodeKind::Region);
        assert_eq!(classified.node(b).unwrap().kind, NodeKind::Region);
        assert_eq!(classified.edge_count(), 2);
        let total: usize = classified.edges().iter().map(|e| e.path.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn shallow_wobble_is_not_a_chokepoint() {
        let (graph, _, _) = edge_graph(&[10.0, 9.5, 10.2, 9.6, 10.0]);
        let classified = classify_graph(graph, &AnalysisConfig::default());
        assert_eq!(classified.nodes_of_kind(NodeKind::Chokepoint).count(), 0);
        assert_eq!(classified.nodes_of_kind(NodeKind::Region).count(), 2);
        assert_eq!(classified.edge_count(), 1);
    }

    #[test]
    fn interior_room_between_two_corridors() {
        let (graph, _, _) = edge_graph(&[10.0, 3.0, 12.0, 3.0, 10.0]);
        let classified = classify_graph(graph, &AnalysisConfig::default());
        assert_eq!(classified.nodes_of_kind(NodeKind::Chokepoint).count(), 2);
        assert_eq!(classified.nodes_of_kind(NodeKind::Region).count(), 3);
        assert_eq!(classified.edge_count(), 4);
    }

    #[test]
    fn plain_loop_has_no_chokepoint() {
        let mut graph = RegionGraph::new();
        let a = graph.add_node(Point::new(0.0, 0.0), 10.0, NodeKind::Skeleton);
        graph.add_edge(GraphEdge::with_path(a, a, profile(&[6.0, 3.0, 6.0])));
        let classified = classify_graph(graph, &AnalysisConfig::default());
        assert_eq!(classified.nodes_of_kind(NodeKind::Chokepoint).count(), 0);
        assert_eq!(classified.edge_count(), 1);
    }

    #[test]
    fn empty_graph_is_not_fatal() {
        let classified = classify_graph(RegionGraph::new(), &AnalysisConfig::default());
        assert_eq!(classified.node_count(), 0);
    }
}
