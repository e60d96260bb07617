//! Finds the two wall points that close off each chokepoint.

use crate::geometry::*;
use crate::graph::*;
use crate::pipeline::AnalysisConfig;
use crate::spatial::*;
use log::*;
use std::collections::BTreeMap;

/// Wall anchors on either side of a chokepoint.
pub type ChokeSides = (Point, Point);

/// First skeleton point leaving `node` along each incident edge.
fn neighbor_points(graph: &RegionGraph, node: NodeId) -> Vec<Point> {
    graph
        .edges()
        .iter()
        .filter(|e| e.a == node || e.b == node)
        .filter_map(|e| match e.path_from(node).first() {
            Some(p) => Some(p.position),
            None => graph.node(e.other(node)).map(|n| n.position),
        })
        .collect()
}

/// Closest boundary point within `range` that lies on the `normal` side
/// of `center`.
fn nearest_on_side(index: &SegmentIndex, center: Point, normal: Point, range: f64) -> Option<Point> {
    index
        .segments_near(center, range)
        .map(|s| s.nearest_point(center))
        .filter(|p| (*p - center).dot(normal) > 0.0 && p.distance_to(center) <= range)
        .min_by(|a, b| a.distance_to(center).total_cmp(&b.distance_to(center)))
}

fn find_side(index: &SegmentIndex, center: Point, normal: Point, range: f64) -> Option<Point> {
    index
        .ray_cast(center, normal, range)
        .map(|(hit, _)| hit)
        .or_else(|| nearest_on_side(index, center, normal, range))
}

/// Wall sides of one chokepoint: rays cast across the local skeleton
/// direction, with a nearest-wall fallback per side.
pub fn chokepoint_sides(
    graph: &RegionGraph,
    index: &SegmentIndex,
    node: NodeId,
    config: &AnalysisConfig,
) -> Option<ChokeSides> {
    let choke = graph.node(node)?;
    let neighbors = neighbor_points(graph, node);
    let (prev, next) = match neighbors.as_slice() {
        [prev, next, ..] => (*prev, *next),
        _ => return None,
    };

    let normal = (next - prev).normalized()?.perpendicular();
    let range = choke.clearance * config.choke_side_range_factor + 4.0;

    let left = find_side(index, choke.position, normal, range)?;
    let right = find_side(index, choke.position, normal.scale(-1.0), range)?;
    Some((left, right))
}

/// Sides for every chokepoint node; `None` where a side could not be found.
pub fn find_choke_sides(
    graph: &RegionGraph,
    index: &SegmentIndex,
    config: &AnalysisConfig,
) -> BTreeMap<NodeId, Option<ChokeSides>> {
    graph
        .nodes_of_kind(NodeKind::Chokepoint)
        .map(|id| {
            let sides = chokepoint_sides(graph, index, id, config);
            if sides.is_none() {
                debug!("Chokepoint {:?} has no wall sides", id);
            }
            (id, sides)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Horizontal corridor between walls at y = 16 and y = 24, with a
    /// chokepoint in the middle of a skeleton running along y = 20.
    fn corridor() -> (RegionGraph, NodeId, SegmentIndex) {
        let mut graph = RegionGraph::new();
        let left = graph.add_node(Point::new(20.0, 20.0), 10.0, NodeKind::Region);
        let right = graph.add_node(Point::new(60.0, 20.0), 10.0, NodeKind::Region);
        let choke = graph.add_node(Point::new(44.0, 20.0), 4.0, NodeKind::Chokepoint);
        graph.add_edge(GraphEdge::new(left, choke));
        graph.add_edge(GraphEdge::new(choke, right));

        let index = SegmentIndex::new(
            vec![
                Segment::new(Point::new(40.0, 16.0), Point::new(48.0, 16.0)),
                Segment::new(Point::new(40.0, 24.0), Point::new(48.0, 24.0)),
            ],
            80.0,
            40.0,
            16.0,
        );
        (graph, choke, index)
    }

    #[test]
    fn rays_hit_both_walls() {
        let (graph, choke, index) = corridor();
        let (a, b) = chokepoint_sides(&graph, &index, choke, &AnalysisConfig::default()).unwrap();
        let mut ys = [a.y, b.y];
        ys.sort_by(|x, y| x.total_cmp(y));
        assert_eq!(ys, [16.0, 24.0]);
        assert_eq!(a.x, 44.0);
        assert_eq!(b.x, 44.0);
    }

    #[test]
    fn open_side_gives_no_sides() {
        let (graph, choke, _) = corridor();
        let index = SegmentIndex::new(
            vec![Segment::new(Point::new(40.0, 16.0), Point::new(48.0, 16.0))],
            80.0,
            40.0,
            16.0,
        );
        let sides = find_choke_sides(&graph, &index, &AnalysisConfig::default());
        assert_eq!(sides.len(), 1);
        assert_eq!(sides[&choke], None);
    }

    #[test]
    fn fallback_finds_offset_wall() {
        // the wall ends just before the ray would hit it
        let (graph, choke, _) = corridor();
        let index = SegmentIndex::new(
            vec![
                Segment::new(Point::new(40.0, 16.0), Point::new(43.0, 16.0)),
                Segment::new(Point::new(40.0, 24.0), Point::new(48.0, 24.0)),
            ],
            80.0,
            40.0,
            16.0,
        );
        let (a, b) = chokepoint_sides(&graph, &index, choke, &AnalysisConfig::default()).unwrap();
        let top = if a.y < b.y { a } else { b };
        assert_eq!(top, Point::new(43.0, 16.0));
    }
}
