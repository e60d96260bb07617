//! Turns the kernel's Voronoi edges into the initial skeleton graph.

use crate::constants::*;
use crate::geometry::*;
use crate::graph::*;
use crate::spatial::*;
use crate::terrain::*;
use fnv::{FnvHashMap, FnvHashSet};
use log::*;

/// Vertices closer than 1/16 of a walk cell are the same vertex.
const VERTEX_QUANTUM: f64 = 16.0;
/// Long Voronoi edges are resampled at this spacing so clearance minima
/// along them are not lost.
const SAMPLE_STEP: f64 = 2.0;

/// Index over every obstacle boundary segment plus the map border.
pub fn build_segment_index(polygons: &[Polygon], width: usize, height: usize) -> SegmentIndex {
    let mut segments: Vec<Segment> = polygons.iter().flat_map(|p| p.segments()).collect();
    segments.extend(border_segments(width, height));
    SegmentIndex::new(segments, width as f64, height as f64, SEGMENT_INDEX_CELL)
}

struct SkeletonBuilder<'a> {
    index: &'a SegmentIndex,
    labels: &'a Grid<u32>,
    width: f64,
    height: f64,
    min_clearance: f64,
    graph: RegionGraph,
    vertices: FnvHashMap<(i64, i64), NodeId>,
    links: FnvHashSet<(NodeId, NodeId)>,
}

impl<'a> SkeletonBuilder<'a> {
    fn in_free_space(&self, p: Point) -> bool {
        if !p.x.is_finite() || !p.y.is_finite() {
            return false;
        }
        if p.x < 0.0 || p.y < 0.0 || p.x > self.width || p.y > self.height {
            return false;
        }
        // points on the far border belong to the last cell
        let x = (p.x.floor() as i32).min(self.labels.width() as i32 - 1);
        let y = (p.y.floor() as i32).min(self.labels.height() as i32 - 1);
        self.labels.try_get(x, y) == Some(0)
    }

    /// Clearance at `p`, or `None` if the point is not usable skeleton.
    fn clearance(&self, p: Point) -> Option<f64> {
        if !self.in_free_space(p) {
            return None;
        }
        let clearance = self.index.nearest_distance(p);
        if clearance < self.min_clearance {
            None
        } else {
            Some(clearance)
        }
    }

    fn vertex(&mut self, p: Point, clearance: f64) -> NodeId {
        let key = (
            (p.x * VERTEX_QUANTUM).round() as i64,
            (p.y * VERTEX_QUANTUM).round() as i64,
        );
        if let Some(id) = self.vertices.get(&key) {
            return *id;
        }
        let id = self.graph.add_node(p, clearance, NodeKind::Skeleton);
        self.vertices.insert(key, id);
        id
    }

    fn add_edge(&mut self, edge: &VoronoiEdge) -> bool {
        // endpoints first: unbounded rays arrive as edges to far-off points
        if !self.in_free_space(edge.a) || !self.in_free_space(edge.b) {
            return false;
        }
        let length = edge.a.distance_to(edge.b);
        if length <= f64::EPSILON {
            return false;
        }

        let steps = (length / SAMPLE_STEP).ceil().max(1.0) as usize;
        let mut samples = Vec::new();
        for i in 0..=steps {
            let p = edge.a + (edge.b - edge.a).scale(i as f64 / steps as f64);
            match self.clearance(p) {
                Some(clearance) => samples.push((p, clearance)),
                None => return false,
            }
        }

        let mut previous: Option<NodeId> = None;
        for (p, clearance) in samples {
            let id = self.vertex(p, clearance);
            if let Some(prev) = previous {
                let key = (prev.min(id), prev.max(id));
                if prev != id && self.links.insert(key) {
                    self.graph.add_edge(GraphEdge::new(prev, id));
                }
            }
            previous = Some(id);
        }
        true
    }
}

/// Build the raw skeleton graph. Edges leaving the map, entering an
/// obstacle or passing closer than `min_clearance` to a boundary are
/// dropped; coincident vertices are shared.
pub fn build_skeleton(
    edges: &[VoronoiEdge],
    obstacles: &ObstacleSet,
    index: &SegmentIndex,
    min_clearance: f64,
) -> RegionGraph {
    let mut builder = SkeletonBuilder {
        index,
        labels: &obstacles.labels,
        width: obstacles.labels.width() as f64,
        height: obstacles.labels.height() as f64,
        min_clearance,
        graph: RegionGraph::new(),
        vertices: FnvHashMap::default(),
        links: FnvHashSet::default(),
    };

    let mut dropped = 0;
    for edge in edges {
        if !builder.add_edge(edge) {
            dropped += 1;
        }
    }

    debug!(
        "Skeleton: {} voronoi edges, {} dropped, {} nodes, {} edges",
        edges.len(),
        dropped,
        builder.graph.node_count(),
        builder.graph.edge_count()
    );

    builder.graph
}
