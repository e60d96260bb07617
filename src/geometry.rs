//! Continuous geometry in walk-cell coordinates.
//!
//! Polygons produced here are exact rectilinear outlines of cell sets:
//! vertices sit on cell corners, so a cell (x, y) spans [x, x+1] x [y, y+1].
//! Rings are traced with the interior on the right-hand side in screen
//! orientation (y down), which gives outer rings a positive signed area and
//! holes a negative one.
//!
//! The Voronoi diagram of free space is not computed in this crate; it comes
//! from a [`GeometryKernel`] implementation.

use crate::constants::*;
use crate::location::*;
use crate::terrain::*;
use fnv::FnvHashMap;
use itertools::Itertools;
use log::*;
use serde::{Deserialize, Serialize};
use std::hash::Hash;

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Centre of a walk cell.
    pub fn from_walk(pos: WalkPosition) -> Self {
        Point::new(pos.x as f64 + 0.5, pos.y as f64 + 0.5)
    }

    /// Walk cell containing this point.
    pub fn to_walk(self) -> WalkPosition {
        WalkPosition::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self - other).length()
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn scale(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        if len <= f64::EPSILON {
            None
        } else {
            Some(self.scale(1.0 / len))
        }
    }

    /// Counter-clockwise perpendicular (in y-up orientation).
    pub fn perpendicular(self) -> Point {
        Point::new(-self.y, self.x)
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub fn new(a: Point, b: Point) -> Self {
        Segment { a, b }
    }

    pub fn length(&self) -> f64 {
        self.a.distance_to(self.b)
    }

    /// Closest point of the segment to `p`.
    pub fn nearest_point(&self, p: Point) -> Point {
        let ab = self.b - self.a;
        let len2 = ab.dot(ab);
        if len2 <= f64::EPSILON {
            return self.a;
        }
        let u = ((p - self.a).dot(ab) / len2).clamp(0.0, 1.0);
        self.a + ab.scale(u)
    }

    pub fn distance_to(&self, p: Point) -> f64 {
        self.nearest_point(p).distance_to(p)
    }

    /// Parameter `t >= 0` along the ray `origin + t * dir` where it meets
    /// this segment, if it does.
    pub fn ray_intersection(&self, origin: Point, dir: Point) -> Option<f64> {
        let seg = self.b - self.a;
        let denom = dir.cross(seg);
        if denom.abs() <= 1e-12 {
            return None;
        }
        let diff = self.a - origin;
        let t = diff.cross(seg) / denom;
        let u = diff.cross(dir) / denom;
        if t >= 0.0 && (-1e-9..=1.0 + 1e-9).contains(&u) {
            Some(t)
        } else {
            None
        }
    }

    /// True if the two segments cross at a single interior point. Touching
    /// at endpoints or overlapping collinearly does not count.
    pub fn crosses(&self, other: &Segment) -> bool {
        fn orient(a: Point, b: Point, c: Point) -> f64 {
            (b - a).cross(c - a)
        }

        let d1 = orient(other.a, other.b, self.a);
        let d2 = orient(other.a, other.b, self.b);
        let d3 = orient(self.a, self.b, other.a);
        let d4 = orient(self.a, self.b, other.b);

        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }
}

/// A closed ring of vertices; the closing edge from last to first is implicit.
pub type Ring = Vec<Point>;

fn ring_signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    ring.iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
        / 2.0
}

fn ring_segments(ring: &[Point]) -> impl Iterator<Item = Segment> + '_ {
    ring.iter()
        .circular_tuple_windows()
        .map(|(a, b)| Segment::new(*a, *b))
}

fn ring_contains(ring: &[Point], p: Point) -> bool {
    let mut inside = false;
    for (a, b) in ring.iter().circular_tuple_windows() {
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// A polygon with an outer ring and zero or more hole rings.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub outer: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(outer: Ring) -> Self {
        Polygon {
            outer,
            holes: Vec::new(),
        }
    }

    /// Area of the outer ring minus the holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| ring_signed_area(h).abs()).sum();
        ring_signed_area(&self.outer).abs() - holes
    }

    pub fn perimeter(&self) -> f64 {
        if self.outer.len() < 2 {
            return 0.0;
        }
        ring_segments(&self.outer).map(|s| s.length()).sum()
    }

    /// Area centroid of the outer ring.
    pub fn centroid(&self) -> Point {
        let area = ring_signed_area(&self.outer);
        if area.abs() <= f64::EPSILON {
            let n = self.outer.len().max(1) as f64;
            let sum = self
                .outer
                .iter()
                .fold(Point::default(), |acc, p| acc + *p);
            return sum.scale(1.0 / n);
        }

        let (cx, cy) = self
            .outer
            .iter()
            .circular_tuple_windows()
            .fold((0.0, 0.0), |(cx, cy), (a, b)| {
                let f = a.x * b.y - b.x * a.y;
                (cx + (a.x + b.x) * f, cy + (a.y + b.y) * f)
            });
        Point::new(cx / (6.0 * area), cy / (6.0 * area))
    }

    pub fn contains(&self, p: Point) -> bool {
        ring_contains(&self.outer, p) && !self.holes.iter().any(|h| ring_contains(h, p))
    }

    /// All boundary segments, outer ring first.
    pub fn segments(&self) -> Vec<Segment> {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .filter(|ring| ring.len() >= 2)
            .flat_map(|ring| ring_segments(ring))
            .collect()
    }

    /// Closest boundary point (outer ring or holes) to `p`.
    pub fn nearest_point(&self, p: Point) -> Option<Point> {
        self.segments()
            .into_iter()
            .map(|s| s.nearest_point(p))
            .min_by(|a, b| a.distance_to(p).total_cmp(&b.distance_to(p)))
    }

    /// True if two edges of any ring cross. Rings traced from cells may
    /// revisit a corner, which is not a crossing.
    pub fn is_self_intersecting(&self) -> bool {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .any(|ring| {
                let segments: Vec<Segment> = ring_segments(ring).collect();
                let n = segments.len();
                (0..n).any(|i| {
                    ((i + 2)..n).any(|j| {
                        segments[i].crosses(&segments[j])
                    })
                })
            })
    }
}

/// Obstacle boundaries produced by the polygon extraction step.
#[derive(Clone, Debug, Default)]
pub struct ObstacleSet {
    pub polygons: Vec<Polygon>,
    /// Walk-resolution map of obstacle ids; 0 is walkable.
    pub labels: Grid<u32>,
}

/// One edge of the Voronoi diagram of free space.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct VoronoiEdge {
    pub a: Point,
    pub b: Point,
}

impl VoronoiEdge {
    pub fn new(a: Point, b: Point) -> Self {
        VoronoiEdge { a, b }
    }
}

/// Exact-predicate geometry supplied from outside the crate.
pub trait GeometryKernel {
    /// Obstacle boundary polygons and the per-cell obstacle label map. The
    /// default traces 8-connected unwalkable cell components.
    fn extract_obstacles(&self, walkability: &Grid<bool>) -> ObstacleSet {
        extract_obstacle_polygons(walkability)
    }

    /// Voronoi edges over the complement of the obstacles, in walk
    /// coordinates within a `width` x `height` map.
    fn voronoi_edges(&self, obstacles: &ObstacleSet, width: usize, height: usize)
        -> Vec<VoronoiEdge>;
}

/// Trace every unwalkable component of the map into a polygon.
pub fn extract_obstacle_polygons(walkability: &Grid<bool>) -> ObstacleSet {
    let (labels, count) = label_components(walkability, |walkable| !walkable);
    let mut traced = trace_polygons(&labels, |l| if l == 0 { None } else { Some(l) });

    let mut polygons = Vec::with_capacity(count as usize);
    for label in 1..=count {
        match traced.remove(&label) {
            Some(polygon) => polygons.push(polygon),
            None => warn!("Obstacle {} produced no boundary ring", label),
        }
    }

    ObstacleSet { polygons, labels }
}

/// Drop obstacle polygons that cannot be used as geometry.
pub fn retain_valid_polygons(polygons: Vec<Polygon>, min_area: f64) -> Vec<Polygon> {
    polygons
        .into_iter()
        .enumerate()
        .filter_map(|(index, polygon)| {
            let reason = if polygon.outer.len() < 3 {
                Some("fewer than 3 vertices")
            } else if polygon.area() <= 0.0 || polygon.area() < min_area {
                Some("degenerate area")
            } else if polygon.is_self_intersecting() {
                Some("self-intersecting")
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    warn!("Skipping obstacle polygon {}: {}", index, reason);
                    None
                }
                None => Some(polygon),
            }
        })
        .collect()
}

/// Outgoing cell-boundary edges keyed by start corner.
type EdgeMap = FnvHashMap<(i32, i32), Vec<(i32, i32)>>;

/// Trace the boundary of the cells selected by `member`. The ring with the
/// greatest area becomes the outer ring; negative rings inside it become
/// holes. Returns `None` if no cell matches.
pub fn trace_polygon<T, F>(grid: &Grid<T>, member: F) -> Option<Polygon>
where
    T: Copy,
    F: Fn(T) -> bool,
{
    trace_polygons(grid, |v| if member(v) { Some(()) } else { None }).remove(&())
}

/// Trace every cell set of the grid in a single scan. `key` names the set a
/// cell belongs to, or `None` for cells outside every set.
pub fn trace_polygons<T, K, F>(grid: &Grid<T>, key: F) -> FnvHashMap<K, Polygon>
where
    T: Copy,
    K: Copy + Eq + Hash,
    F: Fn(T) -> Option<K>,
{
    let key_at = |x: i32, y: i32| grid.try_get(x, y).and_then(&key);

    let mut edges: FnvHashMap<K, EdgeMap> = FnvHashMap::default();
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            let k = match key_at(x, y) {
                Some(k) => k,
                None => continue,
            };
            let outgoing = edges.entry(k).or_default();
            let mut push = |from: (i32, i32), to: (i32, i32)| {
                outgoing.entry(from).or_default().push(to);
            };
            if key_at(x, y - 1) != Some(k) {
                push((x, y), (x + 1, y));
            }
            if key_at(x + 1, y) != Some(k) {
                push((x + 1, y), (x + 1, y + 1));
            }
            if key_at(x, y + 1) != Some(k) {
                push((x + 1, y + 1), (x, y + 1));
            }
            if key_at(x - 1, y) != Some(k) {
                push((x, y + 1), (x, y));
            }
        }
    }

    edges
        .into_iter()
        .filter_map(|(k, outgoing)| polygon_from_rings(trace_rings(outgoing)).map(|p| (k, p)))
        .collect()
}

fn polygon_from_rings(rings: Vec<Ring>) -> Option<Polygon> {
    let (outer_index, _) = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| (i, ring_signed_area(ring)))
        .filter(|(_, area)| *area > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let mut polygon = Polygon::new(rings[outer_index].clone());
    for (i, ring) in rings.into_iter().enumerate() {
        if i == outer_index || ring_signed_area(&ring) >= 0.0 {
            continue;
        }
        // hole rings run along cell corners, test a point just inside one edge
        let mid = (ring[0] + ring[1]).scale(0.5);
        if ring_contains(&polygon.outer, mid) {
            polygon.holes.push(ring);
        }
    }

    Some(polygon)
}

/// Follow directed cell-boundary edges into closed rings.
fn trace_rings(mut outgoing: EdgeMap) -> Vec<Ring> {
    // start from corners with a single exit so saddles are only ever
    // passed through, never used to close a ring early
    let mut starts: Vec<(i32, i32)> = outgoing.keys().copied().collect();
    starts.sort_unstable_by_key(|&(x, y)| (outgoing[&(x, y)].len() > 1, y, x));

    let mut rings = Vec::new();
    for start in starts {
        while let Some(first) = outgoing.get_mut(&start).and_then(|v| v.pop()) {
            let mut corners = vec![start];
            let mut prev = start;
            let mut current = first;

            while current != start {
                corners.push(current);
                let incoming = (current.0 - prev.0, current.1 - prev.1);
                let choices = match outgoing.get_mut(&current) {
                    Some(choices) if !choices.is_empty() => choices,
                    _ => break,
                };
                // at a saddle corner, turn away from the interior so
                // diagonally touching cells stay in one ring
                let pick = if choices.len() == 1 {
                    0
                } else {
                    choices
                        .iter()
                        .position(|next| {
                            let out = (next.0 - current.0, next.1 - current.1);
                            incoming.0 * out.1 - incoming.1 * out.0 < 0
                        })
                        .unwrap_or(0)
                };
                let next = choices.swap_remove(pick);
                prev = current;
                current = next;
            }

            rings.push(simplify_ring(&corners));
        }
    }

    rings
}

/// Remove collinear corners from a rectilinear ring.
fn simplify_ring(corners: &[(i32, i32)]) -> Ring {
    let n = corners.len();
    (0..n)
        .filter(|&i| {
            let prev = corners[(i + n - 1) % n];
            let cur = corners[i];
            let next = corners[(i + 1) % n];
            let d1 = (cur.0 - prev.0, cur.1 - prev.1);
            let d2 = (next.0 - cur.0, next.1 - cur.1);
            d1.0 * d2.1 - d1.1 * d2.0 != 0
        })
        .map(|i| Point::new(corners[i].0 as f64, corners[i].1 as f64))
        .collect()
}

/// Map border as four segments, for clearance queries.
pub fn border_segments(width: usize, height: usize) -> [Segment; 4] {
    let w = width as f64;
    let h = height as f64;
    [
        Segment::new(Point::new(0.0, 0.0), Point::new(w, 0.0)),
        Segment::new(Point::new(w, 0.0), Point::new(w, h)),
        Segment::new(Point::new(w, h), Point::new(0.0, h)),
        Segment::new(Point::new(0.0, h), Point::new(0.0, 0.0)),
    ]
}

/// Walk cells crossed by a segment (Bresenham, 8-connected), extended by
/// `extend` cells past each end.
pub fn rasterize_segment(segment: &Segment, extend: f64) -> Vec<WalkPosition> {
    let (a, b) = match (segment.b - segment.a).normalized() {
        Some(dir) => (
            segment.a - dir.scale(extend),
            segment.b + dir.scale(extend),
        ),
        None => (segment.a, segment.b),
    };

    let start = a.to_walk();
    let end = b.to_walk();
    let dx = (end.x - start.x).abs();
    let dy = -(end.y - start.y).abs();
    let sx = if start.x < end.x { 1 } else { -1 };
    let sy = if start.y < end.y { 1 } else { -1 };
    let mut err = dx + dy;
    let mut x = start.x;
    let mut y = start.y;

    let mut cells = Vec::with_capacity((dx - dy) as usize + 1);
    loop {
        cells.push(WalkPosition::new(x, y));
        if x == end.x && y == end.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// Tile-resolution footprint rectangle in walk cells: `(min, max)` inclusive.
pub fn tile_rect_walk_cells(tile: TilePosition, width: i32, height: i32) -> (WalkPosition, WalkPosition) {
    let min = tile.to_walk();
    let max = min.offset(width * WALK_PER_TILE - 1, height * WALK_PER_TILE - 1);
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        Polygon::new(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    #[test]
    fn polygon_measures() {
        let p = square(0.0, 0.0, 4.0);
        assert_eq!(p.area(), 16.0);
        assert_eq!(p.perimeter(), 16.0);
        assert_eq!(p.centroid(), Point::new(2.0, 2.0));
        assert!(p.contains(Point::new(1.0, 1.0)));
        assert!(!p.contains(Point::new(5.0, 1.0)));
        assert_eq!(p.nearest_point(Point::new(2.0, -3.0)), Some(Point::new(2.0, 0.0)));
    }

    #[test]
    fn bowtie_is_self_intersecting() {
        let bowtie = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(2.0, 0.0),
            Point::new(0.0, 2.0),
        ]);
        assert!(bowtie.is_self_intersecting());
        assert!(!square(0.0, 0.0, 1.0).is_self_intersecting());
        assert!(retain_valid_polygons(vec![bowtie], 0.0).is_empty());
    }

    #[test]
    fn trace_block_gives_rectangle() {
        let mut grid = Grid::new(6, 6, false);
        grid.fill_rect(1, 2, 3, 4, true);
        let polygon = trace_polygon(&grid, |v| v).unwrap();
        assert_eq!(polygon.outer.len(), 4);
        assert_eq!(polygon.area(), 9.0);
        assert!(polygon.holes.is_empty());
    }

    #[test]
    fn trace_ring_gives_hole() {
        let mut grid = Grid::new(7, 7, false);
        grid.fill_rect(1, 1, 5, 5, true);
        grid.set(3, 3, false);
        let polygon = trace_polygon(&grid, |v| v).unwrap();
        assert_eq!(polygon.holes.len(), 1);
        assert_eq!(polygon.area(), 24.0);
        assert!(!polygon.contains(Point::new(3.5, 3.5)));
        assert!(polygon.contains(Point::new(1.5, 1.5)));
    }

    #[test]
    fn trace_keeps_diagonal_cells_together() {
        let mut grid = Grid::new(4, 4, false);
        grid.set(1, 1, true);
        grid.set(2, 2, true);
        let polygon = trace_polygon(&grid, |v| v).unwrap();
        assert_eq!(polygon.area(), 2.0);
    }

    #[test]
    fn one_scan_traces_every_label() {
        let mut grid = Grid::new(8, 4, 0u32);
        grid.fill_rect(0, 0, 1, 1, 1);
        grid.fill_rect(4, 0, 7, 3, 2);
        grid.set(5, 1, 0);
        let polygons = trace_polygons(&grid, |l| if l == 0 { None } else { Some(l) });
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[&1].area(), 4.0);
        assert_eq!(polygons[&2].area(), 15.0);
        assert_eq!(polygons[&2].holes.len(), 1);
    }

    #[test]
    fn many_specks_trace_quickly() {
        let mut walk = Grid::new(1024, 1024, true);
        for y in (8..1024).step_by(16) {
            for x in (8..1024).step_by(16) {
                walk.set(x, y, false);
            }
        }
        let start = std::time::Instant::now();
        let obstacles = extract_obstacle_polygons(&walk);
        assert_eq!(obstacles.polygons.len(), 4096);
        assert!(obstacles.polygons.iter().all(|p| p.area() == 1.0));
        assert!(start.elapsed().as_secs_f64() < 20.0);
    }

    #[test]
    fn extraction_labels_each_obstacle() {
        let mut walk = Grid::new(10, 10, true);
        walk.fill_rect(0, 0, 1, 1, false);
        walk.fill_rect(6, 6, 8, 8, false);
        let obstacles = extract_obstacle_polygons(&walk);
        assert_eq!(obstacles.polygons.len(), 2);
        assert_eq!(*obstacles.labels.get(0, 0), 1);
        assert_eq!(*obstacles.labels.get(7, 7), 2);
        assert_eq!(*obstacles.labels.get(4, 4), 0);
    }

    #[test]
    fn ray_hits_segment() {
        let wall = Segment::new(Point::new(-5.0, 3.0), Point::new(5.0, 3.0));
        let t = wall.ray_intersection(Point::new(0.0, 0.0), Point::new(0.0, 1.0));
        assert_eq!(t, Some(3.0));
        assert_eq!(wall.ray_intersection(Point::new(0.0, 0.0), Point::new(0.0, -1.0)), None);
    }

    #[test]
    fn rasterized_line_is_connected() {
        let cells = rasterize_segment(&Segment::new(Point::new(0.5, 0.5), Point::new(6.5, 3.5)), 0.0);
        assert_eq!(cells.first(), Some(&WalkPosition::new(0, 0)));
        assert_eq!(cells.last(), Some(&WalkPosition::new(6, 3)));
        for (a, b) in cells.iter().tuple_windows() {
            assert_eq!(a.chebyshev_distance(*b), 1);
        }
    }
}
