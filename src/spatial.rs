//! Uniform bucket grid over obstacle boundary segments.
//!
//! Every segment is stored in each bucket its bounding box overlaps, so a
//! query only has to look at the buckets around the query point. Nearest
//! queries grow outwards ring by ring and stop once no unvisited bucket can
//! hold anything closer than the best hit so far.

use crate::geometry::*;
use fnv::FnvHashSet;

pub struct SegmentIndex {
    segments: Vec<Segment>,
    buckets: Vec<Vec<u32>>,
    cols: usize,
    rows: usize,
    cell_size: f64,
}

impl SegmentIndex {
    /// Index the given segments over a `width` x `height` area.
    pub fn new(segments: Vec<Segment>, width: f64, height: f64, cell_size: f64) -> Self {
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((height / cell_size).ceil() as usize).max(1);
        let mut index = SegmentIndex {
            segments: Vec::new(),
            buckets: vec![Vec::new(); cols * rows],
            cols,
            rows,
            cell_size,
        };
        for segment in segments {
            index.insert(segment);
        }
        index
    }

    fn bucket_coord(&self, v: f64, limit: usize) -> usize {
        ((v / self.cell_size).floor().max(0.0) as usize).min(limit - 1)
    }

    fn insert(&mut self, segment: Segment) {
        let id = self.segments.len() as u32;
        let min_col = self.bucket_coord(segment.a.x.min(segment.b.x), self.cols);
        let max_col = self.bucket_coord(segment.a.x.max(segment.b.x), self.cols);
        let min_row = self.bucket_coord(segment.a.y.min(segment.b.y), self.rows);
        let max_row = self.bucket_coord(segment.a.y.max(segment.b.y), self.rows);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                self.buckets[row * self.cols + col].push(id);
            }
        }
        self.segments.push(segment);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Ids of segments stored in buckets overlapping the rectangle.
    fn candidates_in(&self, min: Point, max: Point) -> Vec<u32> {
        let min_col = self.bucket_coord(min.x, self.cols);
        let max_col = self.bucket_coord(max.x, self.cols);
        let min_row = self.bucket_coord(min.y, self.rows);
        let max_row = self.bucket_coord(max.y, self.rows);

        let mut seen = FnvHashSet::default();
        let mut ids = Vec::new();
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                for &id in &self.buckets[row * self.cols + col] {
                    if seen.insert(id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }

    /// Segments whose buckets overlap the disc of `radius` around `center`.
    pub fn segments_near(&self, center: Point, radius: f64) -> impl Iterator<Item = &Segment> {
        let offset = Point::new(radius, radius);
        self.candidates_in(center - offset, center + offset)
            .into_iter()
            .map(move |id| &self.segments[id as usize])
    }

    /// Closest point on any indexed segment, with its distance.
    pub fn nearest(&self, p: Point) -> Option<(Point, f64)> {
        if self.segments.is_empty() {
            return None;
        }

        let max_radius = (self.cols.max(self.rows) as f64 + 1.0) * self.cell_size;
        let mut radius = self.cell_size;
        loop {
            let best = self
                .segments_near(p, radius)
                .map(|s| {
                    let q = s.nearest_point(p);
                    (q, q.distance_to(p))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match best {
                // only trust a hit that lies inside the searched square
                Some(hit) if hit.1 <= radius => return Some(hit),
                Some(hit) if radius >= max_radius => return Some(hit),
                None if radius >= max_radius => return None,
                _ => radius *= 2.0,
            }
        }
    }

    /// Distance from `p` to the nearest indexed segment.
    pub fn nearest_distance(&self, p: Point) -> f64 {
        self.nearest(p).map(|(_, d)| d).unwrap_or(f64::INFINITY)
    }

    /// First segment hit by the ray `origin + t * dir` with `t <= max_t`.
    pub fn ray_cast(&self, origin: Point, dir: Point, max_t: f64) -> Option<(Point, f64)> {
        let end = origin + dir.scale(max_t);
        let min = Point::new(origin.x.min(end.x), origin.y.min(end.y));
        let max = Point::new(origin.x.max(end.x), origin.y.max(end.y));

        self.candidates_in(min, max)
            .into_iter()
            .filter_map(|id| {
                self.segments[id as usize]
                    .ray_intersection(origin, dir)
                    .filter(|t| *t <= max_t)
            })
            .min_by(|a, b| a.total_cmp(b))
            .map(|t| (origin + dir.scale(t), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor_index() -> SegmentIndex {
        SegmentIndex::new(
            vec![
                Segment::new(Point::new(0.0, 10.0), Point::new(100.0, 10.0)),
                Segment::new(Point::new(0.0, 20.0), Point::new(100.0, 20.0)),
            ],
            100.0,
            30.0,
            8.0,
        )
    }

    #[test]
    fn nearest_finds_closest_wall() {
        let index = corridor_index();
        let (point, dist) = index.nearest(Point::new(50.0, 13.0)).unwrap();
        assert_eq!(point, Point::new(50.0, 10.0));
        assert!((dist - 3.0).abs() < 1e-9);
    }

    #[test]
    fn nearest_searches_beyond_first_ring() {
        let index = SegmentIndex::new(
            vec![Segment::new(Point::new(90.0, 0.0), Point::new(90.0, 90.0))],
            100.0,
            100.0,
            4.0,
        );
        let dist = index.nearest_distance(Point::new(5.0, 50.0));
        assert!((dist - 85.0).abs() < 1e-9);
    }

    #[test]
    fn empty_index_has_infinite_distance() {
        let index = SegmentIndex::new(Vec::new(), 10.0, 10.0, 4.0);
        assert!(index.nearest_distance(Point::new(1.0, 1.0)).is_infinite());
    }

    #[test]
    fn ray_cast_respects_range() {
        let index = corridor_index();
        let up = Point::new(0.0, -1.0);
        let (hit, t) = index.ray_cast(Point::new(40.0, 15.0), up, 10.0).unwrap();
        assert_eq!(hit, Point::new(40.0, 10.0));
        assert!((t - 5.0).abs() < 1e-9);
        assert!(index.ray_cast(Point::new(40.0, 15.0), up, 4.0).is_none());
    }
}
