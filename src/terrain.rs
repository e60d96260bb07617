use crate::constants::*;
use crate::error::*;
use crate::location::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A dense 2D array addressed by (x, y), row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid<T: Copy> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    pub fn new(width: usize, height: usize, initial: T) -> Self {
        Grid {
            width,
            height,
            data: vec![initial; width * height],
        }
    }

    /// Build a grid from row-major data. Returns `None` if the length does
    /// not match the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Grid {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        let index = y * self.width + x;
        &self.data[index]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let index = y * self.width + x;
        &mut self.data[index]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    /// Bounds-checked read with signed coordinates.
    #[inline]
    pub fn try_get(&self, x: i32, y: i32) -> Option<T> {
        if self.in_bounds(x, y) {
            Some(*self.get(x as usize, y as usize))
        } else {
            None
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
    }

    /// Set every cell of the inclusive rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, value: T) {
        let min_x = x1.max(0);
        let min_y = y1.max(0);
        let max_x = x2.min(self.width as i32 - 1);
        let max_y = y2.min(self.height as i32 - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                self.set(x as usize, y as usize, value);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(i, v)| {
            let x = i % width;
            let y = i / width;
            ((x, y), v)
        })
    }

    pub fn map<U: Copy, F: Fn(T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|v| f(*v)).collect(),
        }
    }
}

impl<T: Copy> Default for Grid<T> {
    fn default() -> Self {
        Grid {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl<T: Copy> std::ops::Index<WalkPosition> for Grid<T> {
    type Output = T;

    fn index(&self, pos: WalkPosition) -> &T {
        self.get(pos.x as usize, pos.y as usize)
    }
}

/// Neighbor offsets for 8-directional movement.
pub const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// Neighbor offsets for 4-directional (cardinal) movement.
pub const NEIGHBORS_4: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ResourceKind {
    Mineral,
    Geyser,
}

/// Static resource object read from the map provider.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct ResourceObject {
    pub kind: ResourceKind,
    /// Top-left tile of the footprint.
    pub position: TilePosition,
    pub width: i32,
    pub height: i32,
}

impl ResourceObject {
    pub fn mineral(x: i32, y: i32) -> Self {
        ResourceObject {
            kind: ResourceKind::Mineral,
            position: TilePosition::new(x, y),
            width: MINERAL_WIDTH,
            height: MINERAL_HEIGHT,
        }
    }

    pub fn geyser(x: i32, y: i32) -> Self {
        ResourceObject {
            kind: ResourceKind::Geyser,
            position: TilePosition::new(x, y),
            width: GEYSER_WIDTH,
            height: GEYSER_HEIGHT,
        }
    }

    #[inline]
    pub fn is_mineral(&self) -> bool {
        self.kind == ResourceKind::Mineral
    }

    /// Walk cell at the centre of the footprint.
    pub fn center_walk(&self) -> WalkPosition {
        self.position
            .to_walk()
            .offset(self.width * WALK_PER_TILE / 2, self.height * WALK_PER_TILE / 2)
    }
}

/// Trait for providing map data to the analysis.
pub trait MapDataSource {
    /// Terrain walkability at walk resolution.
    fn walkability(&self) -> &Grid<bool>;
    /// Buildability at tile resolution.
    fn buildability(&self) -> &Grid<bool>;
    fn resources(&self) -> &[ResourceObject];
    fn start_locations(&self) -> &[TilePosition];
    /// Stable identity of the map, used to key cached results.
    fn map_hash(&self) -> &str;
}

/// Owned map snapshot.
#[derive(Clone, Debug)]
pub struct MapData {
    pub walkability: Grid<bool>,
    pub buildability: Grid<bool>,
    pub resources: Vec<ResourceObject>,
    pub start_locations: Vec<TilePosition>,
    pub hash: String,
}

impl MapDataSource for MapData {
    fn walkability(&self) -> &Grid<bool> {
        &self.walkability
    }

    fn buildability(&self) -> &Grid<bool> {
        &self.buildability
    }

    fn resources(&self) -> &[ResourceObject] {
        &self.resources
    }

    fn start_locations(&self) -> &[TilePosition] {
        &self.start_locations
    }

    fn map_hash(&self) -> &str {
        &self.hash
    }
}

/// Check the grid-resolution contract of a map source.
pub fn validate_map(map: &dyn MapDataSource) -> Result<(), AnalysisError> {
    let walk = map.walkability();
    let build = map.buildability();

    if build.width() == 0 || build.height() == 0 {
        return Err(AnalysisError::EmptyMap);
    }

    let scale = WALK_PER_TILE as usize;
    if walk.width() != build.width() * scale || walk.height() != build.height() * scale {
        return Err(AnalysisError::DimensionMismatch {
            walk_width: walk.width(),
            walk_height: walk.height(),
            tile_width: build.width(),
            tile_height: build.height(),
        });
    }

    Ok(())
}

/// BFS flood-fill from a set of seed cells, writing each seed's label into
/// every reachable unlabeled cell. `passable` decides which cells may be
/// entered. Seeds are expanded in order, so ties go to the earlier seed.
pub fn flood_fill_labels<F>(
    labels: &mut Grid<Option<u32>>,
    seeds: &[(WalkPosition, u32)],
    neighbors: &[(i32, i32)],
    passable: F,
) where
    F: Fn(i32, i32) -> bool,
{
    let mut queue = VecDeque::new();

    for &(seed, label) in seeds {
        if labels.in_bounds(seed.x, seed.y) {
            labels.set(seed.x as usize, seed.y as usize, Some(label));
            queue.push_back((seed, label));
        }
    }

    while let Some((pos, label)) = queue.pop_front() {
        for &(dx, dy) in neighbors {
            let nx = pos.x + dx;
            let ny = pos.y + dy;
            if labels.try_get(nx, ny) == Some(None) && passable(nx, ny) {
                labels.set(nx as usize, ny as usize, Some(label));
                queue.push_back((WalkPosition::new(nx, ny), label));
            }
        }
    }
}

/// Label 8-connected components of cells matching `predicate`. Components
/// are numbered from 1 in scan order; non-matching cells get 0.
pub fn label_components<T, F>(grid: &Grid<T>, predicate: F) -> (Grid<u32>, u32)
where
    T: Copy,
    F: Fn(T) -> bool,
{
    let mut labels = Grid::new(grid.width(), grid.height(), 0u32);
    let mut next = 0u32;
    let mut queue = VecDeque::new();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if *labels.get(x, y) != 0 || !predicate(*grid.get(x, y)) {
                continue;
            }

            next += 1;
            labels.set(x, y, next);
            queue.push_back((x as i32, y as i32));

            while let Some((cx, cy)) = queue.pop_front() {
                for &(dx, dy) in &NEIGHBORS_8 {
                    let nx = cx + dx;
                    let ny = cy + dy;
                    if labels.try_get(nx, ny) == Some(0)
                        && predicate(*grid.get(nx as usize, ny as usize))
                    {
                        labels.set(nx as usize, ny as usize, next);
                        queue.push_back((nx, ny));
                    }
                }
            }
        }
    }

    (labels, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with(walk: (usize, usize), tile: (usize, usize)) -> MapData {
        MapData {
            walkability: Grid::new(walk.0, walk.1, true),
            buildability: Grid::new(tile.0, tile.1, true),
            resources: Vec::new(),
            start_locations: Vec::new(),
            hash: "test".to_string(),
        }
    }

    #[test]
    fn validate_accepts_exact_scale() {
        assert!(validate_map(&map_with((32, 16), (8, 4))).is_ok());
    }

    #[test]
    fn validate_rejects_mismatched_scale() {
        assert!(matches!(
            validate_map(&map_with((30, 16), (8, 4))),
            Err(AnalysisError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            validate_map(&map_with((0, 0), (0, 0))),
            Err(AnalysisError::EmptyMap)
        ));
    }

    #[test]
    fn fill_rect_is_clipped_and_inclusive() {
        let mut grid = Grid::new(4, 4, 0u8);
        grid.fill_rect(-2, 1, 1, 10, 7);
        assert_eq!(*grid.get(0, 1), 7);
        assert_eq!(*grid.get(1, 3), 7);
        assert_eq!(*grid.get(2, 1), 0);
        assert_eq!(*grid.get(0, 0), 0);
    }

    #[test]
    fn components_are_eight_connected() {
        let mut grid = Grid::new(4, 4, false);
        grid.set(0, 0, true);
        grid.set(1, 1, true);
        grid.set(3, 3, true);
        let (labels, count) = label_components(&grid, |v| v);
        assert_eq!(count, 2);
        assert_eq!(*labels.get(0, 0), *labels.get(1, 1));
        assert_ne!(*labels.get(0, 0), *labels.get(3, 3));
        assert_eq!(*labels.get(2, 2), 0);
    }

    #[test]
    fn flood_fill_respects_passable() {
        let mut labels = Grid::new(5, 1, None);
        flood_fill_labels(
            &mut labels,
            &[(WalkPosition::new(0, 0), 1), (WalkPosition::new(4, 0), 2)],
            &NEIGHBORS_4,
            |x, _| x != 2,
        );
        assert_eq!(*labels.get(1, 0), Some(1));
        assert_eq!(*labels.get(3, 0), Some(2));
        assert_eq!(*labels.get(2, 0), None);
    }

    #[test]
    fn resource_center() {
        assert_eq!(
            ResourceObject::mineral(1, 1).center_walk(),
            WalkPosition::new(8, 6)
        );
        assert_eq!(
            ResourceObject::geyser(0, 0).center_walk(),
            WalkPosition::new(8, 4)
        );
    }
}
