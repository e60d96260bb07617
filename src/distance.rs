//! Ground-distance fields over the walk grid.
//!
//! Expansion is a Dijkstra with lazy deletion: a cell may sit in the heap
//! several times and stale entries are skipped when popped. Steps cost
//! [`STRAIGHT_COST`] or [`DIAGONAL_COST`]; only walkable cells are entered.
//! Every call owns its heap and output grid.

use crate::constants::*;
use crate::location::*;
use crate::terrain::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[inline]
fn step_cost(dx: i32, dy: i32) -> i32 {
    if dx != 0 && dy != 0 {
        DIAGONAL_COST
    } else {
        STRAIGHT_COST
    }
}

/// Multi-source expansion. Each seed carries a tag that is propagated to the
/// cells it reaches first. Returns the distance grid ([`UNREACHABLE`] where
/// never reached) and the tag grid. Cells beyond `max_distance`, if given,
/// are left unreached.
pub fn expand_from_seeds(
    walkable: &Grid<bool>,
    seeds: &[(WalkPosition, u32)],
    max_distance: Option<i32>,
) -> (Grid<i32>, Grid<Option<u32>>) {
    let mut distances = Grid::new(walkable.width(), walkable.height(), UNREACHABLE);
    let mut tags: Grid<Option<u32>> = Grid::new(walkable.width(), walkable.height(), None);
    let mut heap = BinaryHeap::new();

    for &(seed, tag) in seeds {
        // a solid seed could leave but never be entered
        if walkable.try_get(seed.x, seed.y) != Some(true) {
            continue;
        }
        let (x, y) = (seed.x as usize, seed.y as usize);
        if *distances.get(x, y) == 0 {
            continue;
        }
        distances.set(x, y, 0);
        tags.set(x, y, Some(tag));
        heap.push(Reverse((0, seed.x, seed.y)));
    }

    while let Some(Reverse((dist, x, y))) = heap.pop() {
        if dist > *distances.get(x as usize, y as usize) {
            continue;
        }

        let tag = *tags.get(x as usize, y as usize);
        for &(dx, dy) in &NEIGHBORS_8 {
            let nx = x + dx;
            let ny = y + dy;
            if walkable.try_get(nx, ny) != Some(true) {
                continue;
            }
            let next = dist + step_cost(dx, dy);
            if matches!(max_distance, Some(max) if next > max) {
                continue;
            }
            let current = *distances.get(nx as usize, ny as usize);
            if current == UNREACHABLE || next < current {
                distances.set(nx as usize, ny as usize, next);
                tags.set(nx as usize, ny as usize, tag);
                heap.push(Reverse((next, nx, ny)));
            }
        }
    }

    (distances, tags)
}

/// Single-source ground distance map.
pub fn ground_distance_map(walkable: &Grid<bool>, source: WalkPosition) -> Grid<i32> {
    expand_from_seeds(walkable, &[(source, 0)], None).0
}

/// Ground distance map seeded from every cell of a rectangular area,
/// bounded by `max_distance`.
pub fn area_distance_map(
    walkable: &Grid<bool>,
    min: WalkPosition,
    max: WalkPosition,
    max_distance: i32,
) -> Grid<i32> {
    let mut seeds = Vec::new();
    for y in min.y..=max.y {
        for x in min.x..=max.x {
            seeds.push((WalkPosition::new(x, y), 0));
        }
    }
    expand_from_seeds(walkable, &seeds, Some(max_distance)).0
}

/// Nearest walkable cell to `target` within a Chebyshev `radius`, preferring
/// the smallest ring and then scan order.
pub fn nearest_walkable(
    walkable: &Grid<bool>,
    target: WalkPosition,
    radius: i32,
) -> Option<WalkPosition> {
    for r in 0..=radius {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let pos = target.offset(dx, dy);
                if walkable.try_get(pos.x, pos.y) == Some(true) {
                    return Some(pos);
                }
            }
        }
    }
    None
}
