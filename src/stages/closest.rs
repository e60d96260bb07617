//! Walk-resolution lookup grids: nearest region, chokepoint and base for
//! every cell, plus walkable connectivity.

use crate::distance::*;
use crate::location::*;
use crate::pipeline::analysis::*;
use crate::terrain::*;

/// Nearest region of every cell, walls included, by spreading the region
/// map outwards in breadth-first order.
pub fn nearest_region_map(region_map: &Grid<Option<RegionId>>) -> Grid<Option<RegionId>> {
    let seeds: Vec<(WalkPosition, u32)> = region_map
        .iter()
        .filter_map(|((x, y), region)| region.map(|r| (WalkPosition::new(x as i32, y as i32), r.0)))
        .collect();
    let mut labels = Grid::new(region_map.width(), region_map.height(), None);
    flood_fill_labels(&mut labels, &seeds, &NEIGHBORS_8, |_, _| true);
    labels.map(|l| l.map(RegionId))
}

/// Nearest object by ground distance from a set of walk positions. Cells
/// no object can reach are `None`.
fn nearest_by_ground<I: Copy>(
    walkability: &Grid<bool>,
    sources: &[(WalkPosition, u32)],
    wrap: fn(u32) -> I,
) -> Grid<Option<I>> {
    let (_, tags) = expand_from_seeds(walkability, sources, None);
    tags.map(|t| t.map(wrap))
}

pub fn nearest_chokepoint_map(walkability: &Grid<bool>, chokepoints: &[Chokepoint]) -> Grid<Option<ChokepointId>> {
    let sources: Vec<(WalkPosition, u32)> = chokepoints
        .iter()
        .filter_map(|c| {
            let cell = c.center.to_walk();
            nearest_walkable(walkability, cell, 4).map(|pos| (pos, c.id.0))
        })
        .collect();
    nearest_by_ground(walkability, &sources, ChokepointId)
}

pub fn nearest_base_map(walkability: &Grid<bool>, bases: &[BaseLocation]) -> Grid<Option<BaseLocationId>> {
    let sources: Vec<(WalkPosition, u32)> = bases.iter().map(|b| (b.walk_position, b.id.0)).collect();
    nearest_by_ground(walkability, &sources, BaseLocationId)
}

/// 8-connected walkable components, numbered from 1; 0 is unwalkable.
pub fn connectivity_map(walkability: &Grid<bool>) -> Grid<u32> {
    label_components(walkability, |w| w).0
}
