//! Distances, island status, owning region and attached resources of the
//! placed base locations.

use crate::constants::*;
use crate::distance::*;
use crate::geometry::*;
use crate::location::*;
use crate::pipeline::analysis::*;
use crate::terrain::*;
use log::*;

/// Walk cell a base measures ground distance from: the walkable cell of
/// the depot footprint closest to its centre. `None` if the whole footprint
/// is solid.
pub fn base_walk_position(walkability: &Grid<bool>, tile: TilePosition) -> Option<WalkPosition> {
    let center = tile
        .to_walk()
        .offset(DEPOT_WIDTH * WALK_PER_TILE / 2, DEPOT_HEIGHT * WALK_PER_TILE / 2);
    let (min, max) = tile_rect_walk_cells(tile, DEPOT_WIDTH, DEPOT_HEIGHT);

    (min.y..=max.y)
        .flat_map(|y| (min.x..=max.x).map(move |x| WalkPosition::new(x, y)))
        .filter(|pos| walkability.try_get(pos.x, pos.y) == Some(true))
        .min_by_key(|pos| {
            let (dx, dy) = (pos.x - center.x, pos.y - center.y);
            (dx * dx + dy * dy, pos.y, pos.x)
        })
}

/// Ground and air distances between every pair of bases, and the island
/// flag. Every base starts as an island and loses the flag as soon as one
/// expansion from it reaches another base.
pub fn compute_distances(bases: &mut [BaseLocation], walkability: &Grid<bool>) {
    let count = bases.len();
    for base in bases.iter_mut() {
        base.flags.insert(BaseFlags::ISLAND);
        base.ground_distances = vec![None; count];
        base.air_distances = vec![0.0; count];
    }

    for i in 0..count {
        let map = ground_distance_map(walkability, bases[i].walk_position);
        let mut reached_other = false;

        for j in 0..count {
            let target = bases[j].walk_position;
            let ground = match map.try_get(target.x, target.y) {
                Some(d) if d != UNREACHABLE => Some(d as f64 / (WALK_PER_TILE * STRAIGHT_COST) as f64),
                _ => None,
            };
            if i != j && ground.is_some() {
                reached_other = true;
            }
            let air = bases[i].tile_position.distance_to(bases[j].tile_position);
            bases[i].ground_distances[j] = ground;
            bases[i].air_distances[j] = air;
        }

        if reached_other {
            bases[i].flags.remove(BaseFlags::ISLAND);
        }
    }

    let islands = bases.iter().filter(|b| b.is_island()).count();
    debug!("Computed distances between {} bases, {} islands", count, islands);
}

/// Assign each base to the region under its walk position, falling back to
/// the nearest region, and record the back-reference on the region.
pub fn assign_regions(
    bases: &mut [BaseLocation],
    regions: &mut [Region],
    region_map: &Grid<Option<RegionId>>,
    nearest_region_map: &Grid<Option<RegionId>>,
) {
    for base in bases.iter_mut() {
        let pos = base.walk_position;
        let region = region_map
            .try_get(pos.x, pos.y)
            .flatten()
            .or_else(|| nearest_region_map.try_get(pos.x, pos.y).flatten());

        match region.and_then(|id| regions.get_mut(id.index())) {
            Some(owner) => {
                owner.base_locations.push(base.id);
                base.region = Some(owner.id);
            }
            None => warn!("Base location {:?} at {:?} has no region", base.id, base.tile_position),
        }
    }
}

/// True if the expansion reached the resource's centre, or any cell of the
/// ring just outside its footprint when the centre is solid.
fn resource_reached(distances: &Grid<i32>, resource: &ResourceObject) -> bool {
    let center = resource.center_walk();
    if matches!(distances.try_get(center.x, center.y), Some(d) if d != UNREACHABLE) {
        return true;
    }

    let (min, max) = tile_rect_walk_cells(resource.position, resource.width, resource.height);
    let (min, max) = (min.offset(-1, -1), max.offset(1, 1));
    (min.x..=max.x)
        .flat_map(|x| (min.y..=max.y).map(move |y| (x, y)))
        .filter(|(x, y)| *x == min.x || *x == max.x || *y == min.y || *y == max.y)
        .any(|(x, y)| matches!(distances.try_get(x, y), Some(d) if d != UNREACHABLE))
}

/// Attach every resource within ground `max_distance` of a depot footprint
/// to its base, on top of the base's own cluster.
pub fn attach_resources(
    bases: &mut [BaseLocation],
    resources: &[ResourceObject],
    walkability: &Grid<bool>,
    max_distance: i32,
) {
    for base in bases.iter_mut() {
        let (min, max) = tile_rect_walk_cells(base.tile_position, DEPOT_WIDTH, DEPOT_HEIGHT);
        let distances = area_distance_map(walkability, min, max, max_distance);

        let mut attached = base.cluster.clone();
        for (index, resource) in resources.iter().enumerate() {
            if resource_reached(&distances, resource) {
                attached.push(ResourceId(index as u32));
            }
        }
        attached.sort_unstable();
        attached.dedup();

        trace!(
            "Base {:?} attached {} resources ({} from its cluster)",
            base.id,
            attached.len(),
            base.cluster.len()
        );
        base.resources = attached;
    }
}
