//! The finished analysis: regions, chokepoints and base locations plus the
//! lookup grids that answer spatial queries about them.
//!
//! Entities live in arena vectors and refer to each other by id, so the
//! whole result can be serialized as-is and shared read-only once built.

use crate::constants::*;
use crate::geometry::*;
use crate::location::*;
use crate::terrain::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Index into [`Analysis::regions`].
    RegionId
);
arena_id!(
    /// Index into [`Analysis::chokepoints`].
    ChokepointId
);
arena_id!(
    /// Index into [`Analysis::base_locations`].
    BaseLocationId
);
arena_id!(
    /// Index into [`Analysis::resources`].
    ResourceId
);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Outline in walk coordinates.
    pub polygon: Polygon,
    pub center: Point,
    /// Clearance of the skeleton node the region grew from; 0 for regions
    /// found only by the cell sweep.
    pub clearance: f64,
    pub chokepoints: Vec<ChokepointId>,
    pub base_locations: Vec<BaseLocationId>,
}

impl Region {
    /// Walkable area in walk cells.
    pub fn area(&self) -> f64 {
        self.polygon.area()
    }

    /// Regions directly reachable through one of this region's chokepoints.
    pub fn neighbors<'a>(&'a self, analysis: &'a Analysis) -> impl Iterator<Item = RegionId> + 'a {
        self.chokepoints
            .iter()
            .filter_map(move |id| analysis.chokepoint(*id))
            .map(move |choke| choke.other_region(self.id))
    }
}

/// A narrow passage between two regions. The passage is represented by its
/// two `sides` only; the cells of the strip belong to the adjacent regions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chokepoint {
    pub id: ChokepointId,
    /// Wall anchors on either side; `None` when the passage has an open side.
    pub sides: Option<(Point, Point)>,
    pub center: Point,
    pub regions: (RegionId, RegionId),
    /// Distance between the sides, or twice the clearance without sides.
    pub width: f64,
}

impl Chokepoint {
    pub fn connects(&self, region: RegionId) -> bool {
        self.regions.0 == region || self.regions.1 == region
    }

    /// The region on the far side from `region`.
    pub fn other_region(&self, region: RegionId) -> RegionId {
        if self.regions.0 == region {
            self.regions.1
        } else {
            self.regions.0
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct BaseFlags: u8 {
        const START_LOCATION = 1;
        const ISLAND = 2;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseLocation {
    pub id: BaseLocationId,
    /// Top-left tile of the depot footprint.
    pub tile_position: TilePosition,
    /// Walk cell used as the source of ground distances.
    pub walk_position: WalkPosition,
    pub region: Option<RegionId>,
    /// Resources of the cluster the depot was scored for.
    pub cluster: Vec<ResourceId>,
    /// Cluster plus every resource within gathering distance.
    pub resources: Vec<ResourceId>,
    /// Winning placement score.
    pub score: i64,
    pub flags: BaseFlags,
    /// Ground distance in tiles to every base location, by id.
    pub ground_distances: Vec<Option<f64>>,
    /// Straight-line distance in tiles to every base location, by id.
    pub air_distances: Vec<f64>,
}

impl BaseLocation {
    pub fn is_start_location(&self) -> bool {
        self.flags.contains(BaseFlags::START_LOCATION)
    }

    pub fn is_island(&self) -> bool {
        self.flags.contains(BaseFlags::ISLAND)
    }

    pub fn ground_distance(&self, other: BaseLocationId) -> Option<f64> {
        self.ground_distances.get(other.index()).copied().flatten()
    }

    pub fn air_distance(&self, other: BaseLocationId) -> Option<f64> {
        self.air_distances.get(other.index()).copied()
    }

    /// Centre of the depot footprint in walk coordinates.
    pub fn center(&self) -> Point {
        let walk = self.tile_position.to_walk();
        Point::new(
            (walk.x + DEPOT_WIDTH * WALK_PER_TILE / 2) as f64,
            (walk.y + DEPOT_HEIGHT * WALK_PER_TILE / 2) as f64,
        )
    }
}

/// Complete terrain model of one map.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Analysis {
    pub map_hash: String,
    pub regions: Vec<Region>,
    pub chokepoints: Vec<Chokepoint>,
    pub base_locations: Vec<BaseLocation>,
    pub resources: Vec<ResourceObject>,
    /// Obstacle outlines the skeleton was built from.
    pub obstacles: Vec<Polygon>,
    /// Owning region of every walkable walk cell.
    pub region_map: Grid<Option<RegionId>>,
    /// Nearest region for every walk cell, walkable or not.
    pub nearest_region_map: Grid<Option<RegionId>>,
    /// Nearest chokepoint by ground distance; `None` where unreachable.
    pub nearest_chokepoint_map: Grid<Option<ChokepointId>>,
    /// Nearest base location by ground distance; `None` where unreachable.
    pub nearest_base_map: Grid<Option<BaseLocationId>>,
    /// 8-connected walkable component per walk cell; 0 is unwalkable.
    pub components: Grid<u32>,
}

impl Analysis {
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    pub fn chokepoint(&self, id: ChokepointId) -> Option<&Chokepoint> {
        self.chokepoints.get(id.index())
    }

    pub fn base_location(&self, id: BaseLocationId) -> Option<&BaseLocation> {
        self.base_locations.get(id.index())
    }

    pub fn resource(&self, id: ResourceId) -> Option<&ResourceObject> {
        self.resources.get(id.index())
    }

    /// Region owning a walk cell; `None` for unwalkable cells.
    pub fn region_at(&self, pos: WalkPosition) -> Option<&Region> {
        let id = self.region_map.try_get(pos.x, pos.y).flatten()?;
        self.region(id)
    }

    pub fn nearest_region(&self, pos: WalkPosition) -> Option<&Region> {
        let id = self.nearest_region_map.try_get(pos.x, pos.y).flatten()?;
        self.region(id)
    }

    pub fn nearest_chokepoint(&self, pos: WalkPosition) -> Option<&Chokepoint> {
        let id = self.nearest_chokepoint_map.try_get(pos.x, pos.y).flatten()?;
        self.chokepoint(id)
    }

    pub fn nearest_base_location(&self, pos: WalkPosition) -> Option<&BaseLocation> {
        let id = self.nearest_base_map.try_get(pos.x, pos.y).flatten()?;
        self.base_location(id)
    }

    pub fn start_locations(&self) -> impl Iterator<Item = &BaseLocation> {
        self.base_locations.iter().filter(|b| b.is_start_location())
    }

    pub fn ground_distance(&self, from: BaseLocationId, to: BaseLocationId) -> Option<f64> {
        self.base_location(from)?.ground_distance(to)
    }

    pub fn air_distance(&self, from: BaseLocationId, to: BaseLocationId) -> Option<f64> {
        self.base_location(from)?.air_distance(to)
    }

    /// Walkable component of a tile: the first walkable walk cell in it.
    fn tile_component(&self, tile: TilePosition) -> Option<u32> {
        let origin = tile.to_walk();
        (0..WALK_PER_TILE)
            .flat_map(|dy| (0..WALK_PER_TILE).map(move |dx| (dx, dy)))
            .filter_map(|(dx, dy)| self.components.try_get(origin.x + dx, origin.y + dy))
            .find(|c| *c != 0)
    }

    /// True if a ground unit could walk between the two tiles.
    pub fn is_connected(&self, a: TilePosition, b: TilePosition) -> bool {
        match (self.tile_component(a), self.tile_component(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }
}
