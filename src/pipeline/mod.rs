//! Runs the analysis stages in order and assembles the result.
//!
//! Everything is built into a fresh [`Analysis`] that is only handed back
//! once every stage has finished; nothing is published part way through.

pub mod analysis;

pub use analysis::*;

use crate::constants::*;
use crate::error::*;
use crate::geometry::*;
use crate::graph::*;
use crate::location::*;
use crate::stages::choke_sides::*;
use crate::stages::classify::*;
use crate::stages::closest::*;
use crate::stages::clustering::*;
use crate::stages::merge::*;
use crate::stages::placement::*;
use crate::stages::properties::*;
use crate::stages::prune::*;
use crate::stages::regions::*;
use crate::stages::simplify::*;
use crate::stages::skeleton::*;
use crate::terrain::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tunable thresholds. Defaults come from [`crate::constants`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Obstacle polygons smaller than this (walk cells) are ignored.
    pub min_obstacle_area: f64,
    /// Skeleton points closer than this to a wall are discarded.
    pub min_skeleton_clearance: f64,
    /// Leaves narrower than this are always pruned.
    pub prune_min_clearance: f64,
    /// Minimum absolute depth of a clearance valley to form a chokepoint.
    pub choke_min_depth: f64,
    /// Minimum depth of a valley relative to its lower peak.
    pub choke_min_depth_ratio: f64,
    /// Wall-side search range as a multiple of chokepoint clearance.
    pub choke_side_range_factor: f64,
    /// Neighbor radius for resource clustering, in tiles.
    pub cluster_radius: i32,
    /// Mineral fields needed around a core point, and in a cluster.
    pub min_resources: usize,
    /// Reach of a resource's placement influence, in tiles.
    pub influence_radius: i32,
    pub mineral_weight: i64,
    pub geyser_weight: i64,
    /// Approximate tile distance for matching a start position hint.
    pub start_location_threshold: i32,
    /// Scaled ground distance within which resources attach to a base.
    pub attach_max_distance: i32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            min_obstacle_area: MIN_OBSTACLE_AREA,
            min_skeleton_clearance: MIN_SKELETON_CLEARANCE,
            prune_min_clearance: PRUNE_MIN_CLEARANCE,
            choke_min_depth: CHOKE_MIN_DEPTH,
            choke_min_depth_ratio: CHOKE_MIN_DEPTH_RATIO,
            choke_side_range_factor: CHOKE_SIDE_RANGE_FACTOR,
            cluster_radius: CLUSTER_NEIGHBOR_RADIUS,
            min_resources: MIN_RESOURCES,
            influence_radius: INFLUENCE_RADIUS,
            mineral_weight: MINERAL_WEIGHT,
            geyser_weight: GEYSER_WEIGHT,
            start_location_threshold: START_LOCATION_THRESHOLD,
            attach_max_distance: ATTACH_MAX_DISTANCE,
        }
    }
}

/// Regions and chokepoints of a map.
struct Topology {
    obstacles: Vec<Polygon>,
    layout: RegionLayout,
}

fn analyze_topology(walkability: &Grid<bool>, kernel: &dyn GeometryKernel, config: &AnalysisConfig) -> Topology {
    let width = walkability.width();
    let height = walkability.height();

    let timer = Instant::now();
    let mut obstacles = kernel.extract_obstacles(walkability);
    obstacles.polygons = retain_valid_polygons(obstacles.polygons, config.min_obstacle_area);
    info!(
        "Extracted {} obstacle polygons in {:.3}s",
        obstacles.polygons.len(),
        timer.elapsed().as_secs_f64()
    );

    let timer = Instant::now();
    let index = build_segment_index(&obstacles.polygons, width, height);
    let edges = kernel.voronoi_edges(&obstacles, width, height);
    let graph = build_skeleton(&edges, &obstacles, &index, config.min_skeleton_clearance);
    info!(
        "Built skeleton with {} nodes from {} voronoi edges in {:.3}s",
        graph.node_count(),
        edges.len(),
        timer.elapsed().as_secs_f64()
    );

    let timer = Instant::now();
    let graph = prune_graph(graph, config.prune_min_clearance);
    let graph = simplify_graph(graph);
    let graph = classify_graph(graph, config);
    let graph = merge_regions(graph, config);
    info!(
        "Reduced region graph to {} regions and {} chokepoints in {:.3}s",
        graph.nodes_of_kind(NodeKind::Region).count(),
        graph.nodes_of_kind(NodeKind::Chokepoint).count(),
        timer.elapsed().as_secs_f64()
    );

    let timer = Instant::now();
    let sides = find_choke_sides(&graph, &index, config);
    let layout = build_regions(&graph, &sides, walkability);
    info!(
        "Built {} region polygons and {} chokepoints in {:.3}s",
        layout.regions.len(),
        layout.chokepoints.len(),
        timer.elapsed().as_secs_f64()
    );

    Topology {
        obstacles: obstacles.polygons,
        layout,
    }
}

fn place_base_locations(map: &dyn MapDataSource, config: &AnalysisConfig) -> Vec<BaseLocation> {
    let resources = map.resources();

    let timer = Instant::now();
    let clusters = cluster_resources(resources, config.cluster_radius, config.min_resources);
    let build_map = base_build_map(map.buildability(), resources);

    let mut bases: Vec<BaseLocation> = Vec::new();
    for cluster in clusters {
        let members: Vec<&ResourceObject> = cluster.iter().map(|i| &resources[*i]).collect();
        let (tile, score) = match place_cluster(&build_map, &members, config) {
            Some(placement) => placement,
            None => {
                warn!(
                    "No depot placement for cluster of {} resources at {:?}",
                    members.len(),
                    members.first().map(|r| r.position)
                );
                continue;
            }
        };
        let walk_position = match base_walk_position(map.walkability(), tile) {
            Some(pos) => pos,
            None => {
                warn!("Depot footprint at {:?} has no walkable cell, skipping", tile);
                continue;
            }
        };

        bases.push(BaseLocation {
            id: BaseLocationId(bases.len() as u32),
            tile_position: tile,
            walk_position,
            region: None,
            cluster: cluster.iter().map(|i| ResourceId(*i as u32)).collect(),
            resources: Vec::new(),
            score,
            flags: BaseFlags::empty(),
            ground_distances: Vec::new(),
            air_distances: Vec::new(),
        });
    }

    let tiles: Vec<TilePosition> = bases.iter().map(|b| b.tile_position).collect();
    let starts = match_start_locations(&tiles, map.start_locations(), config.start_location_threshold);
    for (base, is_start) in bases.iter_mut().zip(starts) {
        if is_start {
            base.flags.insert(BaseFlags::START_LOCATION);
        }
    }

    info!(
        "Placed {} base locations in {:.3}s",
        bases.len(),
        timer.elapsed().as_secs_f64()
    );
    bases
}

/// Run the full analysis of one map.
pub fn run_analysis(
    map: &dyn MapDataSource,
    kernel: &dyn GeometryKernel,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    validate_map(map)?;
    let total = Instant::now();
    let walkability = map.walkability();

    let Topology {
        obstacles,
        layout:
            RegionLayout {
                mut regions,
                chokepoints,
                region_map,
            },
    } = analyze_topology(walkability, kernel, config);

    let mut bases = place_base_locations(map, config);

    let timer = Instant::now();
    let nearest_region = nearest_region_map(&region_map);
    compute_distances(&mut bases, walkability);
    assign_regions(&mut bases, &mut regions, &region_map, &nearest_region);
    attach_resources(&mut bases, map.resources(), walkability, config.attach_max_distance);
    info!(
        "Computed base location properties in {:.3}s",
        timer.elapsed().as_secs_f64()
    );

    let timer = Instant::now();
    let nearest_chokepoint = nearest_chokepoint_map(walkability, &chokepoints);
    let nearest_base = nearest_base_map(walkability, &bases);
    let components = connectivity_map(walkability);
    info!(
        "Computed closest object maps in {:.3}s",
        timer.elapsed().as_secs_f64()
    );

    info!(
        "Terrain analysis of {} finished in {:.3}s",
        map.map_hash(),
        total.elapsed().as_secs_f64()
    );

    Ok(Analysis {
        map_hash: map.map_hash().to_string(),
        regions,
        chokepoints,
        base_locations: bases,
        resources: map.resources().to_vec(),
        obstacles,
        region_map,
        nearest_region_map: nearest_region,
        nearest_chokepoint_map: nearest_chokepoint,
        nearest_base_map: nearest_base,
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_match_constants() {
        let config = AnalysisConfig::default();
        assert_eq!(config.cluster_radius, 6);
        assert_eq!(config.min_resources, 3);
        assert_eq!(config.influence_radius, 12);
        assert_eq!(config.geyser_weight, 3);
        assert_eq!(config.start_location_threshold, 10);
    }
}
