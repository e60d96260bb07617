/// Walk-resolution cells per tile, per axis.
pub const WALK_PER_TILE: i32 = 4;

/// Scaled cost of an axis-aligned step in a ground-distance expansion.
pub const STRAIGHT_COST: i32 = 10;
/// Scaled cost of a diagonal step (fixed-point approximation of 10 * sqrt(2)).
pub const DIAGONAL_COST: i32 = 14;
/// Sentinel stored in distance grids for cells never reached.
pub const UNREACHABLE: i32 = -1;

/// Resources closer than this (approximate tile distance) are neighbors
/// for clustering purposes.
pub const CLUSTER_NEIGHBOR_RADIUS: i32 = 6;
/// Minimum number of mineral fields required to make a cluster.
pub const MIN_RESOURCES: usize = 3;
/// Max radius (tiles) from a resource at which a depot tile still scores.
pub const INFLUENCE_RADIUS: i32 = 12;
/// Score multiplier applied to geysers.
pub const GEYSER_WEIGHT: i64 = 3;
/// Score multiplier applied to mineral fields.
pub const MINERAL_WEIGHT: i64 = 1;
/// A placed base within this approximate tile distance of a start hint is
/// a start location.
pub const START_LOCATION_THRESHOLD: i32 = 10;

/// Resource depot footprint, in tiles.
pub const DEPOT_WIDTH: i32 = 4;
pub const DEPOT_HEIGHT: i32 = 3;
/// Minimum tile gap kept between a depot and any resource footprint.
pub const RESOURCE_GAP: i32 = 3;

/// Mineral field footprint, in tiles.
pub const MINERAL_WIDTH: i32 = 2;
pub const MINERAL_HEIGHT: i32 = 1;
/// Geyser footprint, in tiles.
pub const GEYSER_WIDTH: i32 = 4;
pub const GEYSER_HEIGHT: i32 = 2;

/// Resources within this scaled ground distance of a depot footprint are
/// attached to its base location (10 tiles).
pub const ATTACH_MAX_DISTANCE: i32 = 4 * 10 * STRAIGHT_COST;

/// Obstacle polygons with a smaller area (walk cells) are discarded.
pub const MIN_OBSTACLE_AREA: f64 = 1.0;
/// Skeleton vertices closer than this to an obstacle are discarded.
pub const MIN_SKELETON_CLEARANCE: f64 = 1.0;
/// Leaf skeleton nodes below this clearance are always pruned.
pub const PRUNE_MIN_CLEARANCE: f64 = 2.0;
/// Absolute minimum depth (walk cells) of a clearance valley to count as a
/// chokepoint.
pub const CHOKE_MIN_DEPTH: f64 = 2.0;
/// Relative minimum depth of a clearance valley, as a fraction of the lower
/// neighboring peak.
pub const CHOKE_MIN_DEPTH_RATIO: f64 = 0.1;
/// Wall-side ray range, as a multiple of the chokepoint clearance.
pub const CHOKE_SIDE_RANGE_FACTOR: f64 = 2.0;

/// Bucket size (walk cells) of the obstacle segment index.
pub const SEGMENT_INDEX_CELL: f64 = 16.0;

/// Version byte written at the head of every cache blob.
pub const CACHE_FORMAT_VERSION: u8 = 2;
/// File extension used for cache blobs.
pub const CACHE_EXTENSION: &str = "terrain";
