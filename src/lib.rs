pub mod constants;
pub mod error;
pub mod location;
pub mod terrain;
pub mod geometry;
pub mod spatial;
pub mod graph;
pub mod distance;
pub mod stages;
pub mod pipeline;
pub mod cache;

pub mod analyzer;
pub use analyzer::*;

pub use error::*;
pub use geometry::{GeometryKernel, ObstacleSet, Point, Polygon, Segment, VoronoiEdge};
pub use location::*;
pub use pipeline::{run_analysis, Analysis, AnalysisConfig};
pub use terrain::{Grid, MapData, MapDataSource, ResourceKind, ResourceObject};
