//! Public API for terrain analysis.
//!
//! The `AnalyzerBuilder` provides a fluent, append-only API for configuring
//! the analysis. The resulting `Analyzer` runs the pipeline, consults the
//! on-disk cache when one is configured, and keeps the most recent result
//! behind an `Arc` so readers can hold on to it while a new one is built.

use crate::cache::*;
use crate::error::*;
use crate::geometry::GeometryKernel;
use crate::pipeline::{run_analysis, Analysis, AnalysisConfig};
use crate::terrain::MapDataSource;
use log::*;
use std::path::PathBuf;
use std::sync::Arc;

// Re-export key types for convenience
pub use crate::pipeline::analysis::{
    BaseFlags, BaseLocation, BaseLocationId, Chokepoint, ChokepointId, Region, RegionId, ResourceId,
};

/// Append-only builder for configuring an analyzer.
pub struct AnalyzerBuilder {
    kernel: Box<dyn GeometryKernel>,
    config: AnalysisConfig,
    cache_dir: Option<PathBuf>,
}

impl AnalyzerBuilder {
    /// Start with default thresholds and no cache.
    pub fn new(kernel: Box<dyn GeometryKernel>) -> Self {
        AnalyzerBuilder {
            kernel,
            config: AnalysisConfig::default(),
            cache_dir: None,
        }
    }

    /// Replace every threshold at once.
    pub fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Directory for cached results (default: no caching).
    pub fn cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Resource clustering neighbor radius in tiles (default: 6).
    pub fn cluster_radius(mut self, radius: i32) -> Self {
        self.config.cluster_radius = radius;
        self
    }

    /// Mineral fields needed for a base location (default: 3).
    pub fn min_resources(mut self, count: usize) -> Self {
        self.config.min_resources = count;
        self
    }

    /// Depot placement influence radius in tiles (default: 12).
    pub fn influence_radius(mut self, radius: i32) -> Self {
        self.config.influence_radius = radius;
        self
    }

    /// Placement weight of geysers relative to minerals (default: 3).
    pub fn geyser_weight(mut self, weight: i64) -> Self {
        self.config.geyser_weight = weight;
        self
    }

    /// Distance within which a base matches a start position (default: 10).
    pub fn start_location_threshold(mut self, threshold: i32) -> Self {
        self.config.start_location_threshold = threshold;
        self
    }

    /// Minimum clearance valley depth for a chokepoint (default: 2 walk cells).
    pub fn choke_min_depth(mut self, depth: f64) -> Self {
        self.config.choke_min_depth = depth;
        self
    }

    pub fn build(self) -> Analyzer {
        Analyzer {
            kernel: self.kernel,
            config: self.config,
            cache_dir: self.cache_dir,
            current: None,
        }
    }
}

pub struct Analyzer {
    kernel: Box<dyn GeometryKernel>,
    config: AnalysisConfig,
    cache_dir: Option<PathBuf>,
    current: Option<Arc<Analysis>>,
}

impl Analyzer {
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The last completed analysis, if any.
    pub fn current(&self) -> Option<Arc<Analysis>> {
        self.current.clone()
    }

    fn load_cached(&self, map: &dyn MapDataSource) -> Option<Analysis> {
        let dir = self.cache_dir.as_ref()?;
        let path = cache_path(dir, map.map_hash());
        match load_analysis(&path, map.map_hash()) {
            Ok(analysis) => {
                info!("Loaded terrain analysis from {:?}", path);
                Some(analysis)
            }
            Err(CacheError::Io { .. }) if !path.exists() => {
                debug!("No cached terrain analysis at {:?}", path);
                None
            }
            Err(err) => {
                warn!("Ignoring cached terrain analysis: {}", err);
                None
            }
        }
    }

    fn store_cached(&self, analysis: &Analysis) {
        let dir = match &self.cache_dir {
            Some(dir) => dir,
            None => return,
        };
        let path = cache_path(dir, &analysis.map_hash);
        if let Err(err) = save_analysis(&path, analysis) {
            warn!("Failed to write terrain analysis cache: {}", err);
        }
    }

    /// Analyze a map, reusing a cached result when a valid one exists. The
    /// current result is only replaced once the new one is complete.
    pub fn analyze(&mut self, map: &dyn MapDataSource) -> Result<Arc<Analysis>, AnalysisError> {
        let analysis = match self.load_cached(map) {
            Some(analysis) => analysis,
            None => {
                let analysis = run_analysis(map, self.kernel.as_ref(), &self.config)?;
                self.store_cached(&analysis);
                analysis
            }
        };

        let analysis = Arc::new(analysis);
        self.current = Some(analysis.clone());
        Ok(analysis)
    }

    /// Analyze a map from scratch, ignoring and then refreshing the cache.
    pub fn reanalyze(&mut self, map: &dyn MapDataSource) -> Result<Arc<Analysis>, AnalysisError> {
        let analysis = Arc::new(run_analysis(map, self.kernel.as_ref(), &self.config)?);
        self.store_cached(&analysis);
        self.current = Some(analysis.clone());
        Ok(analysis)
    }
}

/// Run a one-off analysis with default settings and no cache.
pub fn analyze_map(map: &dyn MapDataSource, kernel: Box<dyn GeometryKernel>) -> Result<Arc<Analysis>, AnalysisError> {
    AnalyzerBuilder::new(kernel).build().analyze(map)
}
