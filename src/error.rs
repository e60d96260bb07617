use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Input-contract violations that prevent an analysis from starting.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("map has no tiles")]
    EmptyMap,
    #[error(
        "walk grid {walk_width}x{walk_height} is not 4x the tile grid {tile_width}x{tile_height}"
    )]
    DimensionMismatch {
        walk_width: usize,
        walk_height: usize,
        tile_width: usize,
        tile_height: usize,
    },
}

/// Reasons a cached analysis could not be used. None of these are fatal:
/// the analyzer recomputes from scratch.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to access cache file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache file is empty")]
    Empty,
    #[error("cache format version {found} does not match {expected}")]
    VersionMismatch { found: u8, expected: u8 },
    #[error("cache blob could not be serialized: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("cached analysis is for map {found:?}, expected {expected:?}")]
    MapMismatch { found: String, expected: String },
}
