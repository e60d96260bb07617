//! On-disk cache of finished analyses.
//!
//! A cache file is one format-version byte followed by a zlib stream of the
//! bincode-encoded [`Analysis`]. Files are named after the map hash.

use crate::constants::*;
use crate::error::*;
use crate::pipeline::Analysis;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Cache file for a map inside `dir`.
pub fn cache_path(dir: &Path, map_hash: &str) -> PathBuf {
    dir.join(format!("{}.{}", map_hash, CACHE_EXTENSION))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

pub fn save_analysis(path: &Path, analysis: &Analysis) -> Result<(), CacheError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&[CACHE_FORMAT_VERSION])
        .map_err(io_error(path))?;

    let mut encoder = ZlibEncoder::new(writer, Compression::default());
    bincode::serialize_into(&mut encoder, analysis)?;
    let mut writer = encoder.finish().map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Load a cached analysis, rejecting blobs of another format version or
/// for another map.
pub fn load_analysis(path: &Path, map_hash: &str) -> Result<Analysis, CacheError> {
    let file = File::open(path).map_err(io_error(path))?;
    let mut reader = BufReader::new(file);

    let mut version = [0u8; 1];
    match reader.read(&mut version).map_err(io_error(path))? {
        0 => return Err(CacheError::Empty),
        _ if version[0] != CACHE_FORMAT_VERSION => {
            return Err(CacheError::VersionMismatch {
                found: version[0],
                expected: CACHE_FORMAT_VERSION,
            })
        }
        _ => {}
    }

    let mut decoder = ZlibDecoder::new(reader);
    let analysis: Analysis = bincode::deserialize_from(&mut decoder)?;

    if analysis.map_hash != map_hash {
        return Err(CacheError::MapMismatch {
            found: analysis.map_hash,
            expected: map_hash.to_string(),
        });
    }

    Ok(analysis)
}
