//! Loading features from GeoJSON documents on disk.
//!
//! | mode                | a path is                                        |
//! |---------------------|--------------------------------------------------|
//! | `geojson`           | one file holding one Feature                     |
//! | `featurecollection` | one file holding a FeatureCollection             |
//! | `directory`         | a tree walked recursively for `*.geojson` files  |
//!
//! Features without a Polygon or MultiPolygon geometry are skipped. Any other
//! read or decode failure stops ingestion and names the offending file.

use crate::compute::geojson::{decode_feature, parse_feature, parse_feature_collection};
use crate::db::{RTreeSpatialDatabase, SpatialDatabase};
use crate::error::{Result, SpatialError};
use crate::feature::Feature;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const GEOJSON_EXTENSION: &str = "geojson";

/// How the paths handed to ingestion are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    #[default]
    GeoJson,
    FeatureCollection,
    Directory,
}

impl FromStr for IndexMode {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "geojson" => Ok(Self::GeoJson),
            "featurecollection" => Ok(Self::FeatureCollection),
            "directory" | "repo" => Ok(Self::Directory),
            other => Err(SpatialError::InvalidInput(format!(
                "Invalid index mode '{}', expected geojson, featurecollection or directory",
                other
            ))),
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GeoJson => "geojson",
            Self::FeatureCollection => "featurecollection",
            Self::Directory => "directory",
        };
        f.write_str(label)
    }
}

/// Decode every indexable feature under `paths`.
pub fn read_features<P: AsRef<Path>>(mode: IndexMode, paths: &[P]) -> Result<Vec<Feature>> {
    let mut features = Vec::new();

    for path in paths {
        let path = path.as_ref();
        match mode {
            IndexMode::GeoJson => features.extend(read_feature_file(path)?),
            IndexMode::FeatureCollection => features.extend(read_collection_file(path)?),
            IndexMode::Directory => {
                for file in geojson_files(path)? {
                    features.extend(read_feature_file(&file)?);
                }
            }
        }
    }

    Ok(features)
}

/// Index every feature under `paths`. Returns how many were indexed.
pub fn index_paths<P: AsRef<Path>>(
    db: &RTreeSpatialDatabase,
    mode: IndexMode,
    paths: &[P],
) -> Result<usize> {
    let features = read_features(mode, paths)?;
    let count = features.len();

    for feature in features {
        db.index_feature(feature)?;
    }

    Ok(count)
}

/// Like [`index_paths`], for any backend.
pub async fn index_paths_into<P: AsRef<Path>>(
    db: &dyn SpatialDatabase,
    mode: IndexMode,
    paths: &[P],
) -> Result<usize> {
    let features = read_features(mode, paths)?;
    let count = features.len();

    for feature in features {
        db.index_feature(feature).await?;
    }

    Ok(count)
}

/// Every `*.geojson` file below `root`, sorted.
pub fn geojson_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|err| ingest_error(&dir, err.into()))?;

        for entry in entries {
            let path = entry.map_err(|err| ingest_error(&dir, err.into()))?.path();

            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(GEOJSON_EXTENSION))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn read_feature_file(path: &Path) -> Result<Option<Feature>> {
    let body = read(path)?;
    let feature = parse_feature(&body).map_err(|err| ingest_error(path, err))?;
    decode_or_skip(path, feature)
}

fn read_collection_file(path: &Path) -> Result<Vec<Feature>> {
    let body = read(path)?;
    let collection = parse_feature_collection(&body).map_err(|err| ingest_error(path, err))?;

    let mut features = Vec::with_capacity(collection.len());
    for feature in collection {
        features.extend(decode_or_skip(path, feature)?);
    }
    Ok(features)
}

fn decode_or_skip(path: &Path, feature: geojson::Feature) -> Result<Option<Feature>> {
    match decode_feature(feature) {
        Ok(feature) => Ok(Some(feature)),
        Err(SpatialError::UnsupportedGeometry(kind)) => {
            log::debug!("Skipping {} feature in {}", kind, path.display());
            Ok(None)
        }
        Err(err) => Err(ingest_error(path, err)),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| ingest_error(path, err.into()))
}

fn ingest_error(path: &Path, err: SpatialError) -> SpatialError {
    SpatialError::Ingest {
        path: path.display().to_string(),
        source: Box::new(err),
    }
}
