//! Error types for the spatial database.

use thiserror::Error;

/// Spatial database errors.
///
/// Only configuration and infrastructure failures surface as errors from a
/// query; per-candidate problems (cache misses, filter rejections) are absorbed
/// by the query pipeline.
#[derive(Error, Debug)]
pub enum SpatialError {
    /// Construction URI could not be parsed.
    #[error("Invalid database URI: {0}")]
    InvalidUri(String),

    /// A recognised URI option carried a value that could not be parsed.
    #[error("Invalid value for '{name}': {value}")]
    InvalidOption { name: String, value: String },

    /// No backend is registered for the URI scheme.
    #[error("Unknown spatial database scheme: {0}")]
    UnknownScheme(String),

    /// A backend is already registered for the URI scheme.
    #[error("Spatial database scheme already registered: {0}")]
    DuplicateScheme(String),

    /// A bounding box could not be turned into an index rectangle.
    #[error("Degenerate rectangle for {key}: {reason}")]
    DegenerateRect { key: String, reason: String },

    /// Invalid caller-supplied input (coordinates, flags).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A feature document is missing required properties.
    #[error("Invalid feature: {0}")]
    InvalidFeature(String),

    /// Geometry type that cannot satisfy point-in-polygon semantics.
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// A source file could not be read or decoded.
    #[error("Failed to index {path}: {source}")]
    Ingest {
        path: String,
        #[source]
        source: Box<SpatialError>,
    },

    /// The database has been closed.
    #[error("Database is closed")]
    DatabaseClosed,

    /// A candidate evaluation task failed to complete.
    #[error("Query worker failed: {0}")]
    WorkerFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),
}

impl From<geojson::Error> for SpatialError {
    fn from(err: geojson::Error) -> Self {
        Self::GeoJson(Box::new(err))
    }
}

impl From<url::ParseError> for SpatialError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUri(err.to_string())
    }
}

/// Result type for spatial database operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
