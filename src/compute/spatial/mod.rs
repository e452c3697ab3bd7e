pub mod rtree;

pub use rtree::{IndexEntry, IndexParams, SpatialIndex};
