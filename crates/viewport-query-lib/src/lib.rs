//! Viewport Query Library - Visible Feature Queries over Resident Vector Tiles
//!
//! This library answers "which features are on screen right now?" for a tiled vector-geometry
//! renderer. Given the tiles currently held in memory and the camera frustum, it returns every
//! visible feature exactly once (even when a feature is split across several tiles), together
//! with optional numeric aggregations over feature properties.
//!
//! # Architecture
//!
//! - **[`TileTransform`]**: Affine transform from tile-local space to world-pixel space
//! - **[`Frustum`]**: Six half-spaces bounding the visible volume
//! - **[`visibility`]**: Vertex-sampling visibility test of a geometry against a frustum
//! - **[`FeatureDeduplicator`]**: First-tile-wins merge of per-tile visible features
//! - **[`aggregation`]**: count/sum/avg/min/max/percentile over a property
//! - **[`ViewportFeatureQueryEngine`]**: High-level entry point composing the above
//!
//! # Performance Characteristics
//!
//! - **Query Time**: O(V) where V = vertices of the resident features (early exit per geometry)
//! - **Memory**: O(F) for the output plus one identifier set per query; no per-vertex allocation
//! - **State**: None retained between queries

pub mod aggregation;
mod dedup;
mod engine;
mod feature;
mod frustum;
mod transform;
pub mod utils;
pub mod visibility;

// Public API exports
pub use aggregation::{AggregationOp, AggregationResult, AggregationSpec, PropertyAggregates};
pub use dedup::{DedupStats, FeatureDeduplicator, FeatureIdentity};
pub use engine::{
    Camera, Config, DEFAULT_UNIQUE_ID_PROPERTY, QueryOptions, QueryResult, TileLayer, Viewport,
    ViewportFeatureQueryEngine,
};
pub use feature::{Feature, FeatureId, Properties, Tile, TileCoord};
pub use frustum::{Frustum, Plane};
pub use transform::{TileSpace, TileTransform};

/// Error types for viewport queries
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Unsupported geometry kind: {kind}")]
    UnsupportedGeometry { kind: &'static str },
}

pub type Result<T> = std::result::Result<T, QueryError>;
