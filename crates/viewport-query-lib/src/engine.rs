//! ViewportFeatureQueryEngine - Top-level entry point for visible-feature queries
//!
//! The engine reads the resident tiles and the camera frustum from its collaborators, runs the
//! deduplicating visibility pass, and optionally projects properties and aggregates values.
//! It keeps no state between queries: every call allocates its own dedup set and drops it on
//! return, so repeated calls with a moving camera are independent.

use crate::aggregation::{self, AggregationResult, AggregationSpec};
use crate::{Feature, FeatureDeduplicator, Frustum, Result, Tile, TileSpace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::Arc;

/// Property consulted for feature identity when a query does not name one
pub const DEFAULT_UNIQUE_ID_PROPERTY: &str = "cartodb_id";

/// A view onto the scene that can report its frustum planes
pub trait Viewport {
    fn frustum_planes(&self) -> Frustum;
}

/// Camera collaborator: exposes one or more viewports, of which only the first is queried
///
/// Viewports may be borrowed from the camera or computed on demand.
pub trait Camera {
    fn viewports(&self) -> impl IntoIterator<Item = impl Viewport>;
}

/// Tile collaborator: exposes the tiles currently held in memory
///
/// The engine only reads this set; it never asks for tiles to be loaded or evicted. Tiles may be
/// borrowed from a cache or built on demand.
pub trait TileLayer {
    fn resident_tiles(&self) -> impl IntoIterator<Item = impl Borrow<Tile>>;
}

impl Viewport for Frustum {
    #[inline]
    fn frustum_planes(&self) -> Frustum {
        *self
    }
}

impl<V: Viewport + ?Sized> Viewport for &V {
    #[inline]
    fn frustum_planes(&self) -> Frustum {
        (**self).frustum_planes()
    }
}

impl<V: Viewport> Camera for Vec<V> {
    #[inline]
    fn viewports(&self) -> impl IntoIterator<Item = impl Viewport> {
        self.iter()
    }
}

impl<C: Camera> Camera for Arc<C> {
    #[inline]
    fn viewports(&self) -> impl IntoIterator<Item = impl Viewport> {
        (**self).viewports()
    }
}

impl TileLayer for Vec<Tile> {
    #[inline]
    fn resident_tiles(&self) -> impl IntoIterator<Item = impl Borrow<Tile>> {
        self.iter()
    }
}

impl<L: TileLayer> TileLayer for Arc<L> {
    #[inline]
    fn resident_tiles(&self) -> impl IntoIterator<Item = impl Borrow<Tile>> {
        (**self).resident_tiles()
    }
}

/// Configuration for the query engine
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Coordinate space of the resident tiles
    pub tile_space: TileSpace,
    /// Property holding the stable feature identifier (default `cartodb_id`).
    /// Can be overridden per query with [`QueryOptions::unique_id_property`].
    pub unique_id_property: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile_space: TileSpace::default(),
            unique_id_property: DEFAULT_UNIQUE_ID_PROPERTY.to_string(),
        }
    }
}

/// Options for a single [`ViewportFeatureQueryEngine::get_features`] call
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueryOptions {
    /// Keep only these properties on the returned features
    pub properties: Option<Vec<String>>,
    /// Aggregations to compute over the full property set of the visible features
    pub aggregations: Option<AggregationSpec>,
    /// Identity property for this query, instead of [`Config::unique_id_property`]
    pub unique_id_property: Option<String>,
}

impl QueryOptions {
    pub fn with_properties<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.properties = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Request `operators` for `property`, adding to any earlier request for it
    pub fn with_aggregation<S: Into<String>>(
        mut self,
        property: impl Into<String>,
        operators: impl IntoIterator<Item = S>,
    ) -> Self {
        self.aggregations
            .get_or_insert_with(AggregationSpec::new)
            .entry(property.into())
            .or_default()
            .extend(operators.into_iter().map(Into::into));
        self
    }

    pub fn with_unique_id_property(mut self, property: impl Into<String>) -> Self {
        self.unique_id_property = Some(property.into());
        self
    }
}

/// Visible features and their aggregations
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QueryResult {
    pub features: Vec<Feature>,
    pub aggregations: AggregationResult,
}

/// Computes the deduplicated set of visible features for the current camera
#[derive(Debug, Clone)]
pub struct ViewportFeatureQueryEngine<C, L> {
    camera: Option<C>,
    tile_layer: Option<L>,
    config: Config,
}

impl<C, L> ViewportFeatureQueryEngine<C, L> {
    /// Create an engine without collaborators; it is not ready until both are set
    pub fn new(config: Config) -> Self {
        Self {
            camera: None,
            tile_layer: None,
            config,
        }
    }

    pub fn set_camera(&mut self, camera: C) {
        self.camera = Some(camera);
    }

    pub fn set_tile_layer(&mut self, tile_layer: L) {
        self.tile_layer = Some(tile_layer);
    }

    /// True once both a camera and a tile layer have been supplied
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.camera.is_some() && self.tile_layer.is_some()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<C: Camera, L: TileLayer> ViewportFeatureQueryEngine<C, L> {
    /// Query the features visible through the camera's primary viewport
    ///
    /// Returns an empty result when the engine is not ready, so callers may probe before setup
    /// completes.
    ///
    /// # Errors
    /// Fails with [`crate::QueryError::UnsupportedGeometry`] when a resident feature has a
    /// geometry kind that cannot be tested for visibility.
    pub fn get_features(&self, options: &QueryOptions) -> Result<QueryResult> {
        #[cfg(feature = "profiling")]
        profiling::scope!("engine::get_features");

        let (Some(camera), Some(tile_layer)) = (&self.camera, &self.tile_layer) else {
            tracing::debug!(
                "Query engine not ready (camera or tile layer unset), returning no features"
            );
            return Ok(QueryResult::default());
        };

        let mut viewports = camera.viewports().into_iter();
        let Some(viewport) = viewports.next() else {
            tracing::warn!("Camera exposes no viewports, returning no features");
            return Ok(QueryResult::default());
        };
        let ignored = viewports.count();
        if ignored > 0 {
            tracing::debug!(
                "Camera exposes {} viewports, querying only the first",
                ignored + 1
            );
        }

        // Read fresh every query: the camera may have moved since the last call
        let frustum = viewport.frustum_planes();
        let unique_id_property = options
            .unique_id_property
            .as_deref()
            .unwrap_or(&self.config.unique_id_property);

        // Tiles may be owned by the iterator, so visible features are copied out per tile
        let mut visible = Vec::new();
        let stats = {
            #[cfg(feature = "profiling")]
            profiling::scope!("engine::deduplicate");
            let mut dedup =
                FeatureDeduplicator::new(self.config.tile_space, &frustum, unique_id_property);
            for tile in tile_layer.resident_tiles() {
                let mut fresh = Vec::new();
                dedup.push_tile(Borrow::<Tile>::borrow(&tile), &mut fresh)?;
                visible.extend(fresh.into_iter().cloned());
            }
            dedup.stats()
        };
        tracing::debug!(
            "Visible features: {} (tiles: {}, tested: {}, duplicates skipped: {})",
            stats.accepted,
            stats.tiles,
            stats.tested,
            stats.duplicates
        );

        // Aggregations see every property, whatever the projection below keeps
        let aggregations = match &options.aggregations {
            Some(spec) => {
                let refs: Vec<&Feature> = visible.iter().collect();
                aggregation::aggregate(&refs, spec)
            }
            None => AggregationResult::new(),
        };

        let features = match &options.properties {
            Some(keys) => visible.iter().map(|feature| feature.project(keys)).collect(),
            None => visible,
        };

        Ok(QueryResult {
            features,
            aggregations,
        })
    }
}
