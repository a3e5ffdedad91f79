//! Tile-local to world-pixel coordinate transforms
//!
//! Every resident tile stores its features in its own local space. Before a feature can be
//! compared against the camera frustum it is moved into the shared world-pixel space, where
//! the whole world spans `world_size` pixels at zoom 0 and the Y axis points up.

use crate::{TileCoord, utils};
use geo::{Coord, Rect};
use glam::{DMat4, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Description of the tile coordinate space shared by all resident tiles
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileSpace {
    /// Side length of the world in world pixels at zoom 0 (default 512)
    pub world_size: f64,
    /// Local coordinate extent of one tile (default 1.0, i.e. normalised coordinates)
    pub tile_extent: f64,
}

impl Default for TileSpace {
    fn default() -> Self {
        Self {
            world_size: utils::WORLD_SIZE,
            tile_extent: utils::NORMALIZED_TILE_EXTENT,
        }
    }
}

impl TileSpace {
    /// Build the transform for one tile of this space
    #[inline]
    pub fn transform_for(&self, coord: TileCoord) -> TileTransform {
        TileTransform::new(coord, *self)
    }
}

/// Affine transform from one tile's local space into world-pixel space
///
/// Stored as a 4x4 matrix so it composes with the frustum's 3D plane tests; the Z row is the
/// identity since the scene is 2.5D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTransform {
    matrix: DMat4,
    bounds: Rect<f64>,
}

impl TileTransform {
    /// Create the transform for tile `coord` in `space`
    ///
    /// Scale is `world_size / 2^z` on X and its negation on Y; the translation places the
    /// tile origin at `(world_size * x / 2^z, world_size * (1 - y / 2^z))`.
    pub fn new(coord: TileCoord, space: TileSpace) -> Self {
        let scale = utils::tile_world_size(coord.z, space.world_size) / space.tile_extent;
        let origin = utils::tile_origin(coord.x, coord.y, coord.z, space.world_size);

        let matrix = DMat4::from_translation(DVec3::new(origin.x, origin.y, 0.0))
            * DMat4::from_scale(DVec3::new(scale, -scale, 1.0));

        Self {
            matrix,
            bounds: utils::tile_world_bounds(coord.x, coord.y, coord.z, space.world_size),
        }
    }

    /// Move a tile-local coordinate into world-pixel space, at z = 0
    #[inline(always)]
    pub fn apply(&self, local: Coord<f64>) -> DVec3 {
        self.matrix.transform_point3(DVec3::new(local.x, local.y, 0.0))
    }

    /// The underlying matrix
    #[inline]
    pub fn matrix(&self) -> &DMat4 {
        &self.matrix
    }

    /// World-pixel bounds covered by the tile's nominal extent
    #[inline]
    pub fn world_bounds(&self) -> Rect<f64> {
        self.bounds
    }
}
