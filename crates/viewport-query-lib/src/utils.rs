//! Utility functions for tile-grid arithmetic in world-pixel space

use geo::{Coord, Rect};

/// Side length of the whole world in world pixels at zoom 0
pub const WORLD_SIZE: f64 = 512.0;

/// Local extent of normalised tile coordinates (features span [0, 1] inside a tile)
pub const NORMALIZED_TILE_EXTENT: f64 = 1.0;

/// Local extent used by raw Mapbox Vector Tile integer coordinates
pub const MVT_TILE_EXTENT: f64 = 4096.0;

/// Number of tiles along one axis at zoom `z` (`2^z`)
#[inline(always)]
pub fn tiles_per_axis(z: u8) -> f64 {
    (z as f64).exp2()
}

/// Side length of a tile at zoom `z`, in world pixels
#[inline(always)]
pub fn tile_world_size(z: u8, world_size: f64) -> f64 {
    world_size / tiles_per_axis(z)
}

/// World-pixel position of the top-left corner of tile (x, y, z)
///
/// World Y grows upwards, so the top edge of row 0 sits at `world_size`.
#[inline(always)]
pub fn tile_origin(x: u32, y: u32, z: u8, world_size: f64) -> Coord<f64> {
    let n = tiles_per_axis(z);
    Coord {
        x: world_size * x as f64 / n,
        y: world_size * (1.0 - y as f64 / n),
    }
}

/// Axis-aligned world-pixel bounds of tile (x, y, z)
pub fn tile_world_bounds(x: u32, y: u32, z: u8, world_size: f64) -> Rect<f64> {
    let origin = tile_origin(x, y, z, world_size);
    let size = tile_world_size(z, world_size);
    Rect::new(
        Coord {
            x: origin.x,
            y: origin.y - size,
        },
        Coord {
            x: origin.x + size,
            y: origin.y,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_per_axis() {
        assert_eq!(tiles_per_axis(0), 1.0);
        assert_eq!(tiles_per_axis(1), 2.0);
        assert_eq!(tiles_per_axis(10), 1024.0);
    }

    #[test]
    fn test_tile_origin_zoom_zero() {
        let origin = tile_origin(0, 0, 0, WORLD_SIZE);
        assert_eq!(origin.x, 0.0);
        assert_eq!(origin.y, WORLD_SIZE);
    }

    #[test]
    fn test_tile_origin_zoom_one() {
        // Bottom-right tile of a 2x2 grid starts at the world centre
        let origin = tile_origin(1, 1, 1, WORLD_SIZE);
        assert_eq!(origin.x, 256.0);
        assert_eq!(origin.y, 256.0);
    }

    #[test]
    fn test_tile_world_bounds() {
        let bounds = tile_world_bounds(1, 0, 1, WORLD_SIZE);
        assert_eq!(bounds.min(), Coord { x: 256.0, y: 256.0 });
        assert_eq!(bounds.max(), Coord { x: 512.0, y: 512.0 });
        assert_eq!(bounds.width(), tile_world_size(1, WORLD_SIZE));
    }

    #[test]
    fn test_tiles_cover_world_without_gaps() {
        let z = 3;
        let n = tiles_per_axis(z) as u32;
        let mut area = 0.0;
        for x in 0..n {
            for y in 0..n {
                let b = tile_world_bounds(x, y, z, WORLD_SIZE);
                area += b.width() * b.height();
            }
        }
        assert!((area - WORLD_SIZE * WORLD_SIZE).abs() < 1e-6);
    }
}
