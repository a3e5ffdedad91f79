//! View frustum as six half-spaces in world-pixel space

use geo::Rect;
use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Depth of the box built by [`Frustum::from_rect`]; features always sit at z = 0
const FLAT_HALF_DEPTH: f64 = 1.0;

/// A half-space: points `p` with `normal · p < distance` are on the inner side
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    /// Unit normal pointing out of the visible volume
    pub normal: DVec3,
    /// Signed distance of the plane along `normal`
    pub distance: f64,
}

impl Plane {
    pub fn new(normal: DVec3, distance: f64) -> Self {
        Self { normal, distance }
    }

    #[inline(always)]
    pub fn contains(&self, point: DVec3) -> bool {
        self.normal.dot(point) < self.distance
    }
}

/// The six planes bounding the camera's visible volume
///
/// Always read fresh from the camera for each query; the camera may have moved since.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frustum {
    pub near: Plane,
    pub far: Plane,
    pub left: Plane,
    pub right: Plane,
    pub top: Plane,
    pub bottom: Plane,
}

impl Frustum {
    /// Axis-aligned view box over `rect` in world pixels, one unit deep on either side of z = 0
    ///
    /// This is the frustum of a top-down orthographic camera, handy for hosts without a
    /// perspective camera and for tests.
    pub fn from_rect(rect: Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();
        Self {
            near: Plane::new(DVec3::NEG_Z, FLAT_HALF_DEPTH),
            far: Plane::new(DVec3::Z, FLAT_HALF_DEPTH),
            left: Plane::new(DVec3::NEG_X, -min.x),
            right: Plane::new(DVec3::X, max.x),
            top: Plane::new(DVec3::Y, max.y),
            bottom: Plane::new(DVec3::NEG_Y, -min.y),
        }
    }

    /// All planes, in near, far, left, right, top, bottom order
    #[inline(always)]
    pub fn planes(&self) -> [Plane; 6] {
        [
            self.near,
            self.far,
            self.left,
            self.right,
            self.top,
            self.bottom,
        ]
    }

    /// True iff `point` is strictly on the inner side of every plane
    #[inline(always)]
    pub fn contains_point(&self, point: DVec3) -> bool {
        self.planes().iter().all(|plane| plane.contains(point))
    }
}
