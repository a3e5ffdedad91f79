//! Visibility of tile geometries against the view frustum
//!
//! Visibility is approximated by vertex sampling: a geometry is visible iff at least one of its
//! vertices, moved into world-pixel space, lies strictly inside every frustum plane. Segments
//! and polygon interiors are never clipped, so a polygon fully covering the screen with all
//! of its vertices off-screen is reported as not visible.
//!
//! This runs per vertex of every candidate feature on every query. Coordinates are visited
//! through borrowing iterators and transformed into stack values; nothing here allocates.

use crate::{Frustum, QueryError, Result, TileTransform};
use geo::{Coord, Geometry, LineString, Polygon};

/// Name of the geometry kind, as used in error reports
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::Line(_) => "Line",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Test whether a tile-local geometry is visible through `frustum`
///
/// # Errors
/// Returns [`QueryError::UnsupportedGeometry`] for geometry kinds outside the six vector-tile
/// kinds (Point, MultiPoint, LineString, MultiLineString, Polygon, MultiPolygon).
#[inline]
pub fn is_geometry_visible(
    geometry: &Geometry<f64>,
    transform: &TileTransform,
    frustum: &Frustum,
) -> Result<bool> {
    let visible = match geometry {
        Geometry::Point(point) => is_coord_visible(point.0, transform, frustum),
        Geometry::MultiPoint(points) => points
            .iter()
            .any(|point| is_coord_visible(point.0, transform, frustum)),
        Geometry::LineString(line) => is_line_visible(line, transform, frustum),
        Geometry::MultiLineString(lines) => lines
            .iter()
            .any(|line| is_line_visible(line, transform, frustum)),
        Geometry::Polygon(polygon) => is_polygon_visible(polygon, transform, frustum),
        Geometry::MultiPolygon(polygons) => polygons
            .iter()
            .any(|polygon| is_polygon_visible(polygon, transform, frustum)),
        Geometry::Line(_)
        | Geometry::Rect(_)
        | Geometry::Triangle(_)
        | Geometry::GeometryCollection(_) => {
            return Err(QueryError::UnsupportedGeometry {
                kind: geometry_kind(geometry),
            });
        }
    };
    Ok(visible)
}

/// Point test; Z is ignored and the point is tested at z = 0
#[inline(always)]
fn is_coord_visible(coord: Coord<f64>, transform: &TileTransform, frustum: &Frustum) -> bool {
    frustum.contains_point(transform.apply(coord))
}

#[inline]
fn is_line_visible(line: &LineString<f64>, transform: &TileTransform, frustum: &Frustum) -> bool {
    line.coords()
        .any(|coord| is_coord_visible(*coord, transform, frustum))
}

/// Any vertex of any ring, exterior first
#[inline]
fn is_polygon_visible(
    polygon: &Polygon<f64>,
    transform: &TileTransform,
    frustum: &Frustum,
) -> bool {
    is_line_visible(polygon.exterior(), transform, frustum)
        || polygon
            .interiors()
            .iter()
            .any(|ring| is_line_visible(ring, transform, frustum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TileCoord, TileSpace};
    use geo::{
        GeometryCollection, Line, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
        Rect, Triangle, coord, line_string, point, polygon,
    };

    /// Zoom-0 tile: local (u, v) maps to world (512u, 512(1 - v))
    fn world_tile() -> TileTransform {
        TileSpace::default().transform_for(TileCoord::new(0, 0, 0))
    }

    /// Frustum over world x in [100, 200], y in [100, 200]
    fn frustum() -> Frustum {
        Frustum::from_rect(Rect::new(
            coord! { x: 100.0, y: 100.0 },
            coord! { x: 200.0, y: 200.0 },
        ))
    }

    /// Local coordinate of world (x, y) in the zoom-0 tile
    fn local(x: f64, y: f64) -> Coord<f64> {
        coord! { x: x / 512.0, y: 1.0 - y / 512.0 }
    }

    fn visible(geometry: impl Into<Geometry<f64>>) -> bool {
        is_geometry_visible(&geometry.into(), &world_tile(), &frustum()).unwrap()
    }

    #[test]
    fn test_point_inside_and_outside() {
        assert!(visible(Point::from(local(150.0, 150.0))));
        assert!(!visible(Point::from(local(50.0, 150.0))));
        assert!(!visible(Point::from(local(150.0, 250.0))));
    }

    #[test]
    fn test_multipoint_any_inside() {
        let inside = MultiPoint::new(vec![
            Point::from(local(10.0, 10.0)),
            Point::from(local(150.0, 150.0)),
        ]);
        let outside = MultiPoint::new(vec![
            Point::from(local(10.0, 10.0)),
            Point::from(local(300.0, 300.0)),
        ]);
        assert!(visible(inside));
        assert!(!visible(outside));
    }

    #[test]
    fn test_empty_multipoint_not_visible() {
        assert!(!visible(MultiPoint::<f64>::new(vec![])));
    }

    #[test]
    fn test_linestring_vertex_sampling() {
        let with_vertex_inside = LineString::from(vec![local(0.0, 0.0), local(150.0, 150.0)]);
        assert!(visible(with_vertex_inside));

        // Crosses the frustum, but no vertex lands inside: sampled as not visible
        let crossing = LineString::from(vec![local(0.0, 150.0), local(300.0, 150.0)]);
        assert!(!visible(crossing));
    }

    #[test]
    fn test_multilinestring_any_line() {
        let lines = MultiLineString::new(vec![
            LineString::from(vec![local(0.0, 0.0), local(10.0, 10.0)]),
            LineString::from(vec![local(300.0, 300.0), local(160.0, 120.0)]),
        ]);
        assert!(visible(lines));
    }

    #[test]
    fn test_polygon_exterior_vertex() {
        let a = local(150.0, 150.0);
        let b = local(300.0, 150.0);
        let c = local(300.0, 300.0);
        let poly = polygon![(x: a.x, y: a.y), (x: b.x, y: b.y), (x: c.x, y: c.y)];
        assert!(visible(poly));
    }

    #[test]
    fn test_polygon_covering_screen_without_vertices_inside() {
        let a = local(0.0, 0.0);
        let b = local(400.0, 0.0);
        let c = local(400.0, 400.0);
        let d = local(0.0, 400.0);
        let poly = polygon![
            (x: a.x, y: a.y),
            (x: b.x, y: b.y),
            (x: c.x, y: c.y),
            (x: d.x, y: d.y)
        ];
        assert!(!visible(poly));
    }

    #[test]
    fn test_polygon_interior_ring_vertex() {
        let exterior = LineString::from(vec![
            local(0.0, 0.0),
            local(400.0, 0.0),
            local(400.0, 400.0),
            local(0.0, 400.0),
            local(0.0, 0.0),
        ]);
        let hole = LineString::from(vec![
            local(140.0, 140.0),
            local(160.0, 140.0),
            local(160.0, 160.0),
            local(140.0, 140.0),
        ]);
        assert!(visible(Polygon::new(exterior, vec![hole])));
    }

    #[test]
    fn test_multipolygon_any_polygon() {
        let far_away = Polygon::new(
            LineString::from(vec![local(400.0, 400.0), local(450.0, 400.0), local(450.0, 450.0)]),
            vec![],
        );
        let on_screen = Polygon::new(
            LineString::from(vec![local(120.0, 120.0), local(130.0, 120.0), local(130.0, 130.0)]),
            vec![],
        );
        assert!(!visible(MultiPolygon::new(vec![far_away.clone()])));
        assert!(visible(MultiPolygon::new(vec![far_away, on_screen])));
    }

    #[test]
    fn test_unsupported_kinds_are_errors() {
        let unsupported: Vec<Geometry<f64>> = vec![
            Line::new(local(150.0, 150.0), local(160.0, 160.0)).into(),
            Rect::new(local(150.0, 150.0), local(160.0, 160.0)).into(),
            Triangle::new(local(150.0, 150.0), local(160.0, 160.0), local(150.0, 160.0)).into(),
            Geometry::GeometryCollection(GeometryCollection(vec![
                Point::from(local(150.0, 150.0)).into(),
            ])),
        ];

        for geometry in unsupported {
            let err = is_geometry_visible(&geometry, &world_tile(), &frustum()).unwrap_err();
            let QueryError::UnsupportedGeometry { kind } = err;
            assert_eq!(kind, geometry_kind(&geometry));
        }
    }

    #[test]
    fn test_geometry_kind_names() {
        assert_eq!(geometry_kind(&point!(x: 0.0, y: 0.0).into()), "Point");
        assert_eq!(
            geometry_kind(&line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)].into()),
            "LineString"
        );
    }
}
