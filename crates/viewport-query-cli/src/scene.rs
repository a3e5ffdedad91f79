//! JSON scene files: resident tiles plus camera viewports
//!
//! A scene stands in for the host application's tile and camera collaborators. Geometries use
//! GeoJSON `type`/`coordinates` objects in tile-local coordinates; a third coordinate is
//! accepted and ignored.

use crate::error::{CliError, Result};
use geo::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Rect,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use viewport_query_lib::{
    AggregationResult, Feature, FeatureId, Frustum, Properties, QueryResult, Tile, TileCoord,
    Viewport,
};

/// Deepest zoom level accepted in a scene (tile indices must fit in `u32`)
const MAX_ZOOM: u8 = 31;

/// GeoJSON position: `[x, y]` or `[x, y, z]`
type Position = Vec<f64>;

/// A scene file as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    pub viewports: Vec<SceneViewport>,
    #[serde(default)]
    pub tiles: Vec<SceneTile>,
}

/// One camera viewport, either as explicit planes or as a world-pixel view box
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SceneViewport {
    Planes { planes: Frustum },
    /// `[min_x, min_y, max_x, max_y]` in world pixels
    Bounds { bounds: [f64; 4] },
}

impl Viewport for SceneViewport {
    fn frustum_planes(&self) -> Frustum {
        match self {
            Self::Planes { planes } => *planes,
            Self::Bounds {
                bounds: [min_x, min_y, max_x, max_y],
            } => Frustum::from_rect(Rect::new(
                Coord {
                    x: *min_x,
                    y: *min_y,
                },
                Coord {
                    x: *max_x,
                    y: *max_y,
                },
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneTile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
    #[serde(default)]
    pub features: Vec<SceneFeature>,
}

/// A feature in GeoJSON-like form, used both for input and output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: GeoJsonGeometry,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeoJsonGeometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// Query output written to stdout
#[derive(Debug, Serialize)]
pub struct SceneOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<SceneFeature>>,
    pub aggregations: AggregationResult,
}

impl Scene {
    /// Read a scene from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Split the scene into the engine's camera and tile collaborators
    pub fn into_collaborators(self) -> Result<(Vec<SceneViewport>, Vec<Tile>)> {
        if self.viewports.is_empty() {
            return Err(CliError::InvalidScene(
                "at least one viewport is required".to_string(),
            ));
        }

        let tiles = self
            .tiles
            .into_iter()
            .map(SceneTile::into_tile)
            .collect::<Result<Vec<_>>>()?;

        Ok((self.viewports, tiles))
    }
}

impl SceneTile {
    fn into_tile(self) -> Result<Tile> {
        if self.z > MAX_ZOOM {
            return Err(CliError::InvalidScene(format!(
                "tile {}/{}/{}: zoom above {}",
                self.z, self.x, self.y, MAX_ZOOM
            )));
        }
        let n = 1u64 << self.z;
        if u64::from(self.x) >= n || u64::from(self.y) >= n {
            return Err(CliError::InvalidScene(format!(
                "tile {}/{}/{}: index outside the {}x{} grid",
                self.z, self.x, self.y, n, n
            )));
        }

        let content = self
            .features
            .into_iter()
            .map(SceneFeature::into_feature)
            .collect::<Result<Vec<_>>>()?;

        Ok(Tile::new(TileCoord::new(self.x, self.y, self.z), content))
    }
}

impl SceneFeature {
    fn into_feature(self) -> Result<Feature> {
        Ok(Feature {
            geometry: self.geometry.into_geometry()?,
            properties: self.properties,
            id: self.id,
        })
    }

    /// GeoJSON-like form of an engine feature
    pub fn from_feature(feature: Feature) -> Result<Self> {
        let geometry = GeoJsonGeometry::from_geometry(&feature.geometry).ok_or_else(|| {
            CliError::InvalidScene(format!(
                "cannot write {} geometry",
                viewport_query_lib::visibility::geometry_kind(&feature.geometry)
            ))
        })?;
        Ok(Self {
            id: feature.id,
            geometry,
            properties: feature.properties,
        })
    }
}

impl SceneOutput {
    pub fn from_result(result: QueryResult, aggregations_only: bool) -> Result<Self> {
        let features = if aggregations_only {
            None
        } else {
            Some(
                result
                    .features
                    .into_iter()
                    .map(SceneFeature::from_feature)
                    .collect::<Result<Vec<_>>>()?,
            )
        };
        Ok(Self {
            features,
            aggregations: result.aggregations,
        })
    }
}

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(CliError::InvalidScene(format!(
            "position {position:?} needs at least two coordinates"
        ))),
    }
}

fn line(positions: &[Position]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| line(ring));
    let exterior = rings
        .next()
        .transpose()?
        .unwrap_or_else(|| LineString::new(Vec::new()));
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn positions(line: &LineString<f64>) -> Vec<Position> {
    line.coords().map(|c| vec![c.x, c.y]).collect()
}

fn rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(positions)
        .collect()
}

impl GeoJsonGeometry {
    pub fn into_geometry(self) -> Result<Geometry<f64>> {
        let geometry = match self {
            Self::Point(p) => Point::from(coord(&p)?).into(),
            Self::MultiPoint(points) => MultiPoint::new(
                points
                    .iter()
                    .map(|p| coord(p).map(Point::from))
                    .collect::<Result<Vec<_>>>()?,
            )
            .into(),
            Self::LineString(positions) => line(&positions)?.into(),
            Self::MultiLineString(lines) => {
                MultiLineString::new(lines.iter().map(|l| line(l)).collect::<Result<Vec<_>>>()?)
                    .into()
            }
            Self::Polygon(rings) => polygon(&rings)?.into(),
            Self::MultiPolygon(polygons) => MultiPolygon::new(
                polygons
                    .iter()
                    .map(|p| polygon(p))
                    .collect::<Result<Vec<_>>>()?,
            )
            .into(),
        };
        Ok(geometry)
    }

    /// GeoJSON form of one of the six vector-tile kinds; other kinds have none
    pub fn from_geometry(geometry: &Geometry<f64>) -> Option<Self> {
        let geojson = match geometry {
            Geometry::Point(p) => Self::Point(vec![p.x(), p.y()]),
            Geometry::MultiPoint(points) => {
                Self::MultiPoint(points.iter().map(|p| vec![p.x(), p.y()]).collect())
            }
            Geometry::LineString(l) => Self::LineString(positions(l)),
            Geometry::MultiLineString(lines) => {
                Self::MultiLineString(lines.iter().map(positions).collect())
            }
            Geometry::Polygon(p) => Self::Polygon(rings(p)),
            Geometry::MultiPolygon(polygons) => {
                Self::MultiPolygon(polygons.iter().map(rings).collect())
            }
            Geometry::Line(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_)
            | Geometry::GeometryCollection(_) => return None,
        };
        Some(geojson)
    }
}
