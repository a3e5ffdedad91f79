//! Features and the resident tiles that hold them

use geo::Geometry;
use serde_json::{Map, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// String-keyed property map of a feature
pub type Properties = Map<String, Value>;

/// Stable identifier of a logical feature, used for cross-tile deduplication
///
/// JSON numbers are normalised so that `1` and `1.0` are the same identifier, while the number
/// `1` and the string `"1"` remain different identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureId {
    /// Integral number representable as `i64`
    Integer(i64),
    /// Integral number above `i64::MAX`, whether written as an integer or a float
    Unsigned(u64),
    /// Bit pattern of a finite, non-integral `f64`
    Float(u64),
    Text(String),
}

impl FeatureId {
    /// Identifier carried by a JSON property value
    ///
    /// Only numbers and strings identify a feature; anything else yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Integer(i))
                } else if let Some(u) = n.as_u64() {
                    Some(Self::Unsigned(u))
                } else {
                    n.as_f64().map(Self::from_f64)
                }
            }
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    fn from_f64(value: f64) -> Self {
        // `i64::MAX as f64` and `u64::MAX as f64` round up to 2^63 and 2^64, hence `<`
        if value.fract() != 0.0 {
            Self::Float(value.to_bits())
        } else if value >= i64::MIN as f64 && value < i64::MAX as f64 {
            Self::Integer(value as i64)
        } else if value >= 0.0 && value < u64::MAX as f64 {
            Self::Unsigned(value as u64)
        } else {
            Self::Float(value.to_bits())
        }
    }

    /// JSON representation of this identifier
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            Self::Unsigned(u) => Value::from(*u),
            Self::Float(bits) => Value::from(f64::from_bits(*bits)),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u64> for FeatureId {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Self::Integer(i),
            Err(_) => Self::Unsigned(value),
        }
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(feature = "serde")]
impl Serialize for FeatureId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom("feature id must be a number or a string"))
    }
}

/// One geometry with its properties, in tile-local coordinates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feature {
    pub geometry: Geometry<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: Properties,
    /// Geometry-level identifier supplied by the tile format, if any
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<FeatureId>,
}

impl Feature {
    /// Create a feature without properties or identifier
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: geometry.into(),
            properties: Properties::new(),
            id: None,
        }
    }

    /// Builder-style setter for a single property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Builder-style setter for the geometry-level identifier
    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[inline]
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Copy of this feature keeping only the listed properties
    ///
    /// Keys the feature does not have are skipped rather than filled with null.
    pub fn project<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        let properties = keys
            .iter()
            .filter_map(|key| {
                let key = key.as_ref();
                self.properties
                    .get(key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect();

        Self {
            geometry: self.geometry.clone(),
            properties,
            id: self.id.clone(),
        }
    }
}

/// Address of a tile in the shared tile pyramid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }
}

/// A tile currently held in memory by the tile collaborator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
    /// Features in tile-local coordinates
    pub content: Vec<Feature>,
}

impl Tile {
    pub fn new(coord: TileCoord, content: Vec<Feature>) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            z: coord.z,
            content,
        }
    }

    #[inline]
    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.x, self.y, self.z)
    }
}
