//! Decoded readings handed to the logging layer.
//!
//! Values are kept as text, exactly as they end up in campaign files. An
//! absent value is `None` in memory and the literal `"NaN"` once serialized.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// How an absent value is written to campaign files.
pub const ABSENT: &str = "NaN";

/// Serde adapter mapping `None` to `"NaN"` and back.
pub mod nan {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ABSENT;

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_ref().map_or(ABSENT, String::as_str))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(if raw == ABSENT { None } else { Some(raw) })
    }
}

/// Render an optional value for display, absent as `"NaN"`.
#[inline]
pub fn or_nan(value: &Option<String>) -> &str {
    value.as_ref().map_or(ABSENT, String::as_str)
}

/// Position, time and speed from an RMC sentence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionReading {
    /// Latitude in decimal degrees, negative in the southern hemisphere.
    #[serde(rename = "latD", with = "nan")]
    pub latitude: Option<String>,
    /// Longitude in decimal degrees, negative in the western hemisphere.
    #[serde(rename = "lonD", with = "nan")]
    pub longitude: Option<String>,
    /// `"degrees minutes hemisphere"` as received.
    #[serde(rename = "lat", with = "nan")]
    pub latitude_dm: Option<String>,
    #[serde(rename = "lon", with = "nan")]
    pub longitude_dm: Option<String>,
    /// `HH:MM:SS`
    #[serde(rename = "hora", with = "nan")]
    pub time: Option<String>,
    /// `DDMMYY`
    #[serde(rename = "fecha", with = "nan")]
    pub date: Option<String>,
    /// Speed over ground in knots, as received.
    #[serde(rename = "Velocidad", with = "nan")]
    pub speed: Option<String>,
}

impl PositionReading {
    pub fn is_absent(&self) -> bool {
        *self == PositionReading::default()
    }
}

/// Depth below surface from a DBS sentence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepthReading {
    #[serde(with = "nan")]
    pub meters: Option<String>,
    #[serde(with = "nan")]
    pub feet: Option<String>,
}

impl DepthReading {
    pub fn is_absent(&self) -> bool {
        self.meters.is_none() && self.feet.is_none()
    }
}

/// One value per configured column of a whitespace separated instrument
/// line, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnReading(Vec<(String, Option<String>)>);

impl ColumnReading {
    pub fn new(values: Vec<(String, Option<String>)>) -> Self {
        ColumnReading(values)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|&&(ref name, _)| name == column)
            .and_then(|&(_, ref value)| value.as_ref().map(String::as_str))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|&(ref name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_absent(&self) -> bool {
        self.0.iter().all(|&(_, ref value)| value.is_none())
    }
}

impl Serialize for ColumnReading {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for &(ref name, ref value) in &self.0 {
            map.serialize_entry(name, or_nan(value))?;
        }
        map.end()
    }
}
