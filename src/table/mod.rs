//! In-memory geo-tables.
//!
//! Each table is an ordered set of typed rows with one geometry value, all in
//! EPSG:4326. Rows accumulate through explicit builders; the address builder
//! validates its schema on finalization instead of trusting raw tag strings
//! downstream.

use geo_types::{MultiPolygon, Point};
use hashbrown::HashSet;
use thiserror::Error;

use crate::geometry::{point_key, polygon_key};

/// One postal-code boundary. Both attributes are optional: the source tags
/// them inconsistently and later stages back-fill from geometry instead.
#[derive(Debug, Clone, PartialEq)]
pub struct PostcodeArea {
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// One admin-level-8 boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    pub city: String,
    pub geometry: MultiPolygon<f64>,
}

/// A finalized address row. `postcode` is guaranteed numeric by
/// [`AddressTableBuilder::finish`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub postcode: Option<i64>,
    pub city: Option<String>,
    pub geometry: Point<f64>,
}

/// One Voronoi cell, attributed from the address it contains. `id` is the
/// cell's row position at tessellation time and survives clipping.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiRecord {
    pub id: usize,
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub postcode: Option<i64>,
    pub city: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("row {row}: postcode {value:?} does not parse as an integer")]
    NonNumericPostcode { row: usize, value: String },
}

/// Raw address row as fetched: every attribute is still a tag string.
#[derive(Debug, Clone, Default)]
pub struct RawAddress {
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub geometry: Point<f64>,
}

/// Accumulates raw rows; `finish` validates the schema in one pass.
#[derive(Debug, Default)]
pub struct AddressTableBuilder {
    rows: Vec<RawAddress>,
}

impl AddressTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: RawAddress) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Coerce postcodes to integers. A non-numeric postcode fails the whole
    /// build: downstream steps assume a clean integer column and silently
    /// wrong data is worse than an aborted run.
    pub fn finish(self) -> Result<AddressTable, SchemaError> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for (index, raw) in self.rows.into_iter().enumerate() {
            let postcode = match raw.postcode {
                Some(value) => {
                    let parsed = value.trim().parse::<i64>().map_err(|_| {
                        SchemaError::NonNumericPostcode { row: index, value }
                    })?;
                    Some(parsed)
                }
                None => None,
            };
            rows.push(AddressRecord {
                street: raw.street,
                housenumber: raw.housenumber,
                postcode,
                city: raw.city,
                geometry: raw.geometry,
            });
        }
        Ok(AddressTable { rows })
    }
}

/// The national address table.
#[derive(Debug, Clone, Default)]
pub struct AddressTable {
    pub rows: Vec<AddressRecord>,
}

impl AddressTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drop exact-duplicate geometries, then exact-duplicate attribute
    /// tuples, keeping the first occurrence of each. The second key can
    /// discard records with genuinely distinct locations whose attributes
    /// coincide; that imprecision is accepted.
    pub fn dedup(&mut self) {
        let mut seen_geometry = HashSet::new();
        self.rows
            .retain(|row| seen_geometry.insert(point_key(&row.geometry)));

        let mut seen_attrs = HashSet::new();
        self.rows.retain(|row| {
            seen_attrs.insert((
                row.street.clone(),
                row.housenumber.clone(),
                row.postcode,
                row.city.clone(),
            ))
        });
    }
}

/// The Voronoi cell table.
#[derive(Debug, Clone, Default)]
pub struct VoronoiTable {
    pub rows: Vec<VoronoiRecord>,
}

impl VoronoiTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Remove exact-duplicate postcode-area rows. Adjacent partitions return the
/// same boundary twice near shared borders.
pub fn dedup_postcode_areas(rows: Vec<PostcodeArea>) -> Vec<PostcodeArea> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            seen.insert((
                row.postcode.clone(),
                row.city.clone(),
                polygon_key(&row.geometry),
            ))
        })
        .collect()
}

/// Same, for municipalities.
pub fn dedup_municipalities(rows: Vec<Municipality>) -> Vec<Municipality> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert((row.city.clone(), polygon_key(&row.geometry))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::empty_point;

    fn raw(street: &str, housenumber: &str, postcode: Option<&str>, x: f64, y: f64) -> RawAddress {
        RawAddress {
            street: Some(street.to_string()),
            housenumber: Some(housenumber.to_string()),
            postcode: postcode.map(str::to_string),
            city: None,
            geometry: Point::new(x, y),
        }
    }

    #[test]
    fn finish_coerces_postcodes() {
        let mut builder = AddressTableBuilder::new();
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.0, 48.0));
        builder.push(raw("Hauptstraße", "2", None, 16.1, 48.0));
        let table = builder.finish().unwrap();
        assert_eq!(table.rows[0].postcode, Some(1010));
        assert_eq!(table.rows[1].postcode, None);
    }

    #[test]
    fn finish_fails_loudly_on_non_numeric_postcode() {
        let mut builder = AddressTableBuilder::new();
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.0, 48.0));
        builder.push(raw("Ringstraße", "7", Some("A-1010"), 16.2, 48.1));
        let err = builder.finish().unwrap_err();
        match err {
            SchemaError::NonNumericPostcode { row, value } => {
                assert_eq!(row, 1);
                assert_eq!(value, "A-1010");
            }
        }
    }

    #[test]
    fn dedup_by_geometry_keeps_one_row() {
        let mut builder = AddressTableBuilder::new();
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.0, 48.0));
        builder.push(raw("Ringstraße", "9", Some("1020"), 16.0, 48.0));
        let mut table = builder.finish().unwrap();
        table.dedup();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dedup_by_attributes_keeps_one_row() {
        let mut builder = AddressTableBuilder::new();
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.0, 48.0));
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.5, 48.5));
        let mut table = builder.finish().unwrap();
        table.dedup();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dedup_collapses_empty_point_placeholders() {
        let mut builder = AddressTableBuilder::new();
        for n in ["1", "2", "3"] {
            let mut row = raw("Feldweg", n, None, 0.0, 0.0);
            row.geometry = empty_point();
            builder.push(row);
        }
        let mut table = builder.finish().unwrap();
        table.dedup();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut builder = AddressTableBuilder::new();
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.0, 48.0));
        builder.push(raw("Hauptstraße", "1", Some("1010"), 16.0, 48.0));
        builder.push(raw("Ringstraße", "2", Some("1020"), 16.1, 48.0));
        let mut table = builder.finish().unwrap();
        table.dedup();
        let after_first = table.len();
        table.dedup();
        assert_eq!(table.len(), after_first);
    }
}
