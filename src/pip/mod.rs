//! Point-in-polygon lookups against reference areas.
//!
//! R-tree over area bounding boxes for candidate selection, exact containment
//! test afterwards. Used to back-fill postcode and city attributes on address
//! points whose source tags are incomplete.

use geo::{BoundingRect, Contains};
use geo_types::{MultiPolygon, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

/// Row types that carry an area geometry and can be indexed.
pub trait HasArea {
    fn area(&self) -> &MultiPolygon<f64>;
}

impl HasArea for crate::table::PostcodeArea {
    fn area(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

impl HasArea for crate::table::Municipality {
    fn area(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }
}

struct IndexedArea<T> {
    item: T,
    envelope: AABB<[f64; 2]>,
}

impl<T> RTreeObject for IndexedArea<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over a reference-area table.
pub struct AreaIndex<T: HasArea> {
    tree: RTree<IndexedArea<T>>,
}

impl<T: HasArea> AreaIndex<T> {
    /// Build the index. Rows with empty geometry have no bounding box and are
    /// skipped; they could never contain a point anyway.
    pub fn build(rows: Vec<T>) -> Self {
        let total = rows.len();
        let indexed: Vec<IndexedArea<T>> = rows
            .into_iter()
            .filter_map(|item| {
                let rect = item.area().bounding_rect()?;
                Some(IndexedArea {
                    item,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        info!(indexed = indexed.len(), total, "built area index");
        Self {
            tree: RTree::bulk_load(indexed),
        }
    }

    /// First area containing the point, if any ("within" membership test).
    pub fn locate(&self, point: &Point<f64>) -> Option<&T> {
        if point.x().is_nan() || point.y().is_nan() {
            return None;
        }
        let envelope = AABB::from_point([point.x(), point.y()]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .find(|entry| entry.item.area().contains(point))
            .map(|entry| &entry.item)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PostcodeArea;
    use geo_types::{Coord, LineString, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::new(vec![
                Coord { x: x0, y: y0 },
                Coord { x: x0 + size, y: y0 },
                Coord {
                    x: x0 + size,
                    y: y0 + size,
                },
                Coord { x: x0, y: y0 + size },
                Coord { x: x0, y: y0 },
            ]),
            vec![],
        )])
    }

    fn area(postcode: &str, city: &str, x0: f64) -> PostcodeArea {
        PostcodeArea {
            postcode: Some(postcode.to_string()),
            city: Some(city.to_string()),
            geometry: square(x0, 0.0, 1.0),
        }
    }

    #[test]
    fn locates_containing_area() {
        let index = AreaIndex::build(vec![area("1010", "Wien", 0.0), area("8010", "Graz", 2.0)]);
        let hit = index.locate(&Point::new(2.5, 0.5)).unwrap();
        assert_eq!(hit.postcode.as_deref(), Some("8010"));
        assert!(index.locate(&Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn empty_point_never_matches() {
        let index = AreaIndex::build(vec![area("1010", "Wien", 0.0)]);
        assert!(index.locate(&crate::geometry::empty_point()).is_none());
    }

    #[test]
    fn rows_with_empty_geometry_are_skipped() {
        let broken = PostcodeArea {
            postcode: Some("9999".to_string()),
            city: None,
            geometry: MultiPolygon::new(vec![]),
        };
        let index = AreaIndex::build(vec![broken, area("1010", "Wien", 0.0)]);
        assert_eq!(index.len(), 1);
    }
}
