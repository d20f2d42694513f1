//! Polygon assembly and geometry normalization helpers.
//!
//! Overpass returns boundary relations as loose `outer` way fragments. The
//! fragments are merged end-to-end into maximal closed rings, each ring
//! becomes a polygon, and the polygons are unioned into the relation's final
//! footprint.

pub mod project;

use geo::orient::{Direction, Orient};
use geo::BooleanOps;
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};

/// Merge disconnected coordinate runs into closed polygons.
///
/// Fragments connect only on exactly shared endpoints, matching how Overpass
/// splits a ring into consecutive ways. Runs that never close are dropped.
pub fn merge_lines_to_polygons(lines: Vec<Vec<Coord<f64>>>) -> Vec<Polygon<f64>> {
    let mut result = Vec::new();
    let mut remaining: Vec<Vec<Coord<f64>>> = lines.into_iter().filter(|l| l.len() >= 2).collect();

    while !remaining.is_empty() {
        let mut current = remaining.remove(0);

        // Already closed?
        if current.first() == current.last() && current.len() >= 4 {
            result.push(Polygon::new(LineString::new(current), vec![]));
            continue;
        }

        let mut merged = true;
        while merged && !remaining.is_empty() {
            merged = false;

            let current_start = current.first().cloned();
            let current_end = current.last().cloned();

            for i in 0..remaining.len() {
                let line = &remaining[i];
                let line_start = line.first().cloned();
                let line_end = line.last().cloned();

                if current_end == line_start {
                    let mut line = remaining.remove(i);
                    line.remove(0); // drop shared endpoint
                    current.extend(line);
                    merged = true;
                    break;
                } else if current_end == line_end {
                    let mut line = remaining.remove(i);
                    line.reverse();
                    line.remove(0);
                    current.extend(line);
                    merged = true;
                    break;
                } else if current_start == line_end {
                    let mut line = remaining.remove(i);
                    line.pop();
                    line.extend(current);
                    current = line;
                    merged = true;
                    break;
                } else if current_start == line_start {
                    let mut line = remaining.remove(i);
                    line.reverse();
                    line.pop();
                    line.extend(current);
                    current = line;
                    merged = true;
                    break;
                }
            }
        }

        // Keep only runs that actually close into a ring.
        if current.len() >= 4 && current.first() == current.last() {
            result.push(Polygon::new(LineString::new(current), vec![]));
        }
    }

    result
}

/// Union a set of polygons into one multipolygon. An empty input yields an
/// empty multipolygon, which later clipping steps treat as "keep nothing".
pub fn union_polygons(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut iter = polygons.into_iter();
    let Some(first) = iter.next() else {
        return MultiPolygon::new(vec![]);
    };
    iter.fold(MultiPolygon::new(vec![first]), |acc, poly| {
        acc.union(&MultiPolygon::new(vec![poly]))
    })
}

/// Canonical ring winding: exterior rings counter-clockwise, holes clockwise.
/// Applied before deduplication so that identical areas compare equal.
pub fn normalize(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry.orient(Direction::Default)
}

/// Explicit "unknown location" marker for features with no usable coordinate.
/// Encodes as the WKB empty point (NaN ordinates) when written out.
pub fn empty_point() -> Point<f64> {
    Point::new(f64::NAN, f64::NAN)
}

pub fn is_empty_point(point: &Point<f64>) -> bool {
    point.x().is_nan() || point.y().is_nan()
}

/// Bit-level equality key for a point. NaN placeholders compare equal to each
/// other, so duplicate unknown locations collapse during deduplication.
pub fn point_key(point: &Point<f64>) -> (u64, u64) {
    (point.x().to_bits(), point.y().to_bits())
}

/// Bit-level equality key for polygon geometry, used for exact-duplicate row
/// removal across partition fetches.
pub fn polygon_key(geometry: &MultiPolygon<f64>) -> Vec<(u64, u64)> {
    use geo::CoordsIter;
    geometry
        .coords_iter()
        .map(|c| (c.x.to_bits(), c.y.to_bits()))
        .collect()
}
