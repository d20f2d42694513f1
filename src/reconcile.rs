//! Gap-filling over the tessellation table.
//!
//! Two passes: propagate a canonical city per postcode, then borrow the most
//! frequent value from touching neighbour cells. Neither pass ever changes a
//! field that already has a value. Street-name inference is a known gap and
//! deliberately not attempted.

use std::collections::BTreeMap;

use geo::{BoundingRect, HasDimensions, Relate};
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::table::{VoronoiRecord, VoronoiTable};

/// Run both passes in order.
pub fn fill_gaps(table: &mut VoronoiTable) {
    fill_city_from_postcodes(table);
    fill_from_neighbours(table);
}

/// Pass 1: for every postcode with at least one known city, designate the
/// city of the first such row (in table order) as canonical and copy it onto
/// rows sharing the postcode whose city is missing. Table order makes the
/// "first seen" choice deterministic.
fn fill_city_from_postcodes(table: &mut VoronoiTable) {
    let mut canonical: BTreeMap<i64, String> = BTreeMap::new();
    for row in &table.rows {
        if let (Some(postcode), Some(city)) = (row.postcode, row.city.as_ref()) {
            canonical.entry(postcode).or_insert_with(|| city.clone());
        }
    }

    let mut filled = 0usize;
    for row in &mut table.rows {
        if row.city.is_none() {
            if let Some(city) = row.postcode.and_then(|pc| canonical.get(&pc)) {
                row.city = Some(city.clone());
                filled += 1;
            }
        }
    }
    info!(filled, postcodes = canonical.len(), "city filled from postcodes");
}

struct IndexedCell {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pass 2: rows still missing postcode or city take the most frequent
/// non-missing value among cells that touch theirs (shared boundary, no
/// interior overlap). Ties break toward the smallest value. Donor values are
/// read from the table as it stood before this pass, so fills do not cascade.
fn fill_from_neighbours(table: &mut VoronoiTable) {
    let cells: Vec<IndexedCell> = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let rect = row.geometry.bounding_rect()?;
            Some(IndexedCell {
                index,
                envelope: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    let tree = RTree::bulk_load(cells);

    let mut fills: Vec<(usize, Option<i64>, Option<String>)> = Vec::new();
    for (index, row) in table.rows.iter().enumerate() {
        if row.postcode.is_some() && row.city.is_some() {
            continue;
        }
        if row.geometry.is_empty() {
            continue;
        }
        let Some(rect) = row.geometry.bounding_rect() else {
            continue;
        };

        let neighbours: Vec<&VoronoiRecord> = tree
            .locate_in_envelope_intersecting(&AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ))
            .filter(|cell| cell.index != index)
            .map(|cell| &table.rows[cell.index])
            .filter(|other| row.geometry.relate(&other.geometry).is_touches())
            .collect();

        let postcode = row
            .postcode
            .is_none()
            .then(|| mode(neighbours.iter().filter_map(|n| n.postcode)))
            .flatten();
        let city = row
            .city
            .is_none()
            .then(|| mode(neighbours.iter().filter_map(|n| n.city.clone())))
            .flatten();
        if postcode.is_some() || city.is_some() {
            fills.push((index, postcode, city));
        }
    }

    let filled = fills.len();
    for (index, postcode, city) in fills {
        let row = &mut table.rows[index];
        if row.postcode.is_none() {
            row.postcode = postcode;
        }
        if row.city.is_none() {
            row.city = city;
        }
    }
    info!(filled, "gaps filled from touching neighbours");
}

/// Most frequent value; ties break toward the smallest value.
fn mode<T: Ord>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        // ascending key order: a strictly higher count is required to replace
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}
