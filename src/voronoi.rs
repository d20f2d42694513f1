//! Voronoi tessellation over the address points.
//!
//! One cell per distinct address location, attributed through a "contains"
//! join back to the address table and clipped to the national boundary.

use geo::{BooleanOps, BoundingRect, Contains, HasDimensions};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use tracing::{info, warn};
use voronoice::{BoundingBox, Point as SitePoint, VoronoiBuilder};

use crate::geometry::{is_empty_point, normalize};
use crate::table::{AddressTable, VoronoiRecord, VoronoiTable};

/// Padding around the tessellation bounding box, in degrees. The box only
/// needs to exceed the clip polygon; cells are cut down to the boundary
/// afterwards anyway.
const BBOX_PADDING_DEG: f64 = 0.5;

/// Build the clipped, attributed tessellation.
///
/// Fewer than three usable sites cannot span a diagram; the result is then an
/// empty table rather than an error. Cells whose clipped geometry is empty
/// (sites far outside the boundary) are dropped; surviving cells keep their
/// original row-position id.
pub fn build_tessellation(addresses: &AddressTable, clip: &MultiPolygon<f64>) -> VoronoiTable {
    let sites: Vec<(usize, Point<f64>)> = addresses
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !is_empty_point(&row.geometry))
        .map(|(index, row)| (index, row.geometry))
        .collect();

    if sites.len() < 3 {
        warn!(sites = sites.len(), "not enough sites for a tessellation");
        return VoronoiTable::default();
    }

    let Some(bounds) = tessellation_bounds(clip, &sites) else {
        return VoronoiTable::default();
    };

    let site_points: Vec<SitePoint> = sites
        .iter()
        .map(|(_, p)| SitePoint { x: p.x(), y: p.y() })
        .collect();

    let Some(diagram) = VoronoiBuilder::default()
        .set_sites(site_points)
        .set_bounding_box(bounds)
        .build()
    else {
        warn!("degenerate site configuration, tessellation is empty");
        return VoronoiTable::default();
    };

    // Point index for the containment join.
    let point_tree: RTree<GeomWithData<[f64; 2], usize>> = RTree::bulk_load(
        sites
            .iter()
            .map(|(index, p)| GeomWithData::new([p.x(), p.y()], *index))
            .collect(),
    );

    let mut table = VoronoiTable::default();
    for (id, cell) in diagram.iter_cells().enumerate() {
        let mut ring: Vec<Coord<f64>> = cell
            .iter_vertices()
            .map(|v| Coord { x: v.x, y: v.y })
            .collect();
        if ring.len() < 3 {
            continue; // degenerate cell from coincident sites
        }
        if ring.first() != ring.last() {
            ring.push(ring[0]);
        }
        let cell_polygon = Polygon::new(LineString::new(ring), vec![]);

        // A cell's attributes come from the single address it contains; zero
        // or multiple matches leave them missing for the reconciler.
        let contained: Vec<usize> = match cell_polygon.bounding_rect() {
            Some(rect) => point_tree
                .locate_in_envelope_intersecting(&AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ))
                .filter(|entry| {
                    let [x, y] = *entry.geom();
                    cell_polygon.contains(&Point::new(x, y))
                })
                .map(|entry| entry.data)
                .collect(),
            None => Vec::new(),
        };
        let source = match contained.as_slice() {
            [index] => Some(&addresses.rows[*index]),
            _ => None,
        };

        let clipped = MultiPolygon::new(vec![cell_polygon]).intersection(clip);
        if clipped.is_empty() {
            continue;
        }

        table.rows.push(VoronoiRecord {
            id,
            street: source.and_then(|r| r.street.clone()),
            housenumber: source.and_then(|r| r.housenumber.clone()),
            postcode: source.and_then(|r| r.postcode),
            city: source.and_then(|r| r.city.clone()),
            geometry: normalize(&clipped),
        });
    }

    info!(cells = table.len(), "tessellation built");
    table
}

/// Bounding box for the diagram: clip polygon extended by every site, plus a
/// fixed margin.
fn tessellation_bounds(
    clip: &MultiPolygon<f64>,
    sites: &[(usize, Point<f64>)],
) -> Option<BoundingBox> {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = match clip.bounding_rect() {
        Some(rect) => (rect.min().x, rect.min().y, rect.max().x, rect.max().y),
        None => {
            let first = sites.first()?.1;
            (first.x(), first.y(), first.x(), first.y())
        }
    };
    for (_, point) in sites {
        min_x = min_x.min(point.x());
        min_y = min_y.min(point.y());
        max_x = max_x.max(point.x());
        max_y = max_y.max(point.y());
    }
    min_x -= BBOX_PADDING_DEG;
    min_y -= BBOX_PADDING_DEG;
    max_x += BBOX_PADDING_DEG;
    max_y += BBOX_PADDING_DEG;

    Some(BoundingBox::new(
        SitePoint {
            x: (min_x + max_x) / 2.0,
            y: (min_y + max_y) / 2.0,
        },
        max_x - min_x,
        max_y - min_y,
    ))
}
