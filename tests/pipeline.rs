//! End-to-end test of the offline pipeline stages: table finalization,
//! deduplication, tessellation, gap filling and packaging.

use std::fs::File;
use std::io;

use geo::{Area, BooleanOps};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon};
use rusqlite::Connection;

use anschrift::package::{package_addresses, package_voronoi};
use anschrift::reconcile::fill_gaps;
use anschrift::table::{AddressTableBuilder, RawAddress};
use anschrift::voronoi::build_tessellation;

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

fn raw(
    street: &str,
    housenumber: &str,
    postcode: Option<&str>,
    city: Option<&str>,
    x: f64,
    y: f64,
) -> RawAddress {
    RawAddress {
        street: Some(street.to_string()),
        housenumber: Some(housenumber.to_string()),
        postcode: postcode.map(str::to_string),
        city: city.map(str::to_string),
        geometry: Point::new(x, y),
    }
}

#[test]
fn offline_pipeline_produces_both_archives() {
    let clip = square(0.0, 0.0, 1.0);

    let mut builder = AddressTableBuilder::new();
    builder.push(raw("Hauptplatz", "1", Some("1010"), Some("Wien"), 0.2, 0.2));
    builder.push(raw("Hauptplatz", "2", Some("1010"), None, 0.8, 0.2));
    builder.push(raw("Ring", "3", None, None, 0.2, 0.8));
    builder.push(raw("Ring", "4", Some("1010"), Some("Wien"), 0.8, 0.8));
    // duplicate location of the first row, dropped by geometry dedup
    builder.push(raw("Nebengasse", "9", Some("1020"), None, 0.2, 0.2));

    let mut addresses = builder.finish().expect("postcodes are numeric");
    addresses.dedup();
    assert_eq!(addresses.len(), 4);

    let mut cells = build_tessellation(&addresses, &clip);
    assert_eq!(cells.len(), 4);

    fill_gaps(&mut cells);
    // pass 1 propagates Wien onto the cell with postcode 1010 and no city;
    // pass 2 fills the fully blank cell from touching neighbours
    for row in &cells.rows {
        assert_eq!(row.postcode, Some(1010), "cell {}", row.id);
        assert_eq!(row.city.as_deref(), Some("Wien"), "cell {}", row.id);
    }

    // every clipped cell stays within the boundary
    for row in &cells.rows {
        assert!(row.geometry.difference(&clip).unsigned_area() < 1e-9);
    }

    let dir = tempfile::tempdir().unwrap();
    let addresses_archive = dir.path().join("addresses.gpkg.zip");
    let voronoi_archive = dir.path().join("addresses-voronoi.gpkg.zip");
    package_addresses(&addresses, &addresses_archive, "addresses.gpkg").unwrap();
    package_voronoi(&cells, &voronoi_archive, "addresses-voronoi.gpkg").unwrap();

    let count = read_single_layer_count(&addresses_archive, "addresses.gpkg", "addresses");
    assert_eq!(count, 4);
    let count = read_single_layer_count(&voronoi_archive, "addresses-voronoi.gpkg", "voronoi");
    assert_eq!(count, 4);
}

fn read_single_layer_count(
    archive: &std::path::Path,
    entry_name: &str,
    layer: &str,
) -> i64 {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    assert_eq!(zip.len(), 1, "exactly one container file per archive");

    let dir = tempfile::tempdir().unwrap();
    let extracted = dir.path().join(entry_name);
    {
        let mut entry = zip.by_name(entry_name).unwrap();
        let mut out = File::create(&extracted).unwrap();
        io::copy(&mut entry, &mut out).unwrap();
    }

    let conn = Connection::open(&extracted).unwrap();
    // postcodes must come back as clean integers
    let non_numeric: i64 = conn
        .query_row(
            &format!(
                "SELECT count(*) FROM \"{layer}\"
                 WHERE postcode IS NOT NULL AND typeof(postcode) != 'integer'"
            ),
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(non_numeric, 0);

    conn.query_row(&format!("SELECT count(*) FROM \"{layer}\""), [], |row| {
        row.get(0)
    })
    .unwrap()
}
