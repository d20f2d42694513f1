//! Minimal GeoPackage writer.
//!
//! Creates a standard container (application id, spatial ref system
//! table, contents and geometry-column registry) with one feature table, all
//! in EPSG:4326. Geometries are stored as standard GeoPackage blobs: the
//! 8-byte `GP` header followed by little-endian WKB.

use std::path::Path;

use anyhow::{Context, Result};
use geo_types::Geometry;
use geozero::{CoordDimensions, ToWkb};
use rusqlite::Connection;

use crate::table::{AddressTable, VoronoiTable};

const SRS_ID: i32 = 4326;

/// Write the address table as a point layer.
pub fn write_addresses(path: &Path, layer: &str, table: &AddressTable) -> Result<()> {
    let mut conn = open_container(path)?;
    conn.execute_batch(&format!(
        "CREATE TABLE \"{layer}\" (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            street TEXT,
            housenumber TEXT,
            postcode INTEGER,
            city TEXT,
            geom BLOB
        );"
    ))?;
    register_layer(&conn, layer, "POINT")?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{layer}\" (street, housenumber, postcode, city, geom)
             VALUES (?1, ?2, ?3, ?4, ?5)"
        ))?;
        for row in &table.rows {
            let blob = geometry_blob(&Geometry::Point(row.geometry))?;
            stmt.execute(rusqlite::params![
                row.street,
                row.housenumber,
                row.postcode,
                row.city,
                blob,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Write the tessellation table as a multipolygon layer.
pub fn write_voronoi(path: &Path, layer: &str, table: &VoronoiTable) -> Result<()> {
    let mut conn = open_container(path)?;
    conn.execute_batch(&format!(
        "CREATE TABLE \"{layer}\" (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            id INTEGER,
            street TEXT,
            housenumber TEXT,
            postcode INTEGER,
            city TEXT,
            geom BLOB
        );"
    ))?;
    register_layer(&conn, layer, "MULTIPOLYGON")?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{layer}\" (id, street, housenumber, postcode, city, geom)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ))?;
        for row in &table.rows {
            let blob = geometry_blob(&Geometry::MultiPolygon(row.geometry.clone()))?;
            stmt.execute(rusqlite::params![
                row.id as i64,
                row.street,
                row.housenumber,
                row.postcode,
                row.city,
                blob,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn open_container(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    conn.execute_batch(
        "PRAGMA application_id = 0x47504B47;
         PRAGMA user_version = 10300;
         CREATE TABLE gpkg_spatial_ref_sys (
            srs_name TEXT NOT NULL,
            srs_id INTEGER PRIMARY KEY,
            organization TEXT NOT NULL,
            organization_coordsys_id INTEGER NOT NULL,
            definition TEXT NOT NULL,
            description TEXT
         );
         INSERT INTO gpkg_spatial_ref_sys VALUES
            ('Undefined Cartesian SRS', -1, 'NONE', -1, 'undefined', NULL),
            ('Undefined Geographic SRS', 0, 'NONE', 0, 'undefined', NULL),
            ('WGS 84 geodetic', 4326, 'EPSG', 4326,
             'GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]',
             'longitude/latitude coordinates in decimal degrees');
         CREATE TABLE gpkg_contents (
            table_name TEXT NOT NULL PRIMARY KEY,
            data_type TEXT NOT NULL,
            identifier TEXT UNIQUE,
            description TEXT DEFAULT '',
            last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE,
            srs_id INTEGER
         );
         CREATE TABLE gpkg_geometry_columns (
            table_name TEXT NOT NULL,
            column_name TEXT NOT NULL,
            geometry_type_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL,
            z TINYINT NOT NULL,
            m TINYINT NOT NULL,
            CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
         );",
    )?;
    Ok(conn)
}

fn register_layer(conn: &Connection, layer: &str, geometry_type: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id)
         VALUES (?1, 'features', ?1, ?2)",
        rusqlite::params![layer, SRS_ID],
    )?;
    conn.execute(
        "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', ?2, ?3, 0, 0)",
        rusqlite::params![layer, geometry_type, SRS_ID],
    )?;
    Ok(())
}

/// Standard GeoPackage geometry blob: magic, version, flags (little-endian,
/// no envelope), srs id, then WKB.
pub fn geometry_blob(geometry: &Geometry<f64>) -> Result<Vec<u8>> {
    let wkb = geometry
        .to_wkb(CoordDimensions::xy())
        .map_err(|e| anyhow::anyhow!("WKB encoding failed: {e}"))?;
    let mut blob = Vec::with_capacity(8 + wkb.len());
    blob.extend_from_slice(b"GP");
    blob.push(0); // version 1
    blob.push(0b0000_0001); // little-endian header, no envelope
    blob.extend_from_slice(&SRS_ID.to_le_bytes());
    blob.extend_from_slice(&wkb);
    Ok(blob)
}
