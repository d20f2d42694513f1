//! Output packaging: GeoPackage inside a deflate zip archive.
//!
//! The container file is written into a scratch directory that is removed
//! when the `TempDir` drops, success or not. The archive lands at its final
//! path only after the container was written completely, so a failed run
//! leaves any previous output untouched.

pub mod gpkg;

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::table::{AddressTable, VoronoiTable};

/// Package the address table as `<archive>` containing `<entry_name>`.
pub fn package_addresses(table: &AddressTable, archive: &Path, entry_name: &str) -> Result<()> {
    package(archive, entry_name, |gpkg_path| {
        gpkg::write_addresses(gpkg_path, "addresses", table)
    })
}

/// Package the tessellation table.
pub fn package_voronoi(table: &VoronoiTable, archive: &Path, entry_name: &str) -> Result<()> {
    package(archive, entry_name, |gpkg_path| {
        gpkg::write_voronoi(gpkg_path, "voronoi", table)
    })
}

fn package(
    archive: &Path,
    entry_name: &str,
    write_container: impl FnOnce(&Path) -> Result<()>,
) -> Result<()> {
    let scratch = tempfile::Builder::new()
        .prefix("anschrift-")
        .tempdir()
        .context("failed to create scratch directory")?;
    let container = scratch.path().join(entry_name);
    write_container(&container)?;
    zip_single_file(&container, archive, entry_name)?;
    info!(archive = %archive.display(), "archive written");
    Ok(())
}

fn zip_single_file(source: &Path, archive: &Path, entry_name: &str) -> Result<()> {
    let file = File::create(archive)
        .with_context(|| format!("failed to create {}", archive.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(entry_name, options)?;
    let mut input = File::open(source)
        .with_context(|| format!("failed to reopen {}", source.display()))?;
    io::copy(&mut input, &mut writer).context("failed to compress container file")?;
    writer.finish()?;
    Ok(())
}
