//! National boundary fetch, producing the clip polygon.

use anyhow::{Context, Result};
use geo_types::MultiPolygon;
use tracing::{info, warn};

use crate::config::{CLIP_BUFFER_M, CLIP_SIMPLIFY_M, CLIP_TO_ADM0};
use crate::geometry::project::Projector;
use crate::geometry::{merge_lines_to_polygons, union_polygons};
use crate::overpass::{OverpassClient, RetryPolicy};

use super::outer_lines;

/// Fetch the admin-level-0 relation and turn its outer rings into a buffered,
/// simplified clip polygon (2 km slack in EPSG:31287, returned in EPSG:4326).
///
/// If the relation yields no closable rings the result is empty and the later
/// clip step removes all geometry; that is a data-quality failure of the
/// source, not an error here.
pub fn fetch_clip_polygon(
    client: &OverpassClient,
    retry: &RetryPolicy,
    projector: &Projector,
) -> Result<MultiPolygon<f64>> {
    info!(name = CLIP_TO_ADM0, "fetching national boundary");
    let query = format!(
        "[out:json][timeout:25];\
         rel[\"name\"=\"{CLIP_TO_ADM0}\"][\"boundary\"=\"administrative\"];\
         out geom;"
    );
    let response = retry
        .run(|| client.query(&query))
        .context("boundary query failed")?;

    // All outer fragments of all matching relations feed one ring merge, as
    // several relations can share the same name.
    let lines: Vec<_> = response
        .relations()
        .flat_map(|relation| outer_lines(relation.members()))
        .collect();
    let polygons = merge_lines_to_polygons(lines);
    if polygons.is_empty() {
        warn!("boundary relation produced no closed rings; clip polygon is empty");
    }
    let boundary = union_polygons(polygons);

    let clip = projector
        .buffer_and_simplify(&boundary, CLIP_BUFFER_M, CLIP_SIMPLIFY_M)
        .context("failed to buffer clip polygon")?;
    info!(polygons = clip.0.len(), "clip polygon ready");
    Ok(clip)
}
