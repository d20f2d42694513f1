//! Address point fetch with attribute back-fill from reference areas.

use anyhow::{Context, Result};
use geo_types::Point;
use tracing::{debug, info};

use crate::config::NUTS_AREAS;
use crate::geometry::empty_point;
use crate::overpass::{Element, OverpassClient, RetryPolicy};
use crate::pip::AreaIndex;
use crate::table::{AddressTable, AddressTableBuilder, Municipality, PostcodeArea, RawAddress};

/// Fetch every feature tagged with a house number, one query per partition,
/// and finalize the table (postcode coercion, geometry and attribute dedup).
pub fn fetch_addresses(
    client: &OverpassClient,
    retry: &RetryPolicy,
    postcode_areas: &AreaIndex<PostcodeArea>,
    municipalities: &AreaIndex<Municipality>,
) -> Result<AddressTable> {
    let mut builder = AddressTableBuilder::new();

    for area in NUTS_AREAS {
        debug!(partition = area, "fetching addresses");
        let query = format!(
            "[out:json][timeout:3600];\
             area[\"ref:nuts:3\"=\"{area}\"];\
             nwr[\"addr:housenumber\"](area);\
             out center;"
        );
        let response = retry
            .run(|| client.query(&query))
            .with_context(|| format!("address query for {area} failed"))?;

        for element in &response.elements {
            builder.push(resolve_address(element, postcode_areas, municipalities));
        }
        debug!(partition = area, rows = builder.len(), "partition done");
    }

    let mut table = builder
        .finish()
        .context("address table failed schema validation")?;
    let before = table.len();
    table.dedup();
    info!(
        rows = table.len(),
        dropped = before - table.len(),
        "address table ready"
    );
    Ok(table)
}

/// Turn one Overpass element into a raw address row.
///
/// Geometry: pre-computed center first (ways/relations), then a node's own
/// coordinate, then the empty-point placeholder. Missing postcode/city tags
/// are back-filled by containment against the postal-code areas; a city still
/// missing after that falls back to the municipalities.
fn resolve_address(
    element: &Element,
    postcode_areas: &AreaIndex<PostcodeArea>,
    municipalities: &AreaIndex<Municipality>,
) -> RawAddress {
    let geometry = element
        .position()
        .map(|(lon, lat)| Point::new(lon, lat))
        .unwrap_or_else(empty_point);

    let street = element.tag("addr:street").map(str::to_string);
    let housenumber = element.tag("addr:housenumber").map(str::to_string);

    let containing = postcode_areas.locate(&geometry);

    let postcode = element
        .tag("addr:postcode")
        .map(str::to_string)
        .or_else(|| containing.and_then(|area| area.postcode.clone()));

    let city = element
        .tag("addr:city")
        .map(str::to_string)
        .or_else(|| containing.and_then(|area| area.city.clone()))
        .or_else(|| municipalities.locate(&geometry).map(|m| m.city.clone()));

    RawAddress {
        street,
        housenumber,
        postcode,
        city,
        geometry,
    }
}
