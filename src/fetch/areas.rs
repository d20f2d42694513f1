//! Reference area fetches: postal-code areas and municipalities.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::config::NUTS_AREAS;
use crate::overpass::{OverpassClient, RetryPolicy};
use crate::table::{dedup_municipalities, dedup_postcode_areas, Municipality, PostcodeArea};

use super::relation_footprint;

/// Free-text `note` tag on postal-code relations: leading 4-digit code, a
/// space, then the city name.
static POSTCODE_NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4}) (.*)$").unwrap());

/// City name from the `note` tag, or `None` when absent or non-matching.
/// Never inferred from anything else at this stage.
fn city_from_note(note: Option<&str>) -> Option<String> {
    let captures = POSTCODE_NOTE_RE.captures(note?)?;
    Some(captures[2].to_string())
}

/// Fetch postal-code boundary relations, one query per NUTS-3 partition.
pub fn fetch_postcode_areas(
    client: &OverpassClient,
    retry: &RetryPolicy,
) -> Result<Vec<PostcodeArea>> {
    let mut rows = Vec::new();

    for area in NUTS_AREAS {
        debug!(partition = area, "fetching postal-code areas");
        let query = format!(
            "[out:json][timeout:3600];\
             area[\"ref:nuts:3\"=\"{area}\"];\
             rel(area)[\"boundary\"=\"postal_code\"];\
             out geom;"
        );
        let response = retry
            .run(|| client.query(&query))
            .with_context(|| format!("postal-code query for {area} failed"))?;

        for relation in response.relations() {
            rows.push(PostcodeArea {
                postcode: relation.tag("postal_code").map(str::to_string),
                city: city_from_note(relation.tag("note")),
                geometry: relation_footprint(relation.members()),
            });
        }
    }

    let rows = dedup_postcode_areas(rows);
    info!(rows = rows.len(), "postal-code areas fetched");
    Ok(rows)
}

/// Fetch admin-level-8 boundaries, one query per NUTS-3 partition. Relations
/// without a `name` tag are skipped rather than aborting the fetch.
pub fn fetch_municipalities(
    client: &OverpassClient,
    retry: &RetryPolicy,
) -> Result<Vec<Municipality>> {
    let mut rows = Vec::new();

    for area in NUTS_AREAS {
        debug!(partition = area, "fetching municipalities");
        let query = format!(
            "[out:json][timeout:3600];\
             area[\"ref:nuts:3\"=\"{area}\"];\
             rel(area)[\"boundary\"=\"administrative\"][\"admin_level\"=\"8\"];\
             out geom;"
        );
        let response = retry
            .run(|| client.query(&query))
            .with_context(|| format!("municipality query for {area} failed"))?;

        for relation in response.relations() {
            let Some(name) = relation.tag("name") else {
                debug!(id = relation.id(), "municipality without name, skipped");
                continue;
            };
            rows.push(Municipality {
                city: name.to_string(),
                geometry: relation_footprint(relation.members()),
            });
        }
    }

    let rows = dedup_municipalities(rows);
    info!(rows = rows.len(), "municipalities fetched");
    Ok(rows)
}
