//! Fixed pipeline constants.
//!
//! The partition list and boundary name are deliberately hard-coded: the
//! pipeline targets exactly one country and the NUTS-3 split exists only to
//! keep each Overpass query within service limits.

use std::time::Duration;

/// Download per NUTS-3 area, to split the country into smaller portions.
pub const NUTS_AREAS: [&str; 35] = [
    "AT111", "AT112", "AT113", "AT121", "AT122", "AT123", "AT124", "AT125", "AT126", "AT127",
    "AT130", "AT211", "AT212", "AT213", "AT221", "AT222", "AT223", "AT224", "AT225", "AT226",
    "AT311", "AT312", "AT313", "AT314", "AT315", "AT321", "AT322", "AT323", "AT331", "AT332",
    "AT333", "AT334", "AT335", "AT341", "AT342",
];

/// Name of the admin-level-0 relation used to build the clip polygon.
pub const CLIP_TO_ADM0: &str = "Österreich";

/// Stem of both output archives.
pub const OUTPUT_STEM: &str = "austrian-addresses";

/// Public Overpass API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Cooldown between retries after a transient Overpass error.
pub const WAITING_TIME: Duration = Duration::from_secs(3 * 60);

/// Upper bound on attempts per query. The reference pipeline retried forever;
/// a cap keeps a dead endpoint from stalling the run indefinitely.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 480;

/// Outward buffer applied to the clip polygon, in metres (EPSG:31287).
pub const CLIP_BUFFER_M: f64 = 2000.0;

/// Simplification tolerance for the clip polygon, in metres (EPSG:31287).
pub const CLIP_SIMPLIFY_M: f64 = 2000.0;
