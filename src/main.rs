//! Download all addresses in Austria.
//!
//! Sequential pipeline: clip polygon, reference areas, address points,
//! Voronoi tessellation, gap filling, two zipped GeoPackage outputs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use anschrift::config::{DEFAULT_ENDPOINT, DEFAULT_MAX_ATTEMPTS, OUTPUT_STEM, WAITING_TIME};
use anschrift::fetch::addresses::fetch_addresses;
use anschrift::fetch::areas::{fetch_municipalities, fetch_postcode_areas};
use anschrift::fetch::boundary::fetch_clip_polygon;
use anschrift::geometry::project::Projector;
use anschrift::package::{package_addresses, package_voronoi};
use anschrift::pip::AreaIndex;
use anschrift::reconcile::fill_gaps;
use anschrift::voronoi::build_tessellation;
use anschrift::{OverpassClient, RetryPolicy};

#[derive(Parser, Debug)]
#[command(name = "anschrift")]
#[command(about = "Build the Austrian address dataset from OpenStreetMap data")]
struct Args {
    /// Directory the two output archives are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Overpass API endpoint
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Cooldown between retries after a transient Overpass error, in seconds
    #[arg(long, default_value_t = WAITING_TIME.as_secs())]
    cooldown_secs: u64,

    /// Attempts per query before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let client = OverpassClient::new(&args.endpoint)?;
    let retry = RetryPolicy {
        cooldown: Duration::from_secs(args.cooldown_secs),
        max_attempts: args.max_attempts,
    };
    let projector = Projector::austria_lambert().context("projection setup failed")?;

    let clip = fetch_clip_polygon(&client, &retry, &projector)?;

    let postcode_areas = AreaIndex::build(fetch_postcode_areas(&client, &retry)?);
    let municipalities = AreaIndex::build(fetch_municipalities(&client, &retry)?);

    let addresses = fetch_addresses(&client, &retry, &postcode_areas, &municipalities)?;
    info!(rows = addresses.len(), "address table complete");

    package_addresses(
        &addresses,
        &args.output_dir.join(format!("{OUTPUT_STEM}.gpkg.zip")),
        &format!("{OUTPUT_STEM}.gpkg"),
    )?;

    let mut cells = build_tessellation(&addresses, &clip);
    fill_gaps(&mut cells);

    package_voronoi(
        &cells,
        &args
            .output_dir
            .join(format!("{OUTPUT_STEM}-voronoi.gpkg.zip")),
        &format!("{OUTPUT_STEM}-voronoi.gpkg"),
    )?;

    info!("done");
    Ok(())
}
