//! Anschrift - assembles a best-effort national address dataset from
//! OpenStreetMap data.
//!
//! This library provides the fetch, reconciliation and packaging stages used
//! by the `anschrift` binary.

pub mod config;
pub mod fetch;
pub mod geometry;
pub mod overpass;
pub mod package;
pub mod pip;
pub mod reconcile;
pub mod table;
pub mod voronoi;

pub use overpass::{OverpassClient, OverpassError, RetryPolicy};
pub use table::{
    AddressRecord, AddressTable, Municipality, PostcodeArea, VoronoiRecord, VoronoiTable,
};
