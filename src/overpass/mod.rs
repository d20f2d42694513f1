//! Overpass API access: query client, response model and retry policy.

pub mod client;
pub mod model;
pub mod retry;

pub use client::{OverpassClient, OverpassError};
pub use model::{Coordinate, Element, Member, OverpassResponse};
pub use retry::RetryPolicy;
