//! Projection helpers for the clip polygon.
//!
//! Buffering and simplification tolerances are metric, so the boundary is
//! moved into the Austrian Lambert conformal conic system (EPSG:31287) for
//! those two steps and straight back to WGS84 afterwards. Nothing else in the
//! pipeline ever leaves EPSG:4326.

use geo::{MapCoords, Simplify};
use geo_types::{Coord, MultiPolygon};
use proj4rs::transform::transform;
use proj4rs::Proj;
use thiserror::Error;

const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";
const AUSTRIA_LAMBERT: &str = "+proj=lcc +lat_0=47.5 +lon_0=13.33333333333333 \
    +lat_1=49 +lat_2=46 +x_0=400000 +y_0=400000 +ellps=bessel \
    +towgs84=577.326,90.129,463.919,5.137,1.474,5.297,2.4232 +units=m +no_defs";

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("invalid projection definition: {0}")]
    Definition(proj4rs::errors::Error),
    #[error("coordinate transform failed: {0}")]
    Transform(proj4rs::errors::Error),
}

/// WGS84 ⇄ EPSG:31287 transformer.
pub struct Projector {
    wgs84: Proj,
    lambert: Proj,
}

impl Projector {
    pub fn austria_lambert() -> Result<Self, ProjectionError> {
        Ok(Self {
            wgs84: Proj::from_proj_string(WGS84).map_err(ProjectionError::Definition)?,
            lambert: Proj::from_proj_string(AUSTRIA_LAMBERT).map_err(ProjectionError::Definition)?,
        })
    }

    /// Buffer outward and simplify in metric space, then reproject back.
    ///
    /// The slack lets address points sitting just outside the nominal national
    /// boundary survive the later clip step.
    pub fn buffer_and_simplify(
        &self,
        geometry: &MultiPolygon<f64>,
        distance_m: f64,
        tolerance_m: f64,
    ) -> Result<MultiPolygon<f64>, ProjectionError> {
        use geo::HasDimensions;
        if geometry.is_empty() {
            // nothing to buffer; the clip step downstream will drop everything
            return Ok(MultiPolygon::new(vec![]));
        }
        let projected = self.try_map(geometry, true)?;
        let buffered = geo_buffer::buffer_multi_polygon(&projected, distance_m);
        let simplified = buffered.simplify(tolerance_m);
        self.try_map(&simplified, false)
    }

    fn try_map(
        &self,
        geometry: &MultiPolygon<f64>,
        forward: bool,
    ) -> Result<MultiPolygon<f64>, ProjectionError> {
        geometry.try_map_coords(|coord| self.project(coord, forward))
    }

    fn project(&self, coord: Coord<f64>, forward: bool) -> Result<Coord<f64>, ProjectionError> {
        // proj4rs speaks radians on the geographic side.
        let mut point = if forward {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        let (src, dst) = if forward {
            (&self.wgs84, &self.lambert)
        } else {
            (&self.lambert, &self.wgs84)
        };
        transform(src, dst, &mut point).map_err(ProjectionError::Transform)?;
        if forward {
            Ok(Coord {
                x: point.0,
                y: point.1,
            })
        } else {
            Ok(Coord {
                x: point.0.to_degrees(),
                y: point.1.to_degrees(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Coord};
    use geo_types::{LineString, Polygon};

    fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::new(vec![
                Coord { x: x0, y: y0 },
                Coord { x: x1, y: y0 },
                Coord { x: x1, y: y1 },
                Coord { x: x0, y: y1 },
                Coord { x: x0, y: y0 },
            ]),
            vec![],
        )])
    }

    #[test]
    fn round_trips_a_vienna_coordinate() {
        let projector = Projector::austria_lambert().unwrap();
        let input = Coord { x: 16.37, y: 48.21 };
        let projected = projector.project(input, true).unwrap();
        // Austria Lambert easting/northing near Vienna, sanity range only.
        assert!(projected.x > 500_000.0 && projected.x < 700_000.0);
        assert!(projected.y > 400_000.0 && projected.y < 600_000.0);
        let back = projector.project(projected, false).unwrap();
        approx::assert_relative_eq!(back.x, input.x, epsilon = 1e-6);
        approx::assert_relative_eq!(back.y, input.y, epsilon = 1e-6);
    }

    #[test]
    fn buffered_boundary_contains_the_original() {
        let projector = Projector::austria_lambert().unwrap();
        // A small rectangle in eastern Austria.
        let original = rectangle(16.2, 48.1, 16.4, 48.3);
        let buffered = projector
            .buffer_and_simplify(&original, 2000.0, 2000.0)
            .unwrap();
        // 2 km of slack must cover every original corner.
        for corner in [
            Coord { x: 16.2, y: 48.1 },
            Coord { x: 16.4, y: 48.3 },
        ] {
            assert!(buffered.contains(&geo_types::Point::from(corner)));
        }
    }
}
