//! Overpass fetch stages: national boundary, reference areas, addresses.

pub mod addresses;
pub mod areas;
pub mod boundary;

use geo_types::{Coord, MultiPolygon};

use crate::geometry::{merge_lines_to_polygons, normalize, union_polygons};
use crate::overpass::Member;

/// Coordinate runs of every `outer` member that carries geometry.
pub(crate) fn outer_lines(members: &[Member]) -> Vec<Vec<Coord<f64>>> {
    members
        .iter()
        .filter(|member| member.role == "outer")
        .filter_map(|member| member.geometry.as_ref())
        .map(|trace| {
            trace
                .iter()
                .map(|c| Coord { x: c.lon, y: c.lat })
                .collect()
        })
        .collect()
}

/// Assemble a boundary relation's footprint from its outer members. Relations
/// without a single closable ring come out empty, never as an error.
pub(crate) fn relation_footprint(members: &[Member]) -> MultiPolygon<f64> {
    let polygons = merge_lines_to_polygons(outer_lines(members));
    normalize(&union_polygons(polygons))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::Coordinate;
    use geo::{Area, HasDimensions};

    fn member(role: &str, trace: &[(f64, f64)]) -> Member {
        Member {
            role: role.to_string(),
            geometry: Some(
                trace
                    .iter()
                    .map(|&(lon, lat)| Coordinate { lat, lon })
                    .collect(),
            ),
        }
    }

    #[test]
    fn footprint_uses_only_outer_members() {
        let members = vec![
            member("outer", &[(0., 0.), (2., 0.), (2., 1.)]),
            member("outer", &[(2., 1.), (0., 1.), (0., 0.)]),
            member("inner", &[(0.2, 0.2), (0.4, 0.2), (0.4, 0.4), (0.2, 0.4), (0.2, 0.2)]),
        ];
        let footprint = relation_footprint(&members);
        assert!((footprint.unsigned_area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn relation_without_rings_is_empty() {
        let members = vec![member("outer", &[(0., 0.), (1., 0.)])];
        assert!(relation_footprint(&members).is_empty());
    }

    #[test]
    fn members_without_geometry_are_ignored() {
        let members = vec![Member {
            role: "outer".to_string(),
            geometry: None,
        }];
        assert!(relation_footprint(&members).is_empty());
    }
}
