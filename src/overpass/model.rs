//! Serde model for Overpass JSON responses.

use std::collections::BTreeMap;

use serde::Deserialize;

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl OverpassResponse {
    /// Relations only, in response order.
    pub fn relations(&self) -> impl Iterator<Item = &Element> {
        self.elements
            .iter()
            .filter(|e| matches!(e, Element::Relation { .. }))
    }
}

/// A lat/lon pair as Overpass serializes it.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A relation member. Only the role and the inlined `out geom` coordinate
/// trace matter here; member ids are not used.
#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub geometry: Option<Vec<Coordinate>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Node {
        id: u64,
        #[serde(default)]
        lat: Option<f64>,
        #[serde(default)]
        lon: Option<f64>,
        #[serde(default)]
        tags: Tags,
    },
    Way {
        id: u64,
        #[serde(default)]
        center: Option<Coordinate>,
        #[serde(default)]
        tags: Tags,
    },
    Relation {
        id: u64,
        #[serde(default)]
        center: Option<Coordinate>,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: Tags,
    },
}

impl Element {
    pub fn id(&self) -> u64 {
        match self {
            Element::Node { id, .. } | Element::Way { id, .. } | Element::Relation { id, .. } => {
                *id
            }
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            Element::Node { tags, .. }
            | Element::Way { tags, .. }
            | Element::Relation { tags, .. } => tags,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags().get(key).map(String::as_str)
    }

    /// Representative position as (lon, lat). A pre-computed `center` (ways
    /// and relations queried with `out center`) wins over a node's own
    /// coordinate; `None` means the element carries no location at all.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Element::Node { lat, lon, .. } => match (lon, lat) {
                (Some(lon), Some(lat)) => Some((*lon, *lat)),
                _ => None,
            },
            Element::Way { center, .. } | Element::Relation { center, .. } => {
                center.map(|c| (c.lon, c.lat))
            }
        }
    }

    pub fn members(&self) -> &[Member] {
        match self {
            Element::Relation { members, .. } => members,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_elements() {
        let json = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 48.2, "lon": 16.3,
                 "tags": {"addr:housenumber": "12"}},
                {"type": "way", "id": 2, "center": {"lat": 47.0, "lon": 15.4},
                 "tags": {"addr:street": "Hauptplatz"}},
                {"type": "relation", "id": 3,
                 "members": [
                    {"type": "way", "ref": 9, "role": "outer",
                     "geometry": [{"lat": 0.0, "lon": 0.0}, {"lat": 1.0, "lon": 1.0}]},
                    {"type": "node", "ref": 10, "role": "admin_centre"}
                 ],
                 "tags": {"boundary": "administrative"}}
            ]
        }"#;
        let resp: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.elements.len(), 3);
        assert_eq!(resp.elements[0].position(), Some((16.3, 48.2)));
        assert_eq!(resp.elements[0].tag("addr:housenumber"), Some("12"));
        assert_eq!(resp.elements[1].position(), Some((15.4, 47.0)));
        assert_eq!(resp.relations().count(), 1);

        let members = resp.elements[2].members();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role, "outer");
        assert_eq!(members[0].geometry.as_ref().unwrap().len(), 2);
        assert!(members[1].geometry.is_none());
    }

    #[test]
    fn node_without_coordinates_has_no_position() {
        let json = r#"{"elements": [{"type": "node", "id": 5}]}"#;
        let resp: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.elements[0].position(), None);
    }
}
