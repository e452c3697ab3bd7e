//! The "Standard Places Result": a flat, filterable projection of a feature.

use crate::existential::Existential;
use serde::{Deserialize, Serialize};

/// Root URL that `wof:path` values are resolved against for `mz:uri`.
pub const DATA_ROOT: &str = "https://data.whosonfirst.org/";

/// Summary record for one feature (or one alternate geometry of a feature).
///
/// Field names follow the Who's On First SPR conventions so results can be
/// serialised straight to callers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardPlacesResult {
    #[serde(rename = "wof:id")]
    pub id: i64,
    #[serde(rename = "wof:parent_id", default = "unknown_id")]
    pub parent_id: i64,
    #[serde(rename = "wof:name", default)]
    pub name: String,
    #[serde(rename = "wof:placetype", default)]
    pub placetype: String,
    #[serde(rename = "wof:country", default)]
    pub country: String,
    #[serde(rename = "wof:repo", default)]
    pub repo: String,
    #[serde(rename = "wof:path", default)]
    pub path: String,
    #[serde(rename = "mz:uri", default)]
    pub uri: String,
    #[serde(rename = "mz:latitude", default)]
    pub latitude: f64,
    #[serde(rename = "mz:longitude", default)]
    pub longitude: f64,
    #[serde(rename = "mz:min_latitude", default)]
    pub min_latitude: f64,
    #[serde(rename = "mz:min_longitude", default)]
    pub min_longitude: f64,
    #[serde(rename = "mz:max_latitude", default)]
    pub max_latitude: f64,
    #[serde(rename = "mz:max_longitude", default)]
    pub max_longitude: f64,
    #[serde(rename = "mz:is_current", default)]
    pub is_current: Existential,
    #[serde(rename = "mz:is_ceased", default)]
    pub is_ceased: Existential,
    #[serde(rename = "mz:is_deprecated", default)]
    pub is_deprecated: Existential,
    #[serde(rename = "mz:is_superseded", default)]
    pub is_superseded: Existential,
    #[serde(rename = "mz:is_superseding", default)]
    pub is_superseding: Existential,
    #[serde(rename = "wof:superseded_by", default)]
    pub superseded_by: Vec<i64>,
    #[serde(rename = "wof:supersedes", default)]
    pub supersedes: Vec<i64>,
    #[serde(rename = "wof:belongsto", default)]
    pub belongs_to: Vec<i64>,
    #[serde(rename = "wof:lastmodified", default)]
    pub last_modified: i64,
    /// Empty for the default geometry.
    #[serde(
        rename = "src:alt_label",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub alt_label: String,
}

fn unknown_id() -> i64 {
    -1
}

impl StandardPlacesResult {
    /// True when this record describes an alternate geometry.
    pub fn is_alternate(&self) -> bool {
        !self.alt_label.is_empty()
    }
}

/// An unordered set of summary records returned by a query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StandardPlacesResults {
    pub places: Vec<StandardPlacesResult>,
}

impl StandardPlacesResults {
    pub fn new(places: Vec<StandardPlacesResult>) -> Self {
        Self { places }
    }

    pub fn results(&self) -> &[StandardPlacesResult] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Ids of every place in the set, sorted ascending.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.places.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids
    }
}

impl IntoIterator for StandardPlacesResults {
    type Item = StandardPlacesResult;
    type IntoIter = std::vec::IntoIter<StandardPlacesResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.places.into_iter()
    }
}

/// Relative repository path for a record.
///
/// The id is split into groups of three digits to form the directory tree.
///
/// ```
/// use spatial_types::spr::wof_path;
///
/// assert_eq!(wof_path(1108712253, ""), "110/871/225/3/1108712253.geojson");
/// assert_eq!(
///     wof_path(101737491, "quattroshapes"),
///     "101/737/491/101737491-alt-quattroshapes.geojson"
/// );
/// ```
pub fn wof_path(id: i64, alt_label: &str) -> String {
    let digits = id.to_string();
    let tree: Vec<&str> = digits
        .as_bytes()
        .chunks(3)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();

    let fname = if alt_label.is_empty() {
        format!("{}.geojson", digits)
    } else {
        format!("{}-alt-{}.geojson", digits, alt_label)
    };

    format!("{}/{}", tree.join("/"), fname)
}

/// Absolute URI for a record, rooted at [`DATA_ROOT`].
pub fn wof_uri(id: i64, alt_label: &str) -> String {
    format!("{}{}", DATA_ROOT, wof_path(id, alt_label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wof_path_short_id() {
        assert_eq!(wof_path(1, ""), "1/1.geojson");
        assert_eq!(wof_path(1234, ""), "123/4/1234.geojson");
    }

    #[test]
    fn test_wof_uri() {
        assert_eq!(
            wof_uri(420561633, ""),
            "https://data.whosonfirst.org/420/561/633/420561633.geojson"
        );
    }

    #[test]
    fn test_spr_serialises_with_wof_names() {
        let spr = StandardPlacesResult {
            id: 420780729,
            name: "Liminal Zone of Deliciousness".to_string(),
            placetype: "microhood".to_string(),
            is_current: Existential::Unknown,
            ..Default::default()
        };

        let value = serde_json::to_value(&spr).unwrap();
        assert_eq!(value["wof:id"], 420780729);
        assert_eq!(value["wof:placetype"], "microhood");
        assert_eq!(value["mz:is_current"], -1);
        assert!(value.get("src:alt_label").is_none());
    }

    #[test]
    fn test_results_ids_sorted() {
        let results = StandardPlacesResults::new(vec![
            StandardPlacesResult {
                id: 3,
                ..Default::default()
            },
            StandardPlacesResult {
                id: 1,
                ..Default::default()
            },
        ]);
        assert_eq!(results.ids(), vec![1, 3]);
        assert_eq!(results.len(), 2);
    }
}
