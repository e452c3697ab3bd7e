//! Who's On First GeoJSON decoding.
//!
//! Turns a GeoJSON `Feature` into a [`Feature`] the database can index:
//! numeric id, alt label, typed polygonal geometry, per-part bounding boxes
//! and the Standard Places Result built from the feature's properties.

use crate::compute::geometry::FeatureGeometry;
use crate::error::{Result, SpatialError};
use crate::feature::Feature;
use geojson::{GeoJson, JsonObject, JsonValue};
use spatial_types::existential::Existential;
use spatial_types::spr::{StandardPlacesResult, wof_path, wof_uri};

/// EDTF placeholders meaning "we don't know".
const EDTF_UNKNOWN: [&str; 2] = ["", "uuuu"];
/// EDTF placeholders meaning "still ongoing".
const EDTF_OPEN: [&str; 2] = ["open", ".."];

/// Parse a single GeoJSON Feature document.
pub fn parse_feature(body: &str) -> Result<geojson::Feature> {
    match body.parse::<GeoJson>()? {
        GeoJson::Feature(feature) => Ok(feature),
        GeoJson::FeatureCollection(_) => Err(SpatialError::InvalidFeature(
            "expected a Feature, found a FeatureCollection".to_string(),
        )),
        GeoJson::Geometry(_) => Err(SpatialError::InvalidFeature(
            "expected a Feature, found a bare Geometry".to_string(),
        )),
    }
}

/// Parse a FeatureCollection document (a lone Feature is accepted too).
pub fn parse_feature_collection(body: &str) -> Result<Vec<geojson::Feature>> {
    match body.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(SpatialError::InvalidFeature(
            "expected a FeatureCollection, found a bare Geometry".to_string(),
        )),
    }
}

/// Parse and decode a single Feature document.
pub fn feature_from_str(body: &str) -> Result<Feature> {
    decode_feature(parse_feature(body)?)
}

/// Decode a parsed GeoJSON feature.
///
/// Fails with [`SpatialError::UnsupportedGeometry`] for anything other than a
/// Polygon or MultiPolygon, so callers can skip those features.
pub fn decode_feature(feature: geojson::Feature) -> Result<Feature> {
    let empty = JsonObject::new();
    let props = feature.properties.as_ref().unwrap_or(&empty);

    let wof_id = int_property(props, "wof:id")
        .or_else(|| feature.id.as_ref().and_then(id_value))
        .ok_or_else(|| SpatialError::InvalidFeature("missing wof:id".to_string()))?;

    let alt_label = str_property(props, "src:alt_label")
        .or_else(|| str_property(props, "wof:alt_label"))
        .unwrap_or_default()
        .to_string();

    let Some(geometry) = feature.geometry else {
        return Err(SpatialError::UnsupportedGeometry("none".to_string()));
    };
    let geometry = FeatureGeometry::try_from(geo::Geometry::<f64>::try_from(geometry.value)?)?;

    let spr = build_spr(wof_id, &alt_label, props, &geometry);
    Ok(Feature::new(wof_id, alt_label, geometry, spr))
}

/// Build the summary record for a feature.
pub fn build_spr(
    wof_id: i64,
    alt_label: &str,
    props: &JsonObject,
    geometry: &FeatureGeometry,
) -> StandardPlacesResult {
    let superseded_by = int_list_property(props, "wof:superseded_by");
    let supersedes = int_list_property(props, "wof:supersedes");

    let mut spr = StandardPlacesResult {
        id: wof_id,
        parent_id: int_property(props, "wof:parent_id").unwrap_or(-1),
        name: str_property(props, "wof:name").unwrap_or_default().to_string(),
        placetype: str_property(props, "wof:placetype")
            .unwrap_or_default()
            .to_string(),
        country: str_property(props, "wof:country")
            .unwrap_or_default()
            .to_string(),
        repo: str_property(props, "wof:repo").unwrap_or_default().to_string(),
        path: wof_path(wof_id, alt_label),
        uri: wof_uri(wof_id, alt_label),
        is_current: flag_property(props, "mz:is_current").unwrap_or_default(),
        is_ceased: flag_property(props, "mz:is_ceased")
            .unwrap_or_else(|| edtf_flag(props, "edtf:cessation")),
        is_deprecated: flag_property(props, "mz:is_deprecated")
            .unwrap_or_else(|| edtf_flag(props, "edtf:deprecated")),
        is_superseded: Existential::from_bool(!superseded_by.is_empty()),
        is_superseding: Existential::from_bool(!supersedes.is_empty()),
        superseded_by,
        supersedes,
        belongs_to: int_list_property(props, "wof:belongsto"),
        last_modified: int_property(props, "wof:lastmodified").unwrap_or_default(),
        alt_label: alt_label.to_string(),
        ..Default::default()
    };

    if let Some(bounds) = geometry.bounds() {
        spr.min_longitude = bounds.min_x();
        spr.min_latitude = bounds.min_y();
        spr.max_longitude = bounds.max_x();
        spr.max_latitude = bounds.max_y();

        let center = bounds.center();
        spr.longitude = center.x();
        spr.latitude = center.y();
    }

    let label = float_property(props, "lbl:latitude").zip(float_property(props, "lbl:longitude"));
    let centroid =
        float_property(props, "geom:latitude").zip(float_property(props, "geom:longitude"));

    if let Some((latitude, longitude)) = label.or(centroid) {
        spr.latitude = latitude;
        spr.longitude = longitude;
    }

    spr
}

fn id_value(id: &geojson::feature::Id) -> Option<i64> {
    match id {
        geojson::feature::Id::Number(number) => number.as_i64(),
        geojson::feature::Id::String(s) => s.parse().ok(),
    }
}

fn int_value(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn int_property(props: &JsonObject, key: &str) -> Option<i64> {
    props.get(key).and_then(int_value)
}

fn float_property(props: &JsonObject, key: &str) -> Option<f64> {
    match props.get(key)? {
        JsonValue::Number(number) => number.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn str_property<'a>(props: &'a JsonObject, key: &str) -> Option<&'a str> {
    props.get(key).and_then(JsonValue::as_str)
}

fn int_list_property(props: &JsonObject, key: &str) -> Vec<i64> {
    props
        .get(key)
        .and_then(JsonValue::as_array)
        .map(|values| values.iter().filter_map(int_value).collect())
        .unwrap_or_default()
}

fn flag_property(props: &JsonObject, key: &str) -> Option<Existential> {
    int_property(props, key).and_then(Existential::from_flag)
}

fn edtf_flag(props: &JsonObject, key: &str) -> Existential {
    match str_property(props, key) {
        None => Existential::Unknown,
        Some(date) if EDTF_UNKNOWN.contains(&date) => Existential::Unknown,
        Some(date) if EDTF_OPEN.contains(&date) => Existential::False,
        Some(_) => Existential::True,
    }
}
