//! Structural GeoJSON checks.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Geometry constraint applied to every feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryRule {
    /// Any geometry object (or null).
    #[default]
    Any,
    /// A Point with exactly two numeric coordinates.
    Point,
}

/// Check a parsed GeoJSON document.
///
/// Returns the number of features, or a description of the first problem.
pub fn check_document(
    doc: &Value,
    geometry: GeometryRule,
    required_keys: &[String],
) -> Result<usize, String> {
    match doc.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = doc
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| "FeatureCollection has no 'features' array".to_string())?;

            for (i, feature) in features.iter().enumerate() {
                check_feature(feature, geometry, required_keys)
                    .map_err(|e| format!("feature {}: {}", describe(feature, i), e))?;
            }
            Ok(features.len())
        }
        Some("Feature") => {
            check_feature(doc, geometry, required_keys)?;
            Ok(1)
        }
        Some(other) => Err(format!("unsupported GeoJSON type '{}'", other)),
        None => Err("missing top-level 'type'".to_string()),
    }
}

/// Feature label for diagnostics: its `id` property when present.
fn describe(feature: &Value, index: usize) -> String {
    match feature
        .get("properties")
        .and_then(|p| p.get("id"))
        .and_then(Value::as_str)
    {
        Some(id) => format!("{} ('{}')", index, id),
        None => index.to_string(),
    }
}

fn check_feature(
    feature: &Value,
    rule: GeometryRule,
    required_keys: &[String],
) -> Result<(), String> {
    if feature.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err("type is not 'Feature'".to_string());
    }

    let geometry = feature.get("geometry").unwrap_or(&Value::Null);
    match rule {
        GeometryRule::Any => {
            if !geometry.is_null() && geometry.get("type").and_then(Value::as_str).is_none() {
                return Err("geometry has no 'type'".to_string());
            }
        }
        GeometryRule::Point => check_point(geometry)?,
    }

    if required_keys.is_empty() {
        return Ok(());
    }

    let properties = feature
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| "missing 'properties'".to_string())?;

    for key in required_keys {
        match properties.get(key) {
            None | Some(Value::Null) => return Err(format!("missing property '{}'", key)),
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(format!("empty property '{}'", key))
            }
            Some(_) => {}
        }
    }

    Ok(())
}

fn check_point(geometry: &Value) -> Result<(), String> {
    if geometry.get("type").and_then(Value::as_str) != Some("Point") {
        return Err("geometry is not a Point".to_string());
    }

    let coordinates = geometry
        .get("coordinates")
        .and_then(Value::as_array)
        .ok_or_else(|| "Point has no coordinates".to_string())?;

    if coordinates.len() != 2 {
        return Err(format!(
            "Point has {} coordinates, expected 2",
            coordinates.len()
        ));
    }
    if !coordinates.iter().all(Value::is_number) {
        return Err("Point coordinates must be two numbers".to_string());
    }

    Ok(())
}
