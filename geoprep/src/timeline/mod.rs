//! Campaign timeline → events GeoJSON.
//!
//! The timeline is a JSON document with a main `events` list and an
//! auxiliary `schwarzenberg_operations.events` list. Every event becomes a
//! Point feature at `[lon, lat]` with its nested participant, casualty and
//! weather records flattened into plain properties.

mod stats;

pub use stats::EventStatistics;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::validation::{check_document, GeometryRule};

/// Properties every event feature must carry.
pub const REQUIRED_EVENT_KEYS: &[&str] = &["id", "date"];

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid timeline JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("timeline must be a JSON object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, TimelineError>;

/// Read and parse a timeline file.
pub fn load_timeline(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|source| TimelineError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Map a timeline document to an events FeatureCollection.
pub fn convert(timeline: &Value) -> Result<Value> {
    let timeline = timeline.as_object().ok_or(TimelineError::NotAnObject)?;

    let main = timeline.get("events").and_then(Value::as_array);
    let auxiliary = timeline
        .get("schwarzenberg_operations")
        .and_then(|ops| ops.get("events"))
        .and_then(Value::as_array);

    let features: Vec<Value> = main
        .into_iter()
        .chain(auxiliary)
        .flatten()
        .map(event_to_feature)
        .collect();

    Ok(json!({
        "type": "FeatureCollection",
        "metadata": {
            "title": "Napoleon's 1812 Russian Campaign - Events",
            "description": "Historical events from Napoleon's 1812 invasion of Russia",
            "campaign": field(timeline, "campaign"),
            "date_range": field(timeline, "date_range"),
            "total_events": features.len(),
            "source": field(timeline, "source"),
            "generated_at": Local::now().to_rfc3339(),
            "coordinate_system": "WGS84",
        },
        "features": features,
    }))
}

/// Structural problems in an events collection, one entry per feature.
///
/// Empty when every feature is a Point with two numeric coordinates and
/// non-empty `id` and `date`.
pub fn check_events(collection: &Value) -> Vec<String> {
    let keys: Vec<String> = REQUIRED_EVENT_KEYS.iter().map(|k| k.to_string()).collect();

    let Some(features) = collection.get("features").and_then(Value::as_array) else {
        return vec!["collection has no features".to_string()];
    };
    if features.is_empty() {
        return vec!["collection has no features".to_string()];
    }

    features
        .iter()
        .enumerate()
        .filter_map(|(i, feature)| {
            check_document(feature, GeometryRule::Point, &keys)
                .err()
                .map(|e| format!("feature {}: {}", i, e))
        })
        .collect()
}

/// Write pretty-printed JSON, creating parent directories.
pub fn write_collection(path: &Path, collection: &Value) -> Result<()> {
    let write_err = |source| TimelineError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(collection)?;
    fs::write(path, json).map_err(write_err)
}

fn field(obj: &Map<String, Value>, key: &str) -> Value {
    obj.get(key).cloned().unwrap_or(Value::Null)
}

fn event_to_feature(event: &Value) -> Value {
    let empty = Map::new();
    let event = event.as_object().unwrap_or(&empty);
    let location = event
        .get("location")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut props = Map::new();
    props.insert("id".into(), field(event, "id"));
    props.insert("name".into(), field(event, "name"));
    props.insert("name_zh".into(), field(event, "name_zh"));
    props.insert("date".into(), field(event, "date"));
    props.insert("type".into(), field(event, "type"));
    props.insert("location_name".into(), field(location, "name"));
    props.insert("country".into(), field(location, "country"));
    props.insert("description".into(), field(event, "description"));
    props.insert("description_zh".into(), field(event, "description_zh"));

    let participants = event.get("participants").and_then(Value::as_object);
    for side in ["french", "russian", "austrian"] {
        if let Some(p) = participants.and_then(|p| p.get(side)).and_then(Value::as_object) {
            props.insert(format!("{}_troops", side), field(p, "troops"));
            props.insert(
                format!("{}_commanders", side),
                p.get("commanders").cloned().unwrap_or_else(|| json!([])),
            );
            // Artillery counts are only recorded for the two main armies
            if side != "austrian" {
                if let Some(artillery) = p.get("artillery") {
                    props.insert(format!("{}_artillery", side), artillery.clone());
                }
            }
        }
    }
    if let Some(c) = participants
        .and_then(|p| p.get("coalition"))
        .and_then(Value::as_object)
    {
        props.insert("coalition_austrian".into(), field(c, "austrian"));
        props.insert("coalition_saxon".into(), field(c, "saxon"));
        props.insert(
            "coalition_commanders".into(),
            c.get("commanders").cloned().unwrap_or_else(|| json!([])),
        );
    }

    let casualties = event.get("casualties").and_then(Value::as_object);
    if let Some(c) = casualties
        .and_then(|c| c.get("french"))
        .and_then(Value::as_object)
    {
        for key in ["killed", "wounded", "captured", "dead"] {
            props.insert(format!("french_{}", key), field(c, key));
        }
        props.insert("french_casualties_total".into(), field(c, "total"));
        props.insert("french_casualties_reason".into(), field(c, "reason"));
    }
    if let Some(c) = casualties
        .and_then(|c| c.get("russian"))
        .and_then(Value::as_object)
    {
        props.insert("russian_killed".into(), field(c, "killed"));
        props.insert("russian_wounded".into(), field(c, "wounded"));
        props.insert("russian_casualties_total".into(), field(c, "total"));
    }
    if let Some(c) = casualties
        .and_then(|c| c.get("coalition"))
        .and_then(Value::as_object)
    {
        props.insert("coalition_casualties_total".into(), field(c, "total"));
    }
    if let Some(total) = casualties.and_then(|c| c.get("campaign_total")) {
        props.insert("campaign_casualties".into(), total.clone());
    }

    for key in ["result", "impact", "significance", "confidence"] {
        props.insert(key.to_string(), field(event, key));
    }

    if let Some(w) = event.get("weather").and_then(Value::as_object) {
        props.insert("weather_temperature".into(), field(w, "temperature"));
        props.insert("weather_conditions".into(), field(w, "conditions"));
    }

    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [field(location, "lon"), field(location, "lat")],
        },
        "properties": props,
    })
}
