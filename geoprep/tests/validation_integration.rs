//! Integration tests for event conversion and artifact validation.
//!
//! These tests exercise the hand-off between the data-preparation steps and
//! the readiness check:
//! - timeline JSON → events GeoJSON written into the project layout
//! - the built-in project manifest over a partially prepared data directory
//! - JSON manifests with relative paths and mixed artifact states
//!
//! Run with: `cargo test --test validation_integration`

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tempfile::TempDir;

use geoprep::config::{ConfigFile, ProjectLayout};
use geoprep::timeline::{check_events, convert, load_timeline, write_collection, EventStatistics};
use geoprep::validation::{validate, ArtifactOutcome, Manifest, ManifestError, Readiness};

// ============================================================================
// Helper Functions
// ============================================================================

/// Config rooted at a temp data directory.
fn project() -> (TempDir, ConfigFile) {
    let temp = TempDir::new().unwrap();
    let mut config = ConfigFile::default();
    config.paths.data_dir = temp.path().join("data");
    (temp, config)
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn point(name: &str, lon: Value, lat: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [lon, lat]},
        "properties": {"id": name.to_lowercase(), "date": "1812-09-14", "NAME": name}
    })
}

fn collection(features: Vec<Value>) -> Value {
    json!({"type": "FeatureCollection", "features": features})
}

fn polygon_layer() -> Value {
    collection(vec![json!({
        "type": "Feature",
        "geometry": {"type": "Polygon", "coordinates": [[[30.0, 55.0], [31.0, 55.0], [31.0, 56.0], [30.0, 55.0]]]},
        "properties": {"NAME": "Russia"}
    })])
}

fn campaign_timeline() -> Value {
    json!({
        "campaign": "Russian Campaign 1812",
        "date_range": {"start": "1812-06-24", "end": "1812-12-14"},
        "events": [
            {
                "id": "niemen_crossing",
                "date": "1812-06-24",
                "type": "movement",
                "significance": "critical",
                "location": {"name": "Kovno", "lat": 54.8985, "lon": 23.9036}
            },
            {
                "id": "moscow_entry",
                "date": "1812-09-14",
                "type": "occupation",
                "significance": "critical",
                "location": {"name": "Moscow", "lat": 55.7558, "lon": 37.6173}
            },
            {
                "id": "berezina",
                "date": "1812-11-26",
                "type": "battle",
                "significance": "major",
                "location": {"name": "Studzianka", "lat": 54.3333, "lon": 28.35}
            }
        ],
        "schwarzenberg_operations": {
            "events": [{
                "id": "volkovysk",
                "date": "1812-11-14",
                "type": "battle",
                "location": {"name": "Volkovysk", "lat": 53.15, "lon": 24.45}
            }]
        }
    })
}

/// Write the required base map layers other than events.
fn write_base_layers(layout: &ProjectLayout) {
    let geojson = layout.geojson_dir();
    write_json(&geojson.join("countries.geojson"), &polygon_layer());
    write_json(&geojson.join("rivers.geojson"), &polygon_layer());
    write_json(
        &geojson.join("cities.geojson"),
        &collection(vec![point("Moscow", json!(37.6173), json!(55.7558))]),
    );
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Timeline conversion writes a checked events layer into the layout.
#[test]
fn test_timeline_to_events_layer() {
    let (_temp, config) = project();
    let layout = config.layout();
    write_json(&layout.timeline_path(), &campaign_timeline());

    let timeline = load_timeline(&layout.timeline_path()).unwrap();
    let events = convert(&timeline).unwrap();
    assert!(check_events(&events).is_empty());
    write_collection(&layout.events_path(), &events).unwrap();

    let written: Value =
        serde_json::from_str(&fs::read_to_string(layout.events_path()).unwrap()).unwrap();
    assert_eq!(written["features"].as_array().unwrap().len(), 4);
    assert_eq!(written["metadata"]["total_events"], 4);

    let stats = EventStatistics::from_collection(&written);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.by_type.get("battle"), Some(&2));
    assert_eq!(stats.by_significance.get("critical"), Some(&2));
    assert_eq!(
        stats.date_range,
        Some((
            NaiveDate::from_ymd_opt(1812, 6, 24).unwrap(),
            NaiveDate::from_ymd_opt(1812, 11, 26).unwrap()
        ))
    );
}

/// With the required layers in place and optional products missing, the
/// project is usable but only partially ready.
#[test]
fn test_default_manifest_partial_readiness() {
    let (_temp, config) = project();
    let layout = config.layout();
    let dem = config.dem_config().unwrap();

    write_collection(&layout.events_path(), &convert(&campaign_timeline()).unwrap()).unwrap();
    write_base_layers(&layout);

    let manifest = Manifest::default_for(&layout, &dem);
    assert_eq!(manifest.required_count(), 4);

    let report = validate(&manifest);
    assert!(report.failed().is_empty());
    assert_eq!(report.passed().len(), 4);
    assert!(!report.warned().is_empty());
    assert_eq!(report.readiness(), Readiness::Partial);
    assert_eq!(report.readiness().exit_code(), 1);

    assert_eq!(
        report.record("hillshade").unwrap().outcome,
        ArtifactOutcome::Missing
    );
}

/// A broken required layer makes the project not ready.
#[test]
fn test_default_manifest_not_ready() {
    let (_temp, config) = project();
    let layout = config.layout();
    let dem = config.dem_config().unwrap();

    write_base_layers(&layout);
    // Event with no location: coordinates end up null
    let events = convert(&json!({"events": [{"id": "lost", "date": "1812-11-01"}]})).unwrap();
    assert_eq!(check_events(&events).len(), 1);
    write_collection(&layout.events_path(), &events).unwrap();
    fs::remove_file(layout.geojson_dir().join("rivers.geojson")).unwrap();

    let report = validate(&Manifest::default_for(&layout, &dem));

    assert_eq!(
        report.record("events").unwrap().outcome,
        ArtifactOutcome::PresentInvalid
    );
    assert_eq!(
        report.record("rivers").unwrap().outcome,
        ArtifactOutcome::Missing
    );
    let failed: Vec<&str> = report.failed().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(failed, vec!["events", "rivers"]);
    assert_eq!(report.readiness(), Readiness::NotReady);
    assert_eq!(report.readiness().exit_code(), 2);
}

/// JSON manifests resolve relative paths and check each artifact kind.
#[test]
fn test_json_manifest_mixed_artifacts() {
    let temp = TempDir::new().unwrap();
    let base = temp.path();

    write_json(
        &base.join("geojson/cities.geojson"),
        &collection(vec![point("Moscow", json!(37.6173), json!(55.7558))]),
    );
    write_json(
        &base.join("geojson/broken.geojson"),
        &collection(vec![point("Nowhere", Value::Null, json!(55.0))]),
    );
    fs::create_dir_all(base.join("boundaries/rivers")).unwrap();
    for ext in ["shp", "shx"] {
        fs::write(base.join(format!("boundaries/rivers/rivers.{}", ext)), b"x").unwrap();
    }

    let manifest_path = base.join("manifest.json");
    write_json(
        &manifest_path,
        &json!({"artifacts": [
            {"name": "cities", "path": "geojson/cities.geojson", "required": true,
             "kind": {"type": "geojson", "geometry": "point", "required_keys": ["id", "date"]}},
            {"name": "broken", "path": "geojson/broken.geojson",
             "kind": {"type": "geojson", "geometry": "point"}},
            {"name": "rivers shapefile", "path": "boundaries/rivers", "kind": {"type": "shapefile"}},
            {"name": "minard", "path": "maps/Minard.png", "kind": {"type": "file"}}
        ]}),
    );

    let manifest = Manifest::load(&manifest_path, base).unwrap();
    assert_eq!(manifest.artifacts[0].path, base.join("geojson/cities.geojson"));
    assert_eq!(manifest.required_count(), 1);

    let report = validate(&manifest);
    let outcomes: Vec<ArtifactOutcome> = report.records.iter().map(|r| r.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            ArtifactOutcome::PresentValid,
            ArtifactOutcome::PresentInvalid,
            ArtifactOutcome::PresentInvalid,
            ArtifactOutcome::Missing,
        ]
    );
    assert!(report.record("rivers shapefile").unwrap().detail.contains(".dbf"));
    assert!(report.record("broken").unwrap().detail.contains("two numbers"));

    // Optional problems of either kind only warn
    assert_eq!(report.warned().len(), 3);
    assert_eq!(report.readiness(), Readiness::Partial);
}

#[test]
fn test_manifest_load_errors() {
    let temp = TempDir::new().unwrap();
    let base = temp.path();

    let empty = base.join("empty.json");
    fs::write(&empty, r#"{"artifacts": []}"#).unwrap();
    assert!(matches!(
        Manifest::load(&empty, base),
        Err(ManifestError::Empty(_))
    ));

    let garbage = base.join("garbage.json");
    fs::write(&garbage, "{not json").unwrap();
    assert!(matches!(
        Manifest::load(&garbage, base),
        Err(ManifestError::Parse { .. })
    ));

    assert!(matches!(
        Manifest::load(&base.join("absent.json"), base),
        Err(ManifestError::Io { .. })
    ));
}
