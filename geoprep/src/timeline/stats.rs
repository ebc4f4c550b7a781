use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

/// Counts and ranges over an events collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStatistics {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_significance: BTreeMap<String, usize>,
    /// Earliest and latest parseable `YYYY-MM-DD` date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// `(min_lat, max_lat, min_lon, max_lon)` over features with coordinates.
    pub extent: Option<(f64, f64, f64, f64)>,
}

impl EventStatistics {
    pub fn from_collection(collection: &Value) -> Self {
        let mut stats = Self::default();
        let features = collection
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let label = |props: &Value, key: &str| {
            props
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string()
        };

        for feature in features {
            stats.total += 1;
            let props = &feature["properties"];

            *stats.by_type.entry(label(props, "type")).or_default() += 1;
            *stats
                .by_significance
                .entry(label(props, "significance"))
                .or_default() += 1;

            let date = props
                .get("date")
                .and_then(Value::as_str)
                .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok());
            if let Some(date) = date {
                stats.date_range = Some(match stats.date_range {
                    Some((lo, hi)) => (lo.min(date), hi.max(date)),
                    None => (date, date),
                });
            }

            let coords = &feature["geometry"]["coordinates"];
            if let (Some(lon), Some(lat)) = (coords[0].as_f64(), coords[1].as_f64()) {
                stats.extent = Some(match stats.extent {
                    Some((lat_lo, lat_hi, lon_lo, lon_hi)) => (
                        lat_lo.min(lat),
                        lat_hi.max(lat),
                        lon_lo.min(lon),
                        lon_hi.max(lon),
                    ),
                    None => (lat, lat, lon, lon),
                });
            }
        }

        stats
    }

    /// Days between the first and last event.
    pub fn duration_days(&self) -> Option<i64> {
        self.date_range.map(|(lo, hi)| (hi - lo).num_days())
    }
}
