//! Per-event league results, flattened into one table.

use super::{Tabular, opt_cell};
use crate::error::ClientError;
use crate::normalize::{format_race_duration, lenient, race_duration, strip_html, unwrap_singletons};
use crate::reference::{CountryTable, RouteTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;

/// Result fields served as `[value, ...]` instead of a plain value.
const SINGLETON_FIELDS: &[&str] = &["time", "np", "avg_power", "avg_hr", "avg_wkg"];

/// League event listing payload.
#[derive(Debug, Deserialize)]
pub struct EventListPayload {
    pub data: Vec<EventDescriptor>,
}

/// One event of a league, as listed by the league endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDescriptor {
    /// Identifier used to fetch the event's results.
    #[serde(rename = "DT_RowId", deserialize_with = "lenient::to_string")]
    pub row_id: String,
    /// Start time, Unix seconds (may carry a fraction).
    #[serde(deserialize_with = "lenient::to_f64")]
    pub tm: f64,
    /// Distance in meters.
    #[serde(deserialize_with = "lenient::to_f64")]
    pub km: f64,
    #[serde(rename = "t", default, deserialize_with = "lenient::to_string")]
    pub title: String,
    #[serde(rename = "rt", default, deserialize_with = "lenient::to_string")]
    pub route_id: String,
    #[serde(default, deserialize_with = "lenient::to_u32")]
    pub laps: u32,
}

/// Event results payload; rows stay raw until their singletons are unwrapped.
///
/// Events without results come back with `data` empty, `null` or absent.
#[derive(Debug, Deserialize)]
pub struct EventResultsPayload {
    #[serde(default)]
    pub data: Option<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(deserialize_with = "lenient::to_u64")]
    zwid: u64,
    #[serde(deserialize_with = "lenient::to_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient::to_string")]
    tname: String,
    #[serde(default, deserialize_with = "lenient::to_string")]
    flag: String,
    #[serde(deserialize_with = "lenient::to_f64")]
    time: f64,
    #[serde(deserialize_with = "lenient::to_f64")]
    gap: f64,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    np: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    avg_power: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    avg_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    avg_wkg: Option<f64>,
}

/// One rider's result in one league event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResult {
    pub zwid: u64,
    pub name: String,
    pub team_name: String,
    pub country: String,
    /// Finish time, truncated to tenths of a second.
    #[serde(serialize_with = "lenient::serialize_race_duration")]
    pub time: Duration,
    /// Gap to the winner, truncated to tenths of a second.
    #[serde(serialize_with = "lenient::serialize_race_duration")]
    pub gap: Duration,
    pub np: Option<f64>,
    pub avg_power: Option<f64>,
    pub avg_hr: Option<f64>,
    pub avg_wkg: Option<f64>,
    /// Average speed from the event distance and untruncated finish time.
    pub speed_kph: f64,
    pub date_utc: DateTime<Utc>,
    pub distance_km: f64,
    pub title: String,
    pub route: String,
    pub laps: u32,
}

impl Tabular for EventResult {
    fn headers() -> &'static [&'static str] {
        &[
            "Date (UTC)",
            "Title",
            "Route",
            "Distance (km)",
            "Laps",
            "Rider ID",
            "Name",
            "Team Name",
            "Country",
            "Time",
            "Gap",
            "NP",
            "Avg Power",
            "Avg W/kg",
            "Avg HR",
            "Speed (km/h)",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.date_utc.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.title.clone(),
            self.route.clone(),
            self.distance_km.to_string(),
            self.laps.to_string(),
            self.zwid.to_string(),
            self.name.clone(),
            self.team_name.clone(),
            self.country.clone(),
            format_race_duration(&self.time),
            format_race_duration(&self.gap),
            opt_cell(self.np),
            opt_cell(self.avg_power),
            opt_cell(self.avg_wkg),
            opt_cell(self.avg_hr),
            format!("{:.2}", self.speed_kph),
        ]
    }
}

/// Converts Unix seconds to a UTC timestamp at microsecond precision.
fn event_start(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((seconds * 1_000_000.0).round_ties_even() as i64)
}

/// Turns one event's raw result rows into report rows carrying the event's
/// metadata.
pub fn event_results(
    event: &EventDescriptor,
    rows: Vec<JsonValue>,
    url: &str,
    countries: &CountryTable,
    routes: &RouteTable,
) -> Result<Vec<EventResult>, ClientError> {
    let date_utc = event_start(event.tm)
        .ok_or_else(|| ClientError::data_shape(url, format!("bad event timestamp {}", event.tm)))?;
    let distance_km = event.km / 1000.0;
    let route = routes.name(&event.route_id).to_string();

    rows.into_iter()
        .map(|mut row| {
            unwrap_singletons(&mut row, SINGLETON_FIELDS);
            let raw: RawResult =
                serde_json::from_value(row).map_err(|e| ClientError::data_shape(url, e))?;

            Ok(EventResult {
                zwid: raw.zwid,
                name: strip_html(&raw.name),
                team_name: strip_html(&raw.tname),
                country: countries.translate(&raw.flag).to_string(),
                time: race_duration(raw.time),
                gap: race_duration(raw.gap),
                np: raw.np,
                avg_power: raw.avg_power,
                avg_hr: raw.avg_hr,
                avg_wkg: raw.avg_wkg,
                speed_kph: distance_km / raw.time * 3600.0,
                date_utc,
                distance_km,
                title: event.title.clone(),
                route: route.clone(),
                laps: event.laps,
            })
        })
        .collect()
}

/// Orders rows by finish time and keeps, per rider, only the rows at that
/// rider's best time.
///
/// Rows tied at the best time are all kept.
pub fn keep_fastest(mut rows: Vec<EventResult>) -> Vec<EventResult> {
    rows.sort_by_key(|row| row.time);

    // sorted, so a rider's first row holds their best time
    let mut best: HashMap<u64, Duration> = HashMap::new();
    for row in &rows {
        best.entry(row.zwid).or_insert(row.time);
    }

    rows.retain(|row| best.get(&row.zwid) == Some(&row.time));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> EventDescriptor {
        serde_json::from_value(json!({
            "DT_RowId": "3456789",
            "tm": 1_700_000_000,
            "km": 24_000,
            "t": "League Round 1",
            "rt": "42",
            "laps": "2"
        }))
        .unwrap()
    }

    fn tables() -> (CountryTable, RouteTable) {
        let countries = [("be".to_string(), "Belgium".to_string())].into_iter().collect();
        let routes = [("42".to_string(), "Seaside Loop".to_string())].into_iter().collect();
        (countries, routes)
    }

    fn result(zwid: u64, seconds: f64) -> EventResult {
        EventResult {
            zwid,
            name: format!("Rider {}", zwid),
            team_name: String::new(),
            country: String::new(),
            time: race_duration(seconds),
            gap: Duration::ZERO,
            np: None,
            avg_power: None,
            avg_hr: None,
            avg_wkg: None,
            speed_kph: 0.0,
            date_utc: DateTime::from_timestamp(0, 0).unwrap(),
            distance_km: 0.0,
            title: String::new(),
            route: String::new(),
            laps: 1,
        }
    }

    #[test]
    fn test_event_descriptor_fields() {
        let event = event();
        assert_eq!(event.row_id, "3456789");
        assert_eq!(event.route_id, "42");
        assert_eq!(event.laps, 2);
    }

    #[test]
    fn test_event_results_transform() {
        let (countries, routes) = tables();
        let rows = vec![json!({
            "zwid": 1001,
            "name": "Rider &amp; Co",
            "tname": "Fast &#128640; Team",
            "flag": "be",
            "time": [1800.0, 0],
            "gap": 12.34,
            "np": [265, 0],
            "avg_power": ["250", 0],
            "avg_hr": [150, 0],
            "avg_wkg": ["3.6", 0]
        })];

        let results = event_results(&event(), rows, "u", &countries, &routes).unwrap();
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.name, "Rider & Co");
        assert_eq!(r.team_name, "Fast 🚀 Team");
        assert_eq!(r.country, "Belgium");
        assert_eq!(r.time, Duration::from_secs(1800));
        assert_eq!(r.gap, Duration::from_millis(12_300));
        assert_eq!(r.np, Some(265.0));
        assert_eq!(r.avg_power, Some(250.0));
        assert_eq!(r.avg_wkg, Some(3.6));
        assert_eq!(r.distance_km, 24.0);
        assert!((r.speed_kph - 48.0).abs() < 1e-9);
        assert_eq!(r.route, "Seaside Loop");
        assert_eq!(r.title, "League Round 1");
        assert_eq!(r.laps, 2);
        assert_eq!(r.date_utc.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_event_start_keeps_fraction() {
        let start = event_start(1_700_000_000.25).unwrap();
        assert_eq!(start.timestamp(), 1_700_000_000);
        assert_eq!(start.timestamp_subsec_millis(), 250);
        assert!(event_start(f64::NAN).is_none());

        let event: EventDescriptor = serde_json::from_value(json!({
            "DT_RowId": 1, "tm": "1700000000.5", "km": 1000, "t": "Fractional"
        }))
        .unwrap();
        let (countries, routes) = tables();
        let rows = vec![json!({"zwid": 1, "name": "A", "time": [60.0], "gap": 0})];
        let results = event_results(&event, rows, "u", &countries, &routes).unwrap();
        assert_eq!(results[0].date_utc.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_null_results_payload() {
        let payload: EventResultsPayload =
            serde_json::from_value(json!({"data": null})).unwrap();
        assert!(payload.data.is_none());
        let payload: EventResultsPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.data.is_none());
    }

    #[test]
    fn test_event_results_missing_field() {
        let (countries, routes) = tables();
        let rows = vec![json!({"zwid": 1, "name": "No time", "gap": 0})];
        let err = event_results(&event(), rows, "u", &countries, &routes).unwrap_err();
        assert!(matches!(err, ClientError::DataShape { .. }));
    }

    #[test]
    fn test_keep_fastest_scenario() {
        let rows = vec![result(7, 1205.0), result(7, 1200.4)];
        let kept = keep_fastest(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].time, Duration::from_millis(1_200_400));
    }

    #[test]
    fn test_keep_fastest_retains_ties_and_orders() {
        let rows = vec![
            result(2, 1300.0),
            result(1, 1250.0),
            result(1, 1250.0),
            result(3, 1100.0),
            result(2, 1299.0),
        ];
        let kept = keep_fastest(rows);
        let summary: Vec<(u64, u128)> = kept.iter().map(|r| (r.zwid, r.time.as_millis())).collect();
        assert_eq!(
            summary,
            [(3, 1_100_000), (1, 1_250_000), (1, 1_250_000), (2, 1_299_000)]
        );
    }

    #[test]
    fn test_keep_fastest_is_idempotent() {
        let rows = vec![result(1, 10.0), result(1, 9.5), result(2, 11.0), result(2, 11.0)];
        let once = keep_fastest(rows);
        let twice = keep_fastest(once.clone());
        assert_eq!(once, twice);

        let mut best: HashMap<u64, Duration> = HashMap::new();
        for r in &once {
            let entry = best.entry(r.zwid).or_insert(r.time);
            *entry = (*entry).min(r.time);
        }
        assert!(once.iter().all(|r| best[&r.zwid] == r.time));
    }

    #[test]
    fn test_tabular_cells_line_up() {
        let r = result(5, 61.25);
        assert_eq!(r.cells().len(), EventResult::headers().len());
        assert_eq!(r.cells()[9], "0:01:01.2");
    }
}
