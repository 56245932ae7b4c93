//! League general classification and team standings.

use super::{Tabular, opt_cell};
use crate::error::ClientError;
use crate::normalize::{lenient, strip_html};
use crate::reference::CountryTable;
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Individual standings payload; `teams` maps team id to team details.
#[derive(Debug, Deserialize)]
pub struct StandingsPayload {
    pub data: Vec<RawGcRow>,
    #[serde(default, deserialize_with = "team_names")]
    pub teams: HashMap<String, String>,
}

/// One rider as served by the standings endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGcRow {
    #[serde(default, deserialize_with = "lenient::to_opt_u64")]
    pub zwid: Option<u64>,
    #[serde(deserialize_with = "lenient::to_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::to_string")]
    pub tid: String,
    #[serde(default, deserialize_with = "lenient::to_string")]
    pub flag: String,
    #[serde(deserialize_with = "lenient::to_i64")]
    pub points: i64,
    #[serde(deserialize_with = "lenient::to_u32")]
    pub events: u32,
    #[serde(default, deserialize_with = "lenient::to_i64_vec")]
    pub history: Vec<i64>,
}

/// Team standings payload.
#[derive(Debug, Deserialize)]
pub struct TeamStandingsPayload {
    pub data: Vec<RawTeamStanding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTeamStanding {
    #[serde(default, deserialize_with = "lenient::to_string")]
    pub tid: String,
    #[serde(deserialize_with = "lenient::to_string")]
    pub tname: String,
    #[serde(default, deserialize_with = "lenient::to_string")]
    pub category: String,
    #[serde(deserialize_with = "lenient::to_u32")]
    pub pos: u32,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    pub points: Option<f64>,
}

/// Reads the `teams` map, which the site serves as `[]` when it's empty.
fn team_names<'de, D: Deserializer<'de>>(d: D) -> Result<HashMap<String, String>, D::Error> {
    let JsonValue::Object(map) = JsonValue::deserialize(d)? else {
        return Ok(HashMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(tid, team)| {
            let name = team.get("tname")?;
            let name = match name {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((tid, name))
        })
        .collect())
}

/// Sort key derived from league points.
///
/// The site orders riders by treating points as milliseconds after midnight.
/// This is not a duration or a clock time; it exists only to reproduce that
/// ordering (and wraps every 86 400 000 points, as the site's does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SyntheticTime(NaiveTime);

impl SyntheticTime {
    pub fn from_points(points: i64) -> Self {
        let millis = points.rem_euclid(MILLIS_PER_DAY);
        let secs = (millis / 1000) as u32;
        let nanos = (millis % 1000) as u32 * 1_000_000;
        Self(NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).unwrap_or(NaiveTime::MIN))
    }
}

impl fmt::Display for SyntheticTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
    }
}

/// One rider's league standing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcStanding {
    /// 1-based rank after sorting.
    pub position: u32,
    pub zwid: Option<u64>,
    pub name: String,
    pub tid: String,
    pub tname: String,
    /// Country name, or the raw flag code when unknown.
    pub flag: String,
    pub events: u32,
    pub points: i64,
    /// Points per event, in event order.
    pub history: Vec<i64>,
    pub ranking_time: SyntheticTime,
}

impl Tabular for GcStanding {
    fn headers() -> &'static [&'static str] {
        &[
            "Position", "Name", "Team", "Country", "Events", "Points", "History", "Time",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.position.to_string(),
            self.name.clone(),
            self.tname.clone(),
            self.flag.clone(),
            self.events.to_string(),
            self.points.to_string(),
            format!("{:?}", self.history),
            self.ranking_time.to_string(),
        ]
    }
}

/// A team's position within its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamStanding {
    pub category: String,
    pub pos: u32,
    pub tid: String,
    pub tname: String,
    pub points: Option<f64>,
}

impl Tabular for TeamStanding {
    fn headers() -> &'static [&'static str] {
        &["Category", "Position", "Team", "Points"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.category.clone(),
            self.pos.to_string(),
            self.tname.clone(),
            opt_cell(self.points),
        ]
    }
}

/// The three tables of a league's standings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LeagueStandings {
    pub overall: Vec<GcStanding>,
    /// Empty when the league has no women's classification.
    pub women: Vec<GcStanding>,
    pub teams: Vec<TeamStanding>,
}

/// Cleans and ranks standings rows.
///
/// Rows are ordered by events (most first), then by synthetic time, and
/// numbered 1..N in that order.
pub fn rank_gc(
    rows: Vec<RawGcRow>,
    teams: &HashMap<String, String>,
    countries: &CountryTable,
) -> Vec<GcStanding> {
    let mut standings: Vec<GcStanding> = rows
        .into_iter()
        .map(|row| GcStanding {
            position: 0,
            tname: teams.get(&row.tid).map(|t| strip_html(t)).unwrap_or_default(),
            name: strip_html(&row.name),
            flag: countries.translate(&row.flag).to_string(),
            ranking_time: SyntheticTime::from_points(row.points),
            zwid: row.zwid,
            tid: row.tid,
            events: row.events,
            points: row.points,
            history: row.history,
        })
        .collect();

    standings.sort_by(|a, b| {
        b.events
            .cmp(&a.events)
            .then_with(|| a.ranking_time.cmp(&b.ranking_time))
    });
    for (idx, standing) in standings.iter_mut().enumerate() {
        standing.position = idx as u32 + 1;
    }

    standings
}

/// Cleans team standings and orders them by category, then position.
pub fn sort_team_standings(rows: Vec<RawTeamStanding>) -> Vec<TeamStanding> {
    let mut teams: Vec<TeamStanding> = rows
        .into_iter()
        .map(|row| TeamStanding {
            tname: strip_html(&row.tname),
            category: row.category,
            pos: row.pos,
            tid: row.tid,
            points: row.points,
        })
        .collect();
    teams.sort_by(|a, b| a.category.cmp(&b.category).then(a.pos.cmp(&b.pos)));
    teams
}

/// Extracts women's standings rows, treating an unusable answer as no data.
///
/// Error statuses and bodies that aren't a standings payload give an empty
/// list; transport failures are still returned.
pub fn women_rows(response: Result<JsonValue, ClientError>) -> Result<Vec<RawGcRow>, ClientError> {
    let value = match response {
        Ok(value) => value,
        Err(ClientError::Status { status, url }) => {
            debug!(status, url = %url, "no women's standings");
            return Ok(Vec::new());
        }
        Err(ClientError::DataShape { url, message }) => {
            debug!(url = %url, message = %message, "women's standings not JSON");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    #[derive(Deserialize)]
    struct WomenPayload {
        data: Vec<RawGcRow>,
    }

    match serde_json::from_value::<WomenPayload>(value) {
        Ok(payload) => Ok(payload.data),
        Err(e) => {
            debug!(error = %e, "women's standings malformed");
            Ok(Vec::new())
        }
    }
}
