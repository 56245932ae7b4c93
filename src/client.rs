//! The reporting client: an authenticated session plus reference tables.

use crate::auth::{Credentials, LoginFlow};
use crate::config::Config;
use crate::error::ClientError;
use crate::reference::{CountryTable, RouteTable};
use crate::reports::events::{EventListPayload, EventResultsPayload, event_results, keep_fastest};
use crate::reports::roster::{RosterPayload, build_roster};
use crate::reports::standings::{
    StandingsPayload, TeamStandingsPayload, rank_gc, sort_team_standings, women_rows,
};
use crate::reports::{EventResult, LeagueStandings, RosterRow};
use crate::session::Session;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Authenticated access to league and team reports.
#[derive(Debug, Clone)]
pub struct Client {
    session: Session,
    countries: CountryTable,
    routes: RouteTable,
    base_url: String,
    team_id: String,
}

impl Client {
    /// Logs in with `flow`, then loads the reference tables named in `config`.
    pub async fn connect(
        flow: &dyn LoginFlow,
        credentials: &Credentials,
        config: &Config,
    ) -> Result<Self, ClientError> {
        let session = flow.login(credentials).await?;
        info!(flow = flow.name(), "logged in");

        let countries = CountryTable::load(config.reference.subdivisions_file.as_deref())?;
        let routes = RouteTable::load(config.reference.routes_file.as_deref())?;
        debug!(countries = countries.len(), routes = routes.len(), "reference tables loaded");

        Ok(Self::with_parts(
            session,
            countries,
            routes,
            config.base_url(),
            &config.site.team_id,
        ))
    }

    /// Assembles a client from an existing session and tables.
    pub fn with_parts(
        session: Session,
        countries: CountryTable,
        routes: RouteTable,
        base_url: &str,
        team_id: &str,
    ) -> Self {
        Self {
            session,
            countries,
            routes,
            base_url: base_url.trim_end_matches('/').to_string(),
            team_id: team_id.to_string(),
        }
    }

    /// The authenticated session, for requests the reports don't cover.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn countries(&self) -> &CountryTable {
        &self.countries
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        self.session.get_json(url).await
    }

    /// Overall, women's and team standings of a league.
    pub async fn league_gc_results(&self, league_id: &str) -> Result<LeagueStandings, ClientError> {
        let gc_url = self.url(&format!("/cache3/global/league_standings_{}.json", league_id));
        let team_url = self.url(&format!(
            "/cache3/global/league_team_standings_{}.json",
            league_id
        ));
        let women_url = self.url(&format!(
            "/api3.php?do=league_standings&gender=W&id={}",
            league_id
        ));

        let gc: StandingsPayload = self.fetch(&gc_url).await?;
        let teams: TeamStandingsPayload = self.fetch(&team_url).await?;
        let women = women_rows(self.session.get_json_value(&women_url).await)?;

        let standings = LeagueStandings {
            overall: rank_gc(gc.data, &gc.teams, &self.countries),
            women: rank_gc(women, &gc.teams, &self.countries),
            teams: sort_team_standings(teams.data),
        };
        info!(
            league_id,
            overall = standings.overall.len(),
            women = standings.women.len(),
            teams = standings.teams.len(),
            "league standings"
        );
        Ok(standings)
    }

    /// Results of every event in a league, best time per rider.
    ///
    /// Events are fetched one after another; events without results are
    /// skipped.
    pub async fn league_event_results(
        &self,
        league_id: &str,
    ) -> Result<Vec<EventResult>, ClientError> {
        let list_url = self.url(&format!("/api3.php?do=league_event_results&id={}", league_id));
        let events: EventListPayload = self.fetch(&list_url).await?;

        let mut rows = Vec::new();
        for event in &events.data {
            let url = self.url(&format!("/cache3/results/{}_view.json", event.row_id));
            let payload: EventResultsPayload = self.fetch(&url).await?;
            let results = payload.data.unwrap_or_default();
            if results.is_empty() {
                debug!(event = %event.row_id, "no results, skipping");
                continue;
            }
            rows.extend(event_results(
                event,
                results,
                &url,
                &self.countries,
                &self.routes,
            )?);
        }

        let rows = keep_fastest(rows);
        info!(league_id, events = events.data.len(), rows = rows.len(), "league event results");
        Ok(rows)
    }

    /// Roster of the configured team.
    pub async fn team_roster(&self) -> Result<Vec<RosterRow>, ClientError> {
        let url = self.url(&format!("/api3.php?do=team_riders&id={}", self.team_id));
        let payload: RosterPayload = self.fetch(&url).await?;
        let roster = build_roster(payload.data, &self.base_url, &url, &self.countries)?;
        info!(team_id = %self.team_id, riders = roster.len(), "team roster");
        Ok(roster)
    }
}
