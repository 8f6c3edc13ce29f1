use crate::{event::Event, EventError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Base URL of the Ergast compatible results API.
pub const DEFAULT_RESULTS_API: &str = "https://api.jolpi.ca/ergast/f1";
/// Number of drivers in the standings document.
pub const STANDINGS_SIZE: usize = 6;
/// Number of drivers in the podium document.
pub const PODIUM_SIZE: usize = 3;

const COUNTRY_FIELD: &str = "Country";
const CITY_FIELD: &str = "City";
const UNKNOWN: &str = "?";

/// Points for the first ten places.
const POINTS: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Driver as the results API describes them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    /// Unique driver id, i.e. `max_verstappen`.
    pub driver_id: String,
    /// Driver's surname, i.e. `Verstappen`.
    pub family_name: String,
}

/// Team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Constructor {
    /// Team name, i.e. `Red Bull`.
    pub name: String,
}

/// Single row of the drivers championship table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverStanding {
    /// Championship place.
    #[serde(default)]
    pub position: String,
    /// Season points.
    pub points: String,
    /// The driver.
    #[serde(rename = "Driver")]
    pub driver: Driver,
    /// Driver's teams in the season, the first one is used.
    #[serde(rename = "Constructors", default)]
    pub constructors: Vec<Constructor>,
}

impl DriverStanding {
    /// Driver's team name or `?` if unknown.
    pub fn team(&self) -> &str {
        self.constructors.first().map_or(UNKNOWN, |c| c.name.as_str())
    }
}

/// Driver's result of the race.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RaceResult {
    /// Finishing place.
    pub position: String,
    /// The driver.
    #[serde(rename = "Driver")]
    pub driver: Driver,
    /// Driver's team.
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
}

/// The race with its results.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResults {
    /// Round of the season.
    pub round: String,
    /// Official name, i.e. `Mexico City Grand Prix`.
    pub race_name: String,
    /// Results, winner first.
    #[serde(rename = "Results", default)]
    pub results: Vec<RaceResult>,
}

#[derive(Deserialize)]
struct Response<T> {
    #[serde(rename = "MRData")]
    data: T,
}

#[derive(Deserialize)]
struct StandingsData {
    #[serde(rename = "StandingsTable")]
    table: StandingsTable,
}

#[derive(Deserialize)]
struct StandingsTable {
    #[serde(rename = "StandingsLists")]
    lists: Vec<StandingsList>,
}

#[derive(Deserialize)]
struct StandingsList {
    #[serde(rename = "DriverStandings")]
    drivers: Vec<DriverStanding>,
}

#[derive(Deserialize)]
struct RaceData {
    #[serde(rename = "RaceTable")]
    table: RaceTable,
}

#[derive(Deserialize)]
struct RaceTable {
    #[serde(rename = "Races")]
    races: Vec<RaceResults>,
}

/// Parses `driverStandings.json` response of the results API.
pub fn parse_driver_standings(text: &str) -> Result<Vec<DriverStanding>> {
    let response: Response<StandingsData> =
        serde_json::from_str(text).map_err(|e| EventError::InvalidDocument(e.to_string()))?;

    response
        .data
        .table
        .lists
        .into_iter()
        .next()
        .map(|list| list.drivers)
        .ok_or_else(|| EventError::InvalidDocument("no driver standings".to_owned()))
}

/// Parses `last/results.json` response of the results API.
pub fn parse_race_results(text: &str) -> Result<RaceResults> {
    let response: Response<RaceData> =
        serde_json::from_str(text).map_err(|e| EventError::InvalidDocument(e.to_string()))?;

    response
        .data
        .table
        .races
        .into_iter()
        .next()
        .ok_or_else(|| EventError::InvalidDocument("no race results".to_owned()))
}

/// Points awarded for the finishing `position`, starting from 1.
pub fn points_for_position(position: u32) -> u32 {
    position
        .checked_sub(1)
        .and_then(|index| POINTS.get(index as usize))
        .copied()
        .unwrap_or(0)
}

/// Strips flag emoji from the schedule's country: `🇦🇺 Australia` becomes `Australia`.
pub fn country_name(country: &str) -> String {
    let is_flag = |c: char| ('\u{1F1E6}'..='\u{1F1FF}').contains(&c);
    country
        .split_whitespace()
        .filter(|word| !word.chars().any(is_flag))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the standings document: `After <country>` header and the top [`STANDINGS_SIZE`] drivers.
pub fn standings_document(race: &Event, standings: &[DriverStanding]) -> Value {
    let country = country_name(race.get_str(COUNTRY_FIELD).unwrap_or_default());

    let mut rows = vec![json!({ "After": format!("After {country}") })];
    rows.extend(standings.iter().take(STANDINGS_SIZE).map(|standing| {
        json!({
            "Place": standing.position,
            "Name": standing.driver.family_name,
            "Team": standing.team(),
            "Points": standing.points,
        })
    }));

    json!({ "Standings": rows })
}

/// Builds the podium document: race header and the top [`PODIUM_SIZE`] finishers
/// with points earned in the race and season totals from `standings`.
pub fn podiums_document(race: &Event, results: &RaceResults, standings: &[DriverStanding]) -> Value {
    let totals: HashMap<&str, &str> = standings
        .iter()
        .map(|standing| (standing.driver.driver_id.as_str(), standing.points.as_str()))
        .collect();

    let mut rows = vec![json!({
        "Country": race.get_str(COUNTRY_FIELD).unwrap_or_default(),
        "City": race.get_str(CITY_FIELD).unwrap_or_default(),
        "Message": format!("Race {}", results.round),
    })];
    rows.extend(results.results.iter().take(PODIUM_SIZE).map(|result| {
        let points = result.position.parse::<u32>().map_or(0, points_for_position);
        json!({
            "Place": result.position,
            "Name": result.driver.family_name,
            "Team": result.constructor.name,
            "Points": format!("+{points}"),
            "Total": totals.get(result.driver.driver_id.as_str()).copied().unwrap_or(UNKNOWN),
        })
    }));

    json!({ "Podiums": rows })
}

/// Client of the Ergast compatible results API.
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct ResultsApi {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(feature = "async")]
impl ResultsApi {
    /// Constructs client of the API at `base_url` with default timeout.
    ///
    /// Returns [`EventError::InvalidSource`] if `base_url` isn't an HTTP(S) URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(EventError::InvalidSource(format!("{base_url}: not an HTTP(S) URL")));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client: crate::source::http_client(crate::source::DEFAULT_TIMEOUT)?,
        })
    }

    /// Sets timeout of the HTTP requests.
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Result<Self> {
        self.client = crate::source::http_client(timeout)?;
        Ok(self)
    }

    /// Replaces the HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Returns base URL of the API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches current drivers championship standings.
    pub async fn driver_standings(&self) -> Result<Vec<DriverStanding>> {
        let text = crate::source::fetch_text(&self.client, &self.url("current/driverStandings.json")).await?;
        parse_driver_standings(&text)
    }

    /// Fetches results of the last race of the current season.
    pub async fn last_results(&self) -> Result<RaceResults> {
        let text = crate::source::fetch_text(&self.client, &self.url("current/last/results.json")).await?;
        parse_race_results(&text)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}
