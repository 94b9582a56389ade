use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: i64,
    pub matchday: i64,
    pub season: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub round_id: i64,
    pub api_match_id: i64,
    pub utc_date: Option<DateTime<Utc>>,
    pub status: Option<String>, // provider status: "SCHEDULED", "TIMED", "FINISHED", ...
    pub home: Option<String>,
    pub away: Option<String>,
    pub score_home: Option<i64>,
    pub score_away: Option<i64>,
}

impl Match {
    /// The 1X2 symbol of the final score, if both scores are in.
    pub fn outcome(&self) -> Option<Pick> {
        match (self.score_home, self.score_away) {
            (Some(h), Some(a)) if h > a => Some(Pick::Home),
            (Some(h), Some(a)) if h < a => Some(Pick::Away),
            (Some(_), Some(_)) => Some(Pick::Draw),
            _ => None,
        }
    }
}

/// Manually entered decimal odds for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    pub odd_1: Option<f64>,
    pub odd_x: Option<f64>,
    pub odd_2: Option<f64>,
}

impl Odds {
    pub fn for_pick(&self, pick: Pick) -> Option<f64> {
        match pick {
            Pick::Home => self.odd_1,
            Pick::Draw => self.odd_x,
            Pick::Away => self.odd_2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchWithOdds {
    #[serde(flatten)]
    pub match_info: Match,
    #[serde(flatten)]
    pub odds: Odds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pick {
    #[serde(rename = "1")]
    Home,
    #[serde(rename = "X")]
    Draw,
    #[serde(rename = "2")]
    Away,
}

impl Pick {
    pub fn symbol(&self) -> &'static str {
        match self {
            Pick::Home => "1",
            Pick::Draw => "X",
            Pick::Away => "2",
        }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pick must be '1', 'X', or '2'.")]
pub struct InvalidPick;

impl FromStr for Pick {
    type Err = InvalidPick;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Pick::Home),
            "X" => Ok(Pick::Draw),
            "2" => Ok(Pick::Away),
            _ => Err(InvalidPick),
        }
    }
}

/// One stored prediction row for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub team_id: i64,
    pub match_id: i64,
    pub pick: Pick,
}

/// A pick as submitted by a client. The symbol stays a string so a bad one is
/// reported as a validation error rather than a body rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickInput {
    pub match_id: i64,
    pub pick: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickEntry {
    pub match_id: i64,
    pub pick: Pick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundPredictions {
    pub matchday: i64,
    pub predictions: BTreeMap<String, Vec<PickEntry>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundCoachPoints {
    pub matchday: i64,
    pub coach_points: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardRow {
    pub team: String,
    pub points_1x2: f64,
    pub bonus: f64,
    pub coach_points: i64,
    pub total_round: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub matchday: i64,
    pub rows: Vec<ScoreboardRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team: String,
    pub points_1x2: f64,
    pub bonus: f64,
    pub coach: i64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonStandings {
    pub rounds: usize,
    pub rows: Vec<StandingsRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub round: Round,
    pub inserted: u32,
    pub updated: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueMeta {
    pub league_name: String,
    pub teams: Vec<Team>,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            success: false,
            error: message,
            timestamp: Utc::now(),
        }
    }
}
