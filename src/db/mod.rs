pub mod seed;
pub use seed::{seed_teams, TEAM_NAMES};

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqliteConnection, SqlitePool};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use crate::models::*;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await?;
    Ok(pool)
}

/// Creates the schema if missing and seeds the league's teams.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rounds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            matchday INTEGER UNIQUE NOT NULL,
            season INTEGER,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            round_id INTEGER NOT NULL,
            api_match_id INTEGER UNIQUE NOT NULL,
            utc_date TEXT,
            status TEXT,
            home TEXT,
            away TEXT,
            score_home INTEGER,
            score_away INTEGER,
            FOREIGN KEY (round_id) REFERENCES rounds (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // odds: entered by hand, one row per match
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS odds (
            match_id INTEGER PRIMARY KEY,
            odd_1 REAL,
            odd_x REAL,
            odd_2 REAL,
            FOREIGN KEY (match_id) REFERENCES matches (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS predictions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            round_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            match_id INTEGER NOT NULL,
            pick TEXT NOT NULL CHECK (pick IN ('1', 'X', '2')),
            UNIQUE (round_id, team_id, match_id),
            FOREIGN KEY (round_id) REFERENCES rounds (id) ON DELETE CASCADE,
            FOREIGN KEY (team_id) REFERENCES teams (id) ON DELETE CASCADE,
            FOREIGN KEY (match_id) REFERENCES matches (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // coach_points: "coach of the year" points, entered by hand per round and team
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS coach_points (
            round_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            points INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (round_id, team_id),
            FOREIGN KEY (round_id) REFERENCES rounds (id) ON DELETE CASCADE,
            FOREIGN KEY (team_id) REFERENCES teams (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_round ON matches(round_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_predictions_round ON predictions(round_id)")
        .execute(pool)
        .await?;

    seed_teams(pool).await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

// Team operations

pub async fn get_all_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>("SELECT id, name FROM teams ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(teams)
}

/// Teams in insertion order, which is the order the scoreboard lists ties in.
pub async fn get_teams_in_seed_order(pool: &SqlitePool) -> Result<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>("SELECT id, name FROM teams ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(teams)
}

pub async fn get_team_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Team>> {
    let team = sqlx::query_as::<_, Team>("SELECT id, name FROM teams WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

// Round operations

fn round_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Round> {
    Ok(Round {
        id: row.get("id"),
        matchday: row.get("matchday"),
        season: row.get("season"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

/// Creates the round for `matchday` unless it exists, then returns it. An existing
/// round keeps its original season.
pub async fn ensure_round(pool: &SqlitePool, matchday: i64, season: Option<i64>) -> Result<Round> {
    sqlx::query("INSERT OR IGNORE INTO rounds (matchday, season, created_at) VALUES (?, ?, ?)")
        .bind(matchday)
        .bind(season)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

    get_round_by_matchday(pool, matchday)
        .await?
        .ok_or_else(|| anyhow::anyhow!("round {} vanished after insert", matchday))
}

pub async fn get_round_by_matchday(pool: &SqlitePool, matchday: i64) -> Result<Option<Round>> {
    let row = sqlx::query("SELECT * FROM rounds WHERE matchday = ?")
        .bind(matchday)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(round_from_row).transpose()
}

pub async fn list_rounds(pool: &SqlitePool) -> Result<Vec<Round>> {
    let rows = sqlx::query("SELECT * FROM rounds ORDER BY matchday DESC")
        .fetch_all(pool)
        .await?;

    rows.iter().map(round_from_row).collect()
}

// Match operations

fn match_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Match> {
    let utc_date = row
        .get::<Option<String>, _>("utc_date")
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    Ok(Match {
        id: row.get("id"),
        round_id: row.get("round_id"),
        api_match_id: row.get("api_match_id"),
        utc_date,
        status: row.get("status"),
        home: row.get("home"),
        away: row.get("away"),
        score_home: row.get("score_home"),
        score_away: row.get("score_away"),
    })
}

/// Matches of a round with their odds (if any), earliest kick-off first.
pub async fn get_round_matches(pool: &SqlitePool, round_id: i64) -> Result<Vec<MatchWithOdds>> {
    let rows = sqlx::query(
        r#"SELECT m.*, o.odd_1, o.odd_x, o.odd_2
           FROM matches m
           LEFT JOIN odds o ON o.match_id = m.id
           WHERE m.round_id = ?
           ORDER BY m.utc_date ASC, m.id ASC"#,
    )
    .bind(round_id)
    .fetch_all(pool)
    .await?;

    let mut matches = Vec::with_capacity(rows.len());
    for row in &rows {
        matches.push(MatchWithOdds {
            match_info: match_from_row(row)?,
            odds: Odds {
                odd_1: row.get("odd_1"),
                odd_x: row.get("odd_x"),
                odd_2: row.get("odd_2"),
            },
        });
    }
    Ok(matches)
}

pub async fn get_round_match_ids(pool: &SqlitePool, round_id: i64) -> Result<HashSet<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM matches WHERE round_id = ?")
        .bind(round_id)
        .fetch_all(pool)
        .await?;
    Ok(ids.into_iter().collect())
}

pub async fn match_exists(pool: &SqlitePool, match_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches WHERE id = ?")
        .bind(match_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// A match as reported by the provider, ready to be stored under `round_id`.
#[derive(Debug, Clone)]
pub struct SyncedMatch {
    pub round_id: i64,
    pub api_match_id: i64,
    pub utc_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub home: Option<String>,
    pub away: Option<String>,
    pub score_home: Option<i64>,
    pub score_away: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Inserted,
    Updated,
}

/// Stores a provider match keyed by its external id. Takes a connection so a whole
/// matchday can go through one transaction.
pub async fn upsert_synced_match(conn: &mut SqliteConnection, m: &SyncedMatch) -> Result<Upserted> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM matches WHERE api_match_id = ?")
        .bind(m.api_match_id)
        .fetch_optional(&mut *conn)
        .await?;

    let utc_date = m.utc_date.map(|d| d.to_rfc3339());

    if existing.is_some() {
        sqlx::query(
            r#"UPDATE matches
               SET round_id = ?, utc_date = ?, status = ?, home = ?, away = ?,
                   score_home = ?, score_away = ?
               WHERE api_match_id = ?"#,
        )
        .bind(m.round_id)
        .bind(utc_date)
        .bind(&m.status)
        .bind(&m.home)
        .bind(&m.away)
        .bind(m.score_home)
        .bind(m.score_away)
        .bind(m.api_match_id)
        .execute(&mut *conn)
        .await?;
        Ok(Upserted::Updated)
    } else {
        sqlx::query(
            r#"INSERT INTO matches
               (round_id, api_match_id, utc_date, status, home, away, score_home, score_away)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(m.round_id)
        .bind(m.api_match_id)
        .bind(utc_date)
        .bind(&m.status)
        .bind(&m.home)
        .bind(&m.away)
        .bind(m.score_home)
        .bind(m.score_away)
        .execute(&mut *conn)
        .await?;
        Ok(Upserted::Inserted)
    }
}

// Odds operations

pub async fn upsert_odds(pool: &SqlitePool, match_id: i64, odds: &Odds) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO odds (match_id, odd_1, odd_x, odd_2)
           VALUES (?, ?, ?, ?)
           ON CONFLICT(match_id) DO UPDATE SET
               odd_1 = excluded.odd_1,
               odd_x = excluded.odd_x,
               odd_2 = excluded.odd_2"#,
    )
    .bind(match_id)
    .bind(odds.odd_1)
    .bind(odds.odd_x)
    .bind(odds.odd_2)
    .execute(pool)
    .await?;
    Ok(())
}

// Prediction operations

pub async fn get_round_predictions(pool: &SqlitePool, round_id: i64) -> Result<Vec<Prediction>> {
    let rows = sqlx::query("SELECT team_id, match_id, pick FROM predictions WHERE round_id = ?")
        .bind(round_id)
        .fetch_all(pool)
        .await?;

    let mut predictions = Vec::with_capacity(rows.len());
    for row in rows {
        predictions.push(Prediction {
            team_id: row.get("team_id"),
            match_id: row.get("match_id"),
            pick: row.get::<String, _>("pick").parse()?,
        });
    }
    Ok(predictions)
}

/// Writes a team's picks for a round in one transaction; an existing pick for the
/// same match is overwritten.
pub async fn upsert_predictions(
    pool: &SqlitePool,
    round_id: i64,
    team_id: i64,
    picks: &[(i64, Pick)],
) -> Result<()> {
    let mut tx = pool.begin().await?;
    for (match_id, pick) in picks {
        sqlx::query(
            r#"INSERT INTO predictions (round_id, team_id, match_id, pick)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(round_id, team_id, match_id) DO UPDATE SET pick = excluded.pick"#,
        )
        .bind(round_id)
        .bind(team_id)
        .bind(match_id)
        .bind(pick.symbol())
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn get_round_predictions_by_team(
    pool: &SqlitePool,
    round_id: i64,
) -> Result<BTreeMap<String, Vec<PickEntry>>> {
    let rows = sqlx::query(
        r#"SELECT t.name AS team, p.match_id, p.pick
           FROM predictions p
           JOIN teams t ON t.id = p.team_id
           WHERE p.round_id = ?
           ORDER BY t.name ASC, p.match_id ASC"#,
    )
    .bind(round_id)
    .fetch_all(pool)
    .await?;

    let mut grouped: BTreeMap<String, Vec<PickEntry>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.get("team")).or_default().push(PickEntry {
            match_id: row.get("match_id"),
            pick: row.get::<String, _>("pick").parse()?,
        });
    }
    Ok(grouped)
}

// Coach points operations

pub async fn upsert_coach_points(pool: &SqlitePool, round_id: i64, team_id: i64, points: i64) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO coach_points (round_id, team_id, points)
           VALUES (?, ?, ?)
           ON CONFLICT(round_id, team_id) DO UPDATE SET points = excluded.points"#,
    )
    .bind(round_id)
    .bind(team_id)
    .bind(points)
    .execute(pool)
    .await?;
    Ok(())
}

/// Coach points of a round keyed by team id.
pub async fn get_round_coach_points(pool: &SqlitePool, round_id: i64) -> Result<HashMap<i64, i64>> {
    let rows = sqlx::query("SELECT team_id, points FROM coach_points WHERE round_id = ?")
        .bind(round_id)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("team_id"), row.get("points")))
        .collect())
}

pub async fn get_round_coach_points_by_team(
    pool: &SqlitePool,
    round_id: i64,
) -> Result<BTreeMap<String, i64>> {
    let rows = sqlx::query(
        r#"SELECT t.name AS team, c.points
           FROM coach_points c
           JOIN teams t ON t.id = c.team_id
           WHERE c.round_id = ?
           ORDER BY t.name ASC"#,
    )
    .bind(round_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("team"), row.get("points")))
        .collect())
}
