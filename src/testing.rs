//! Testing helpers.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::db;

/// A seeded in-memory database. One connection, kept for the life of the pool, so
/// every query sees the same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    db::init_database_with_pool(&pool).await.unwrap();
    pool
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        football_data_token: Some("test-token".to_string()),
        api_base_url: base_url.to_string(),
        ..Config::default()
    }
}

/// Inserts a match directly and returns its id.
pub async fn insert_match(
    pool: &SqlitePool,
    round_id: i64,
    api_match_id: i64,
    utc_date: &str,
    score: Option<(i64, i64)>,
) -> i64 {
    sqlx::query(
        r#"INSERT INTO matches (round_id, api_match_id, utc_date, status, home, away, score_home, score_away)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(round_id)
    .bind(api_match_id)
    .bind(utc_date)
    .bind(if score.is_some() { "FINISHED" } else { "TIMED" })
    .bind(format!("Home {}", api_match_id))
    .bind(format!("Away {}", api_match_id))
    .bind(score.map(|s| s.0))
    .bind(score.map(|s| s.1))
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

/// Two Eredivisie fixtures: one finished 2-1, one still to be played.
pub fn fixture_matchday() -> Value {
    json!({
        "filters": {"matchday": "5"},
        "matches": [
            {
                "id": 1001,
                "utcDate": "2024-08-10T18:45:00Z",
                "status": "FINISHED",
                "matchday": 5,
                "homeTeam": {"id": 678, "name": "AFC Ajax"},
                "awayTeam": {"id": 674, "name": "PSV"},
                "score": {"winner": "HOME_TEAM", "fullTime": {"home": 2, "away": 1}}
            },
            {
                "id": 1002,
                "utcDate": "2024-08-11T14:30:00Z",
                "status": "TIMED",
                "matchday": 5,
                "homeTeam": {"id": 675, "name": "Feyenoord Rotterdam"},
                "awayTeam": {"id": 666, "name": "FC Twente '65"},
                "score": {"winner": null, "fullTime": {"home": null, "away": null}}
            }
        ]
    })
}

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub token: Option<String>,
    pub matchday: Option<String>,
    pub season: Option<String>,
}

#[derive(Clone)]
struct ProviderState {
    status: StatusCode,
    body: Arc<Mutex<Value>>,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<SeenRequest>>>,
}

/// A local stand-in for football-data.org.
pub struct FakeProvider {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
    pub last_request: Arc<Mutex<Option<SeenRequest>>>,
    body: Arc<Mutex<Value>>,
}

impl FakeProvider {
    /// Replace the payload returned from now on.
    pub fn set_body(&self, body: Value) {
        *self.body.lock().unwrap() = body;
    }
}

async fn provider_matches(
    State(state): State<ProviderState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some(SeenRequest {
        token: headers
            .get("X-Auth-Token")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        matchday: params.get("matchday").cloned(),
        season: params.get("season").cloned(),
    });
    let body = state.body.lock().unwrap().clone();
    (state.status, Json(body))
}

pub async fn spawn_provider(status: StatusCode, body: Value) -> FakeProvider {
    let state = ProviderState {
        status,
        body: Arc::new(Mutex::new(body)),
        hits: Arc::new(AtomicUsize::new(0)),
        last_request: Arc::new(Mutex::new(None)),
    };
    let provider = FakeProvider {
        base_url: String::new(),
        hits: state.hits.clone(),
        last_request: state.last_request.clone(),
        body: state.body.clone(),
    };

    let app = Router::new()
        .route("/competitions/{code}/matches", get(provider_matches))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeProvider {
        base_url: format!("http://{}", addr),
        ..provider
    }
}
