mod extract;

use axum::{
    extract::State,
    http::HeaderValue,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{Config, LEAGUE_NAME};
use crate::db::{self, ensure_round, get_all_teams, list_rounds};
use crate::error::AppError;
use crate::models::*;
use crate::services::{self, DataFetcher};
use extract::{ApiJson, ApiPath, ApiQuery};

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub fetcher: Arc<DataFetcher>,
}

pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let pool = db::init_database(&config.database_url).await?;
    let state = AppState {
        pool,
        fetcher: Arc::new(DataFetcher::new(&config)),
    };

    if !state.fetcher.has_token() {
        tracing::warn!("FOOTBALL_DATA_TOKEN not set, round sync will be refused");
    }

    let app = create_router(state, &config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("League API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState, config: &Config) -> Router {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    Router::new()
        .route("/health", get(health_check))
        .route("/api/meta", get(meta_handler))
        .route("/api/teams", get(teams_handler))
        .route("/api/rounds", get(list_rounds_handler))
        .route("/api/rounds/{matchday}", post(create_round_handler))
        .route("/api/rounds/{matchday}/sync", post(sync_round_handler))
        .route("/api/rounds/{matchday}/matches", get(round_matches_handler))
        .route("/api/matches/{match_id}/odds", put(set_odds_handler))
        .route(
            "/api/rounds/{matchday}/predictions",
            get(get_predictions_handler),
        )
        .route(
            "/api/rounds/{matchday}/predictions/{team_name}",
            post(set_predictions_handler),
        )
        .route("/api/rounds/{matchday}/coach", get(get_coach_points_handler))
        .route(
            "/api/rounds/{matchday}/coach/{team_name}",
            put(set_coach_points_handler),
        )
        .route("/api/rounds/{matchday}/scoreboard", get(scoreboard_handler))
        .route("/api/season/standings", get(season_standings_handler))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// GET /api/meta - League name and teams
async fn meta_handler(State(state): State<AppState>) -> ApiResult<LeagueMeta> {
    Ok(Json(LeagueMeta {
        league_name: LEAGUE_NAME.to_string(),
        teams: get_all_teams(&state.pool).await?,
    }))
}

// GET /api/teams
async fn teams_handler(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    Ok(Json(get_all_teams(&state.pool).await?))
}

#[derive(Debug, Deserialize)]
struct SeasonQuery {
    season: Option<i64>,
}

// POST /api/rounds/{matchday} - Create the round unless it exists
async fn create_round_handler(
    State(state): State<AppState>,
    ApiPath(matchday): ApiPath<i64>,
    ApiQuery(query): ApiQuery<SeasonQuery>,
) -> ApiResult<Round> {
    Ok(Json(ensure_round(&state.pool, matchday, query.season).await?))
}

// GET /api/rounds - Newest matchday first
async fn list_rounds_handler(State(state): State<AppState>) -> ApiResult<Vec<Round>> {
    Ok(Json(list_rounds(&state.pool).await?))
}

// POST /api/rounds/{matchday}/sync - Fetch and store the matchday's matches
async fn sync_round_handler(
    State(state): State<AppState>,
    ApiPath(matchday): ApiPath<i64>,
    ApiQuery(query): ApiQuery<SeasonQuery>,
) -> ApiResult<SyncReport> {
    let report = services::sync_round(&state.pool, &state.fetcher, matchday, query.season).await?;
    Ok(Json(report))
}

// GET /api/rounds/{matchday}/matches - Matches with odds, by kick-off
async fn round_matches_handler(
    State(state): State<AppState>,
    ApiPath(matchday): ApiPath<i64>,
) -> ApiResult<Vec<MatchWithOdds>> {
    Ok(Json(services::round_matches(&state.pool, matchday).await?))
}

// PUT /api/matches/{match_id}/odds?odd_1=&odd_x=&odd_2=
async fn set_odds_handler(
    State(state): State<AppState>,
    ApiPath(match_id): ApiPath<i64>,
    ApiQuery(odds): ApiQuery<Odds>,
) -> ApiResult<Ack> {
    services::record_odds(&state.pool, match_id, &odds).await?;
    Ok(Json(Ack::ok()))
}

// POST /api/rounds/{matchday}/predictions/{team_name} - Exactly five picks
async fn set_predictions_handler(
    State(state): State<AppState>,
    ApiPath((matchday, team_name)): ApiPath<(i64, String)>,
    ApiJson(picks): ApiJson<Vec<PickInput>>,
) -> ApiResult<Ack> {
    services::record_predictions(&state.pool, matchday, &team_name, &picks).await?;
    Ok(Json(Ack::ok()))
}

// GET /api/rounds/{matchday}/predictions - Grouped by team
async fn get_predictions_handler(
    State(state): State<AppState>,
    ApiPath(matchday): ApiPath<i64>,
) -> ApiResult<RoundPredictions> {
    Ok(Json(services::round_predictions(&state.pool, matchday).await?))
}

#[derive(Debug, Deserialize)]
struct CoachQuery {
    points: i64,
}

// PUT /api/rounds/{matchday}/coach/{team_name}?points=
async fn set_coach_points_handler(
    State(state): State<AppState>,
    ApiPath((matchday, team_name)): ApiPath<(i64, String)>,
    ApiQuery(query): ApiQuery<CoachQuery>,
) -> ApiResult<Ack> {
    services::record_coach_points(&state.pool, matchday, &team_name, query.points).await?;
    Ok(Json(Ack::ok()))
}

// GET /api/rounds/{matchday}/coach
async fn get_coach_points_handler(
    State(state): State<AppState>,
    ApiPath(matchday): ApiPath<i64>,
) -> ApiResult<RoundCoachPoints> {
    Ok(Json(services::round_coach_points(&state.pool, matchday).await?))
}

// GET /api/rounds/{matchday}/scoreboard
async fn scoreboard_handler(
    State(state): State<AppState>,
    ApiPath(matchday): ApiPath<i64>,
) -> ApiResult<Scoreboard> {
    Ok(Json(services::load_scoreboard(&state.pool, matchday).await?))
}

// GET /api/season/standings - All rounds added up
async fn season_standings_handler(State(state): State<AppState>) -> ApiResult<SeasonStandings> {
    Ok(Json(services::load_season_standings(&state.pool).await?))
}
