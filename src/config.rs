use std::env;
use std::time::Duration;

pub const LEAGUE_NAME: &str = "Narren Uiengaardinho MoreSwagPrinsCent-KempJagers";

const DEFAULT_DATABASE_URL: &str = "sqlite:data/league.db";
const DEFAULT_API_BASE_URL: &str = "https://api.football-data.org/v4";
/// Eredivisie on football-data.org
const DEFAULT_COMPETITION_CODE: &str = "DED";
const DEFAULT_STATIC_DIR: &str = "frontend";
const DEFAULT_CORS_ORIGINS: &str = "http://127.0.0.1:5500,http://localhost:5500";

/// Runtime settings, read once from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub football_data_token: Option<String>,
    pub api_base_url: String,
    pub competition_code: String,
    pub static_dir: String,
    pub cors_origins: Vec<String>,
    /// How long a fetched matchday is reused before asking the provider again.
    pub cache_max_age: Duration,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            football_data_token: env::var("FOOTBALL_DATA_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            api_base_url: env::var("FOOTBALL_DATA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            competition_code: env::var("COMPETITION_CODE")
                .unwrap_or_else(|_| DEFAULT_COMPETITION_CODE.to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string()),
            cors_origins,
            cache_max_age: Duration::from_secs(300),
            http_timeout: Duration::from_secs(20),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            football_data_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            competition_code: DEFAULT_COMPETITION_CODE.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.split(',').map(String::from).collect(),
            cache_max_age: Duration::from_secs(300),
            http_timeout: Duration::from_secs(20),
        }
    }
}
