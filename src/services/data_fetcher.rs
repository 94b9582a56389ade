use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::services::FetchCache;

// ── football-data.org structures ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FootballDataMatches {
    #[serde(default)]
    pub matches: Vec<FootballMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootballMatch {
    pub id: i64,
    pub utc_date: Option<String>,
    pub status: Option<String>,
    pub home_team: Option<MatchTeam>,
    pub away_team: Option<MatchTeam>,
    pub score: Option<MatchScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTeam {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub full_time: Option<Score>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub home: Option<i64>,
    pub away: Option<i64>,
}

impl FootballMatch {
    pub fn home_name(&self) -> Option<String> {
        self.home_team.as_ref().and_then(|t| t.name.clone())
    }

    pub fn away_name(&self) -> Option<String> {
        self.away_team.as_ref().and_then(|t| t.name.clone())
    }

    pub fn full_time(&self) -> (Option<i64>, Option<i64>) {
        match self.score.as_ref().and_then(|s| s.full_time.as_ref()) {
            Some(ft) => (ft.home, ft.away),
            None => (None, None),
        }
    }
}

// ── DataFetcher ──────────────────────────────────────────────────────────────

/// Client for one football-data.org competition. Owns the response cache.
pub struct DataFetcher {
    client: Client,
    api_token: Option<String>,
    base_url: String,
    competition_code: String,
    timeout: Duration,
    cache: FetchCache<FootballDataMatches>,
}

impl DataFetcher {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_token: config.football_data_token.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            competition_code: config.competition_code.clone(),
            timeout: config.http_timeout,
            cache: FetchCache::new(config.cache_max_age),
        }
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Fails with a configuration error when no token is set.
    pub fn require_token(&self) -> Result<&str, AppError> {
        self.api_token
            .as_deref()
            .ok_or_else(|| AppError::Config("Missing FOOTBALL_DATA_TOKEN environment variable.".to_string()))
    }

    #[cfg(test)]
    pub fn cache(&self) -> &FetchCache<FootballDataMatches> {
        &self.cache
    }

    pub fn cache_key(matchday: i64, season: Option<i64>) -> String {
        match season {
            Some(season) => format!("matches_{}_{}", matchday, season),
            None => format!("matches_{}_current", matchday),
        }
    }

    /// Fetch every match of one matchday, served from cache when recent.
    pub async fn fetch_matchday(
        &self,
        matchday: i64,
        season: Option<i64>,
    ) -> Result<FootballDataMatches, AppError> {
        let api_token = self.require_token()?;

        let key = Self::cache_key(matchday, season);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!("Matchday {} served from cache ({})", matchday, key);
            return Ok(cached);
        }

        tracing::info!(
            "Fetching {} matchday {} from football-data.org…",
            self.competition_code,
            matchday
        );

        let url = format!("{}/competitions/{}/matches", self.base_url, self.competition_code);
        let mut query = vec![("matchday", matchday.to_string())];
        if let Some(season) = season {
            query.push(("season", season.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", api_token)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(AppError::UpstreamRejected { status: status.as_u16() });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let data: FootballDataMatches = response.json().await?;
        tracing::info!("Fetched {} matches for matchday {}", data.matches.len(), matchday);

        self.cache.insert(key, data.clone());
        Ok(data)
    }
}
