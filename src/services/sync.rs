use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{self, SyncedMatch, Upserted};
use crate::error::AppError;
use crate::models::SyncReport;
use crate::services::{DataFetcher, FootballMatch};

fn to_synced(round_id: i64, m: &FootballMatch) -> SyncedMatch {
    let utc_date = m.utc_date.as_deref().and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
        Ok(d) => Some(d.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Bad date '{}' for match {}: {}", raw, m.id, e);
            None
        }
    });
    let (score_home, score_away) = m.full_time();

    SyncedMatch {
        round_id,
        api_match_id: m.id,
        utc_date,
        status: m.status.clone(),
        home: m.home_name(),
        away: m.away_name(),
        score_home,
        score_away,
    }
}

/// Pulls one matchday from the provider and stores it under its round, creating the
/// round if needed. Known matches (by external id) are updated, new ones inserted;
/// all writes commit together.
pub async fn sync_round(
    pool: &SqlitePool,
    fetcher: &DataFetcher,
    matchday: i64,
    season: Option<i64>,
) -> Result<SyncReport, AppError> {
    fetcher.require_token()?;

    let round = db::ensure_round(pool, matchday, season).await?;
    let data = fetcher.fetch_matchday(matchday, season).await?;

    let mut inserted = 0u32;
    let mut updated = 0u32;

    let mut tx = pool.begin().await?;
    for m in &data.matches {
        match db::upsert_synced_match(&mut tx, &to_synced(round.id, m)).await? {
            Upserted::Inserted => inserted += 1,
            Upserted::Updated => updated += 1,
        }
    }
    tx.commit().await?;

    tracing::info!(
        "Synced matchday {}: {} inserted, {} updated",
        matchday,
        inserted,
        updated
    );

    Ok(SyncReport { round, inserted, updated })
}
