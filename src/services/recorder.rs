use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::db;
use crate::error::AppError;
use crate::models::*;
use crate::utils::is_valid_odd;

/// Number of matches each team picks per round.
pub const PICKS_PER_ROUND: usize = 5;

pub async fn require_round(pool: &SqlitePool, matchday: i64) -> Result<Round, AppError> {
    db::get_round_by_matchday(pool, matchday)
        .await?
        .ok_or_else(|| AppError::not_found("Round not found. Create/sync it first."))
}

pub async fn require_team(pool: &SqlitePool, team_name: &str) -> Result<Team, AppError> {
    db::get_team_by_name(pool, team_name)
        .await?
        .ok_or_else(|| AppError::not_found("Unknown team."))
}

/// Validates a team's picks for a round and stores them. Nothing is written unless
/// every pick passes.
pub async fn record_predictions(
    pool: &SqlitePool,
    matchday: i64,
    team_name: &str,
    picks: &[PickInput],
) -> Result<(), AppError> {
    if picks.len() != PICKS_PER_ROUND {
        return Err(AppError::validation(format!(
            "Each team must submit exactly {} picks.",
            PICKS_PER_ROUND
        )));
    }

    let round = require_round(pool, matchday).await?;
    let team = require_team(pool, team_name).await?;

    let match_ids: HashSet<i64> = picks.iter().map(|p| p.match_id).collect();
    if match_ids.len() != PICKS_PER_ROUND {
        return Err(AppError::validation("Duplicate match_id in picks."));
    }

    let round_match_ids = db::get_round_match_ids(pool, round.id).await?;
    if !match_ids.is_subset(&round_match_ids) {
        return Err(AppError::validation("All picks must be matches from this round."));
    }

    let parsed = picks
        .iter()
        .map(|p| Ok((p.match_id, p.pick.parse::<Pick>()?)))
        .collect::<Result<Vec<_>, AppError>>()?;

    db::upsert_predictions(pool, round.id, team.id, &parsed).await?;

    tracing::info!("Stored {} picks for {} on matchday {}", parsed.len(), team.name, matchday);
    Ok(())
}

pub async fn record_odds(pool: &SqlitePool, match_id: i64, odds: &Odds) -> Result<(), AppError> {
    let invalid = [odds.odd_1, odds.odd_x, odds.odd_2]
        .into_iter()
        .flatten()
        .any(|odd| !is_valid_odd(odd));
    if invalid {
        return Err(AppError::validation("Odds must be positive numbers."));
    }

    if !db::match_exists(pool, match_id).await? {
        return Err(AppError::not_found("Match not found."));
    }

    db::upsert_odds(pool, match_id, odds).await?;
    tracing::debug!("Odds for match {} set to {:?}", match_id, odds);
    Ok(())
}

pub async fn record_coach_points(
    pool: &SqlitePool,
    matchday: i64,
    team_name: &str,
    points: i64,
) -> Result<(), AppError> {
    let round = require_round(pool, matchday).await?;
    let team = require_team(pool, team_name).await?;

    db::upsert_coach_points(pool, round.id, team.id, points).await?;
    tracing::debug!("Coach points for {} on matchday {}: {}", team.name, matchday, points);
    Ok(())
}

pub async fn round_matches(pool: &SqlitePool, matchday: i64) -> Result<Vec<MatchWithOdds>, AppError> {
    let round = require_round(pool, matchday).await?;
    Ok(db::get_round_matches(pool, round.id).await?)
}

pub async fn round_predictions(pool: &SqlitePool, matchday: i64) -> Result<RoundPredictions, AppError> {
    let round = require_round(pool, matchday).await?;
    Ok(RoundPredictions {
        matchday,
        predictions: db::get_round_predictions_by_team(pool, round.id).await?,
    })
}

pub async fn round_coach_points(pool: &SqlitePool, matchday: i64) -> Result<RoundCoachPoints, AppError> {
    let round = require_round(pool, matchday).await?;
    Ok(RoundCoachPoints {
        matchday,
        coach_points: db::get_round_coach_points_by_team(pool, round.id).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_match, test_pool};

    /// A round with six matches; returns (round, match ids).
    async fn round_with_matches(pool: &SqlitePool, matchday: i64) -> (Round, Vec<i64>) {
        let round = db::ensure_round(pool, matchday, None).await.unwrap();
        let mut ids = Vec::new();
        for i in 0..6 {
            let api_id = matchday * 100 + i;
            let date = format!("2024-08-10T1{}:00:00Z", i);
            ids.push(insert_match(pool, round.id, api_id, &date, None).await);
        }
        (round, ids)
    }

    fn picks(ids: &[i64], symbol: &str) -> Vec<PickInput> {
        ids.iter()
            .map(|&match_id| PickInput { match_id, pick: symbol.to_string() })
            .collect()
    }

    async fn stored(pool: &SqlitePool, round: &Round) -> Vec<Prediction> {
        db::get_round_predictions(pool, round.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_valid_picks_are_stored() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;

        record_predictions(&pool, 1, "TripleB", &picks(&ids[..5], "X")).await.unwrap();

        let rows = stored(&pool, &round).await;
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|p| p.pick == Pick::Draw));
    }

    #[tokio::test]
    async fn test_resubmission_overwrites_per_match() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;

        record_predictions(&pool, 1, "TripleB", &picks(&ids[..5], "1")).await.unwrap();
        record_predictions(&pool, 1, "TripleB", &picks(&ids[1..6], "2")).await.unwrap();

        let rows = stored(&pool, &round).await;
        // the first match keeps its old pick, the other five are replaced or added
        assert_eq!(rows.len(), 6);
        let first = rows.iter().find(|p| p.match_id == ids[0]).unwrap();
        assert_eq!(first.pick, Pick::Home);
        assert_eq!(rows.iter().filter(|p| p.pick == Pick::Away).count(), 5);
    }

    #[tokio::test]
    async fn test_wrong_count_is_rejected() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;

        for n in [0, 4, 6] {
            let err = record_predictions(&pool, 1, "TripleB", &picks(&ids[..n], "1"))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "count {}", n);
        }
        assert!(stored(&pool, &round).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_match_is_rejected() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;
        let dup = [ids[0], ids[1], ids[2], ids[3], ids[0]];

        let err = record_predictions(&pool, 1, "TripleB", &picks(&dup, "1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Duplicate match_id in picks.");
        assert!(stored(&pool, &round).await.is_empty());
    }

    #[tokio::test]
    async fn test_match_from_other_round_is_rejected() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;
        let (_, other_ids) = round_with_matches(&pool, 2).await;
        let mixed = [ids[0], ids[1], ids[2], ids[3], other_ids[0]];

        let err = record_predictions(&pool, 1, "TripleB", &picks(&mixed, "1")).await.unwrap_err();
        assert_eq!(err.to_string(), "All picks must be matches from this round.");
        assert!(stored(&pool, &round).await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_resubmission_keeps_stored_picks() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;
        let (_, other_ids) = round_with_matches(&pool, 2).await;

        record_predictions(&pool, 1, "TripleB", &picks(&ids[..5], "1")).await.unwrap();
        let before = stored(&pool, &round).await;

        let dup = [ids[1], ids[2], ids[3], ids[4], ids[1]];
        let err = record_predictions(&pool, 1, "TripleB", &picks(&dup, "2")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mixed = [ids[1], ids[2], ids[3], ids[5], other_ids[0]];
        let err = record_predictions(&pool, 1, "TripleB", &picks(&mixed, "X")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let after = stored(&pool, &round).await;
        let pairs = |rows: &[Prediction]| {
            let mut pairs: Vec<(i64, Pick)> = rows.iter().map(|p| (p.match_id, p.pick)).collect();
            pairs.sort_by_key(|(match_id, _)| *match_id);
            pairs
        };
        assert_eq!(after.len(), 5);
        assert_eq!(pairs(&after), pairs(&before));
        assert!(after.iter().all(|p| p.pick == Pick::Home));
    }

    #[tokio::test]
    async fn test_invalid_symbol_writes_nothing() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;
        let mut submitted = picks(&ids[..5], "1");
        submitted[4].pick = "3".to_string();

        let err = record_predictions(&pool, 1, "TripleB", &submitted).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(stored(&pool, &round).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_round_and_team() {
        let pool = test_pool().await;
        let (_, ids) = round_with_matches(&pool, 1).await;

        let err = record_predictions(&pool, 9, "TripleB", &picks(&ids[..5], "1")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = record_predictions(&pool, 1, "Nobody FC", &picks(&ids[..5], "1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown team.");
    }

    #[tokio::test]
    async fn test_record_odds() {
        let pool = test_pool().await;
        let (round, ids) = round_with_matches(&pool, 1).await;
        let odds = Odds { odd_1: Some(1.9), odd_x: Some(3.4), odd_2: None };

        record_odds(&pool, ids[2], &odds).await.unwrap();
        let matches = db::get_round_matches(&pool, round.id).await.unwrap();
        assert_eq!(matches[2].odds, odds);

        let err = record_odds(&pool, 9999, &odds).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let bad = Odds { odd_1: Some(-1.0), ..odds };
        let err = record_odds(&pool, ids[2], &bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_record_coach_points() {
        let pool = test_pool().await;
        round_with_matches(&pool, 1).await;

        record_coach_points(&pool, 1, "Verlult", 3).await.unwrap();
        record_coach_points(&pool, 1, "Verlult", -1).await.unwrap();

        let coach = round_coach_points(&pool, 1).await.unwrap();
        assert_eq!(coach.coach_points.get("Verlult"), Some(&-1));

        assert!(matches!(
            record_coach_points(&pool, 2, "Verlult", 1).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            record_coach_points(&pool, 1, "Ghosts", 1).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_round_predictions_grouped() {
        let pool = test_pool().await;
        let (_, ids) = round_with_matches(&pool, 1).await;
        record_predictions(&pool, 1, "Verlult", &picks(&ids[..5], "2")).await.unwrap();
        record_predictions(&pool, 1, "Oddsjagers", &picks(&ids[1..6], "1")).await.unwrap();

        let grouped = round_predictions(&pool, 1).await.unwrap();
        let teams: Vec<&String> = grouped.predictions.keys().collect();
        assert_eq!(teams, vec!["Oddsjagers", "Verlult"]);
        assert_eq!(grouped.predictions["Verlult"][0], PickEntry { match_id: ids[0], pick: Pick::Away });
    }
}
