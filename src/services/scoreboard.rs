use sqlx::SqlitePool;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::db;
use crate::error::AppError;
use crate::models::*;
use crate::services::recorder::require_round;
use crate::utils::round3;

/// Points shared each round among the teams with the best 1X2 score.
pub const WEEKLY_BONUS: f64 = 2.0;

/// Sum of the odds of a team's correct picks. Unfinished matches, wrong picks and
/// missing odds all count zero.
pub fn raw_score(predictions: &[&Prediction], matches: &HashMap<i64, &MatchWithOdds>) -> f64 {
    predictions
        .iter()
        .filter_map(|p| {
            let m = matches.get(&p.match_id)?;
            if m.match_info.outcome()? != p.pick {
                return None;
            }
            m.odds.for_pick(p.pick)
        })
        .sum()
}

/// Ranks the teams of one round.
///
/// Rows follow `teams` order before the sort, and the sort is stable, so equal totals
/// keep that order.
pub fn compute_scoreboard(
    matchday: i64,
    teams: &[Team],
    matches: &[MatchWithOdds],
    predictions: &[Prediction],
    coach_points: &HashMap<i64, i64>,
) -> Scoreboard {
    let matches_by_id: HashMap<i64, &MatchWithOdds> =
        matches.iter().map(|m| (m.match_info.id, m)).collect();

    let mut predictions_by_team: HashMap<i64, Vec<&Prediction>> = HashMap::new();
    for p in predictions {
        predictions_by_team.entry(p.team_id).or_default().push(p);
    }

    let scored: Vec<(&Team, f64)> = teams
        .iter()
        .map(|team| {
            let picks = predictions_by_team.get(&team.id).map(Vec::as_slice).unwrap_or(&[]);
            (team, round3(raw_score(picks, &matches_by_id)))
        })
        .collect();

    let max_score = scored.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    let winners = scored.iter().filter(|(_, s)| *s == max_score).count();
    let bonus_each = if max_score > 0.0 && winners > 0 {
        WEEKLY_BONUS / winners as f64
    } else {
        0.0
    };

    let mut rows: Vec<ScoreboardRow> = scored
        .into_iter()
        .map(|(team, points_1x2)| {
            let bonus = if max_score > 0.0 && points_1x2 == max_score {
                round3(bonus_each)
            } else {
                0.0
            };
            let coach = coach_points.get(&team.id).copied().unwrap_or(0);
            ScoreboardRow {
                team: team.name.clone(),
                points_1x2,
                bonus,
                coach_points: coach,
                total_round: round3(points_1x2 + bonus + coach as f64),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.total_round.partial_cmp(&a.total_round).unwrap_or(Ordering::Equal));

    Scoreboard { matchday, rows }
}

/// Loads everything the scoreboard needs for one round and computes it.
pub async fn load_scoreboard(pool: &SqlitePool, matchday: i64) -> Result<Scoreboard, AppError> {
    let round = require_round(pool, matchday).await?;
    scoreboard_for_round(pool, &round).await
}

async fn scoreboard_for_round(pool: &SqlitePool, round: &Round) -> Result<Scoreboard, AppError> {
    let teams = db::get_teams_in_seed_order(pool).await?;
    let matches = db::get_round_matches(pool, round.id).await?;
    let predictions = db::get_round_predictions(pool, round.id).await?;
    let coach = db::get_round_coach_points(pool, round.id).await?;

    Ok(compute_scoreboard(round.matchday, &teams, &matches, &predictions, &coach))
}

/// Adds up round scoreboards per team into a season table.
pub fn compute_season_standings(teams: &[Team], scoreboards: &[Scoreboard]) -> SeasonStandings {
    let mut rows: Vec<StandingsRow> = teams
        .iter()
        .map(|t| StandingsRow {
            team: t.name.clone(),
            points_1x2: 0.0,
            bonus: 0.0,
            coach: 0,
            total: 0.0,
        })
        .collect();

    for board in scoreboards {
        for r in &board.rows {
            if let Some(row) = rows.iter_mut().find(|row| row.team == r.team) {
                row.points_1x2 += r.points_1x2;
                row.bonus += r.bonus;
                row.coach += r.coach_points;
                row.total += r.total_round;
            }
        }
    }

    for row in &mut rows {
        row.points_1x2 = round3(row.points_1x2);
        row.bonus = round3(row.bonus);
        row.total = round3(row.total);
    }
    rows.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));

    SeasonStandings {
        rounds: scoreboards.len(),
        rows,
    }
}

pub async fn load_season_standings(pool: &SqlitePool) -> Result<SeasonStandings, AppError> {
    let teams = db::get_teams_in_seed_order(pool).await?;
    let mut rounds = db::list_rounds(pool).await?;
    rounds.sort_by_key(|r| r.matchday);

    let mut scoreboards = Vec::with_capacity(rounds.len());
    for round in &rounds {
        scoreboards.push(scoreboard_for_round(pool, round).await?);
    }

    Ok(compute_season_standings(&teams, &scoreboards))
}
