use anyhow::Result;
use std::path::Path;

use crate::config::{Config, LEAGUE_NAME};
use crate::db;
use crate::models::Scoreboard;
use crate::services::{self, DataFetcher};

pub async fn init_db(config: &Config) -> Result<()> {
    db::init_database(&config.database_url).await?;
    println!("✅ Database ready at {}", config.database_url);
    Ok(())
}

pub async fn sync_matchday(config: &Config, matchday: i64, season: Option<i64>) -> Result<()> {
    let pool = db::init_database(&config.database_url).await?;
    let fetcher = DataFetcher::new(config);

    println!("📥 Syncing matchday {}...", matchday);
    let report = services::sync_round(&pool, &fetcher, matchday, season).await?;
    println!(
        "✅ Matchday {}: {} inserted, {} updated",
        report.round.matchday, report.inserted, report.updated
    );
    Ok(())
}

pub async fn show_scoreboard(config: &Config, matchday: i64, csv_path: Option<&Path>) -> Result<()> {
    let pool = db::init_database(&config.database_url).await?;
    let board = services::load_scoreboard(&pool, matchday).await?;

    if let Some(path) = csv_path {
        export_scoreboard_csv(&board, path)?;
        println!("💾 Scoreboard for matchday {} written to {}", matchday, path.display());
        return Ok(());
    }

    println!("🏆 {}: matchday {}\n", LEAGUE_NAME, board.matchday);
    if board.rows.is_empty() {
        println!("📭 No teams found.");
        return Ok(());
    }

    println!("{:>3}  {:<16} {:>8} {:>7} {:>6} {:>8}", "#", "Team", "1X2", "Bonus", "Coach", "Total");
    for (i, row) in board.rows.iter().enumerate() {
        println!(
            "{:>3}  {:<16} {:>8.3} {:>7.3} {:>6} {:>8.3}",
            i + 1,
            row.team,
            row.points_1x2,
            row.bonus,
            row.coach_points,
            row.total_round
        );
    }
    Ok(())
}

pub async fn show_standings(config: &Config) -> Result<()> {
    let pool = db::init_database(&config.database_url).await?;
    let standings = services::load_season_standings(&pool).await?;

    println!("📊 {}: season standings after {} rounds\n", LEAGUE_NAME, standings.rounds);
    println!("{:>3}  {:<16} {:>8} {:>7} {:>6} {:>8}", "#", "Team", "1X2", "Bonus", "Coach", "Total");
    for (i, row) in standings.rows.iter().enumerate() {
        println!(
            "{:>3}  {:<16} {:>8.3} {:>7.3} {:>6} {:>8.3}",
            i + 1,
            row.team,
            row.points_1x2,
            row.bonus,
            row.coach,
            row.total
        );
    }
    Ok(())
}

/// One CSV row per team, in ranking order.
pub fn export_scoreboard_csv(board: &Scoreboard, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in &board.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
