use anyhow::Result;
use sqlx::SqlitePool;

/// The league's teams. Seeded at every startup; existing names are left alone.
pub const TEAM_NAMES: [&str; 7] = [
    "Roovertjes",
    "Narren United",
    "TripleB",
    "MML9878",
    "MarTim Lol",
    "Oddsjagers",
    "Verlult",
];

pub async fn seed_teams(pool: &SqlitePool) -> Result<()> {
    let mut inserted = 0u64;
    for name in TEAM_NAMES {
        inserted += sqlx::query("INSERT OR IGNORE INTO teams (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?
            .rows_affected();
    }

    if inserted > 0 {
        tracing::info!("Seeded {} teams", inserted);
    }
    Ok(())
}
