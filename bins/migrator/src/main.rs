//! Database migration runner for Kasira.
//!
//! Usage:
//!   migrator up      - apply pending migrations
//!   migrator down    - roll back the last migration
//!   migrator status  - show applied and pending migrations
//!   migrator fresh   - drop everything and re-run from scratch

use sea_orm_migration::MigratorTrait;

use kasira_db::{connect, migration::Migrator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Accepts either the bare DATABASE_URL or the server's config form.
    let url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("KASIRA__DATABASE__URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL (or KASIRA__DATABASE__URL) is not set"))?;
    let db = connect(&url, 1).await?;

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => anyhow::bail!("unknown command: {other} (expected up, down, status or fresh)"),
    }

    Ok(())
}
