use anyhow::Context;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let database = &config().database;
    let url = database
        .url
        .as_deref()
        .context("DATABASE_URL must be set to run migrations")?;
    let target = DatabaseManager::redacted_url(url)?;

    let pool = DatabaseManager::connect(database).await?;
    let result = DatabaseManager::migrate(&pool).await;
    DatabaseManager::close(&pool).await;
    result?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "success": true, "database": target })),
        OutputFormat::Text => println!("Migrations applied to {}", target),
    }
    Ok(())
}
