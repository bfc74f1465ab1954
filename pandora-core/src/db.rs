use crate::config::DatabaseConfig;
use crate::error::PandoraError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, PandoraError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<String, PandoraError> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn count_stories(pool: &PgPool) -> Result<i64, PandoraError> {
    let row: (i64,) = sqlx::query_as("SELECT count(*) FROM stories")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
