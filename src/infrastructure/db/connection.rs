use crate::domain::error::{AppError, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

const SURVEY_SCHEMA: &str = include_str!("../../../resources/survey/schema.sql");

const SURVEY_SCHEMA_VERSION: i32 = 1;

/// Open the survey database, apply the schema and run a health check.
pub async fn init_survey_db(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let in_memory = is_in_memory(database_url);

    let mut options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse survey DB URL: {e}")))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    // Every connection to `sqlite::memory:` is its own database, so keep exactly one alive.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect survey DB: {e}")))?;

    let current_version = read_user_version(&pool).await?;
    if current_version > SURVEY_SCHEMA_VERSION {
        return Err(AppError::DatabaseError(format!(
            "Survey database schema too new: db user_version={} > supported_version={}",
            current_version, SURVEY_SCHEMA_VERSION
        )));
    }

    apply_schema(&pool).await?;
    set_user_version(&pool, SURVEY_SCHEMA_VERSION).await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Survey database health check failed: {e}")))?;

    tracing::info!(in_memory, schema_version = SURVEY_SCHEMA_VERSION, "Survey database ready");

    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SURVEY_SCHEMA.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply survey schema statement: {e}")))?;
    }
    Ok(())
}

async fn read_user_version(pool: &SqlitePool) -> Result<i32> {
    sqlx::query_scalar::<_, i32>("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read survey schema version: {e}")))
}

async fn set_user_version(pool: &SqlitePool, version: i32) -> Result<()> {
    // PRAGMA does not accept bound parameters.
    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to set survey schema version: {e}")))?;
    Ok(())
}
