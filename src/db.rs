use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::commands::CommandError;

pub type DbPool = SqlitePool;

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(database_url: &str) -> Result<DbPool, CommandError> {
  info!("Initializing database at: {}", database_url);

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(database_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
