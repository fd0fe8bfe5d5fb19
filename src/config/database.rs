//! Database configuration module.
//!
//! The `SQLite` database plays the role of the browser's local storage: a single
//! key/value table created from the entity definition with `SeaORM`'s
//! `Schema::create_table_from_entity`, so no SQL is written by hand.

use crate::entities::StoredValue;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/stone_quote.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns
/// the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    tracing::debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the key/value table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut stored_values = schema.create_table_from_entity(StoredValue);
    stored_values.if_not_exists();

    db.execute(builder.build(&stored_values)).await?;

    Ok(())
}
