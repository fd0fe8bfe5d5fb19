//! Key/value storage on top of the `stored_values` table.
//!
//! This is the persistence surface the rest of the crate sees: read a string by
//! key, write a string by key. Writes are upserts; the last writer wins.

use crate::{
    entities::{StoredValue, stored_value},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};

/// Reads the value stored under `key`, if any.
pub async fn get_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let row = StoredValue::find()
        .filter(stored_value::Column::Key.eq(key))
        .one(db)
        .await?;
    Ok(row.map(|r| r.value))
}

/// Writes `value` under `key`, replacing any previous value.
pub async fn set_value<C>(db: &C, key: &str, value: String) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();

    let existing = StoredValue::find()
        .filter(stored_value::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active_model: stored_value::ActiveModel = row.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_row = stored_value::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_row.insert(db).await?;
    }

    Ok(())
}

/// Removes the value stored under `key`. Missing keys are not an error.
pub async fn remove_value<C>(db: &C, key: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    StoredValue::delete_many()
        .filter(stored_value::Column::Key.eq(key))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_get_missing_key_returns_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_value(&db, "nothing_here").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_then_get() -> Result<()> {
        let db = setup_test_db().await?;
        set_value(&db, "language", "en".to_string()).await?;
        assert_eq!(get_value(&db, "language").await?.as_deref(), Some("en"));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_overwrites_existing() -> Result<()> {
        let db = setup_test_db().await?;
        set_value(&db, "language", "en".to_string()).await?;
        set_value(&db, "language", "tr".to_string()).await?;

        assert_eq!(get_value(&db, "language").await?.as_deref(), Some("tr"));
        let rows = StoredValue::find().all(&db).await?;
        assert_eq!(rows.len(), 1, "upsert should not create a second row");
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_value() -> Result<()> {
        let db = setup_test_db().await?;
        set_value(&db, "catalog_cache", "{}".to_string()).await?;
        remove_value(&db, "catalog_cache").await?;
        remove_value(&db, "catalog_cache").await?;
        assert!(get_value(&db, "catalog_cache").await?.is_none());
        Ok(())
    }
}
