//! Stored value entity - Key/value rows used as the application's local storage.
//!
//! The catalog cache document and the language preference each live in one row,
//! addressed by a fixed key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored value database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stored_values")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Storage key (e.g., `"catalog_cache"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Stored payload, usually JSON
    pub value: String,
    /// When this row was last written
    pub updated_at: DateTime,
}

/// `StoredValue` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
