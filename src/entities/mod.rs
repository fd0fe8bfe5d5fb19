//! Entity module - SeaORM entity definitions.
//! The application only persists key/value rows; everything else is either
//! fetched from the catalog API or computed.

pub mod stored_value;

pub use stored_value::{
    Column as StoredValueColumn, Entity as StoredValue, Model as StoredValueModel,
};
