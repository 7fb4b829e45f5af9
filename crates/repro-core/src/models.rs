//! Data model for the reproduction
//!
//! A single entity: `Item`, an identifier-bearing record with one string
//! attribute. Values are random unique tokens so synced rows are easy to
//! tell apart in the logs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row in the `items` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Unique identifier
    pub id: Uuid,
    /// Opaque string payload, a fresh random token on creation
    pub value: String,
}

impl Item {
    /// Create a new item with a freshly generated random value
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            value: Uuid::new_v4().to_string(),
        }
    }

    /// Create an item with a specific value
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            value: value.into(),
        }
    }

    /// Create an item with a specific ID (for loading from storage)
    pub fn with_id(id: Uuid, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}
