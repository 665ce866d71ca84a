//! Database rows for the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from the `documents` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Collection name (e.g. `"accounts"`).
    pub collection: String,
    /// Document key, unique within the collection.
    pub id: String,
    /// Serialized document.
    pub body: serde_json::Value,
    /// Last upsert timestamp.
    pub updated_at: DateTime<Utc>,
}
