//! PostgreSQL implementation of the persistence layer.

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::StoredDocument;
use crate::error::LedgerError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        subject: Uuid,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, LedgerError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO ledger_events (subject, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(subject)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Upserts a batch of documents of one collection in a single
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn upsert_documents(
        &self,
        collection: &str,
        docs: &[(String, serde_json::Value)],
    ) -> Result<u64, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for (id, body) in docs {
            let result = sqlx::query(
                "INSERT INTO documents (collection, id, body, updated_at) VALUES ($1, $2, $3, now()) \
                 ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
            )
            .bind(collection)
            .bind(id)
            .bind(body)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        Ok(written)
    }

    /// Loads every stored document of a collection, oldest update first.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn load_collection(&self, collection: &str) -> Result<Vec<StoredDocument>, LedgerError> {
        let rows = sqlx::query_as::<_, (String, String, serde_json::Value, DateTime<Utc>)>(
            "SELECT collection, id, body, updated_at FROM documents \
             WHERE collection = $1 ORDER BY updated_at ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(collection, id, body, updated_at)| StoredDocument {
                collection,
                id,
                body,
                updated_at,
            })
            .collect())
    }

    /// Deletes logged events older than the given number of days.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError::PersistenceError`] on database failure.
    pub async fn delete_old_events(&self, before_days: u64) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM ledger_events WHERE created_at < $1")
            .bind(cutoff(Utc::now(), before_days))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// `now` minus `days`, saturating at the earliest representable instant.
fn cutoff(now: DateTime<Utc>, days: u64) -> DateTime<Utc> {
    i64::try_from(days)
        .ok()
        .and_then(TimeDelta::try_days)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_subtracts_days() {
        let now = Utc::now();
        assert_eq!(now - cutoff(now, 30), TimeDelta::days(30));
    }

    #[test]
    fn cutoff_saturates_on_huge_values() {
        assert_eq!(cutoff(Utc::now(), u64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
