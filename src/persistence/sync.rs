//! Moves the in-memory collections to and from PostgreSQL.
//!
//! Documents are restored once at startup and snapshotted on a fixed
//! interval. A separate task appends every ledger event to the event log.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use super::postgres::PostgresPersistence;
use crate::domain::{Collections, CommissionRecord, Document, LedgerEvent, Registry};
use crate::error::LedgerError;

/// Collection name for the commission audit log.
pub const COMMISSIONS: &str = "commissions";
/// Collection name for the set of applied payment ids.
pub const PROCESSED_PAYMENTS: &str = "processed_payments";

/// Document counts after a restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Accounts loaded.
    pub accounts: usize,
    /// Leads loaded.
    pub leads: usize,
    /// Withdrawals loaded.
    pub withdrawals: usize,
    /// Proposals loaded.
    pub proposals: usize,
    /// Commission records loaded.
    pub commissions: usize,
    /// Payment ids loaded.
    pub processed_payments: usize,
    /// Referral codes indexed.
    pub referral_codes: usize,
}

/// Loads every stored collection into `collections`.
///
/// Rows that no longer deserialize are skipped with a warning. The
/// referral code index is rebuilt from the restored accounts.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] on database failure.
pub async fn restore(
    store: &PostgresPersistence,
    collections: &Collections,
) -> Result<RestoreSummary, LedgerError> {
    let mut summary = RestoreSummary {
        accounts: restore_registry(store, &collections.accounts).await?,
        leads: restore_registry(store, &collections.leads).await?,
        withdrawals: restore_registry(store, &collections.withdrawals).await?,
        proposals: restore_registry(store, &collections.proposals).await?,
        ..RestoreSummary::default()
    };
    summary.referral_codes = collections.reindex_referral_codes().await;

    let mut commissions: Vec<CommissionRecord> = decode_rows(store, COMMISSIONS).await?;
    commissions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    summary.commissions = commissions.len();
    *collections.commissions.write().await = commissions;

    let payments = store.load_collection(PROCESSED_PAYMENTS).await?;
    summary.processed_payments = payments.len();
    let mut processed = collections.processed_payments.lock().await;
    processed.clear();
    processed.extend(payments.into_iter().map(|row| row.id));

    Ok(summary)
}

/// Writes every collection to the document table.
///
/// # Errors
///
/// Returns [`LedgerError::PersistenceError`] on database failure and
/// [`LedgerError::Internal`] if a document fails to serialize.
pub async fn snapshot(
    store: &PostgresPersistence,
    collections: &Collections,
) -> Result<u64, LedgerError> {
    let mut written = 0;
    written += snapshot_registry(store, &collections.accounts).await?;
    written += snapshot_registry(store, &collections.leads).await?;
    written += snapshot_registry(store, &collections.withdrawals).await?;
    written += snapshot_registry(store, &collections.proposals).await?;

    let commissions = encode_all(
        collections
            .commissions
            .read()
            .await
            .iter()
            .map(|c| (c.id.to_string(), c)),
    )?;
    written += store.upsert_documents(COMMISSIONS, &commissions).await?;

    let payments: Vec<(String, serde_json::Value)> = collections
        .processed_payments
        .lock()
        .await
        .iter()
        .map(|id| (id.clone(), serde_json::Value::Bool(true)))
        .collect();
    written += store.upsert_documents(PROCESSED_PAYMENTS, &payments).await?;

    Ok(written)
}

/// Snapshots `collections` every `interval` and prunes the event log.
pub async fn run_snapshots(
    store: PostgresPersistence,
    collections: Arc<Collections>,
    interval: Duration,
    cleanup_after_days: u64,
) {
    let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match snapshot(&store, &collections).await {
            Ok(written) => tracing::debug!(written, "snapshot stored"),
            Err(err) => tracing::error!(error = %err, "snapshot failed"),
        }
        if cleanup_after_days > 0 {
            match store.delete_old_events(cleanup_after_days).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "pruned event log"),
                Err(err) => tracing::warn!(error = %err, "event log cleanup failed"),
            }
        }
    }
}

/// Appends every event from `rx` to the event log until the bus closes.
pub async fn run_event_log(store: PostgresPersistence, mut rx: broadcast::Receiver<LedgerEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let payload = match serde_json::to_value(&event) {
                    Ok(payload) => payload,
                    Err(err) => {
                        tracing::error!(error = %err, "event serialization failed");
                        continue;
                    }
                };
                let subject = *event.user_id().as_uuid();
                if let Err(err) = store
                    .save_event(subject, event.event_type_str(), &payload)
                    .await
                {
                    tracing::error!(
                        event_type = event.event_type_str(),
                        error = %err,
                        "event log write failed"
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "event log lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn restore_registry<D: Document>(
    store: &PostgresPersistence,
    registry: &Registry<D>,
) -> Result<usize, LedgerError> {
    let docs: Vec<D> = decode_rows(store, D::COLLECTION).await?;
    let count = docs.len();
    registry.replace_all(docs).await;
    Ok(count)
}

async fn snapshot_registry<D: Document>(
    store: &PostgresPersistence,
    registry: &Registry<D>,
) -> Result<u64, LedgerError> {
    let docs = registry.snapshot().await;
    let rows = encode_all(docs.iter().map(|d| (d.id().to_string(), d)))?;
    store.upsert_documents(D::COLLECTION, &rows).await
}

async fn decode_rows<T: serde::de::DeserializeOwned>(
    store: &PostgresPersistence,
    collection: &str,
) -> Result<Vec<T>, LedgerError> {
    let rows = store.load_collection(collection).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row.body) {
            Ok(doc) => Some(doc),
            Err(err) => {
                tracing::warn!(collection, id = %row.id, error = %err, "skipping undecodable document");
                None
            }
        })
        .collect())
}

fn encode_all<'a, T, I>(items: I) -> Result<Vec<(String, serde_json::Value)>, LedgerError>
where
    T: serde::Serialize + 'a,
    I: Iterator<Item = (String, &'a T)>,
{
    items
        .map(|(id, item)| {
            serde_json::to_value(item)
                .map(|body| (id, body))
                .map_err(|e| LedgerError::Internal(e.to_string()))
        })
        .collect()
}
