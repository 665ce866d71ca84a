//! Concurrent document storage with per-document fine-grained locking.
//!
//! [`Registry`] stores one collection of documents in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::RwLock`]. A
//! read-check-write sequence on one document holds that document's write
//! lock, so concurrent webhooks crediting the same user cannot lose updates.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::error::LedgerError;

/// A record stored in a [`Registry`].
pub trait Document:
    fmt::Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Key type.
    type Id: Copy
        + Eq
        + Hash
        + fmt::Debug
        + fmt::Display
        + std::str::FromStr
        + Send
        + Sync
        + 'static;

    /// Collection name used by the persistence layer.
    const COLLECTION: &'static str;

    /// Returns the document key.
    fn id(&self) -> Self::Id;

    /// Error reported when `id` is absent.
    fn not_found(id: Self::Id) -> LedgerError;
}

/// Store for one collection of documents.
///
/// # Concurrency
///
/// - Multiple tasks may read the same document concurrently.
/// - Writes to different documents are concurrent.
/// - Writes to the same document are serialized.
#[derive(Debug)]
pub struct Registry<D: Document> {
    docs: RwLock<HashMap<D::Id, Arc<RwLock<D>>>>,
}

impl<D: Document> Registry<D> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new document.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidRequest`] if a document with the same
    /// ID already exists (should never happen with UUID v4).
    pub async fn insert(&self, doc: D) -> Result<D::Id, LedgerError> {
        let id = doc.id();
        let mut map = self.docs.write().await;
        if map.contains_key(&id) {
            return Err(LedgerError::InvalidRequest(format!(
                "{} {id} already exists",
                D::COLLECTION
            )));
        }
        map.insert(id, Arc::new(RwLock::new(doc)));
        Ok(id)
    }

    /// Returns the document behind its per-document lock.
    ///
    /// # Errors
    ///
    /// Returns the collection's not-found error if `id` is absent.
    pub async fn get(&self, id: D::Id) -> Result<Arc<RwLock<D>>, LedgerError> {
        let map = self.docs.read().await;
        map.get(&id).cloned().ok_or_else(|| D::not_found(id))
    }

    /// Returns a copy of the document.
    ///
    /// # Errors
    ///
    /// Returns the collection's not-found error if `id` is absent.
    pub async fn read(&self, id: D::Id) -> Result<D, LedgerError> {
        let lock = self.get(id).await?;
        let doc = lock.read().await;
        Ok(doc.clone())
    }

    /// Returns `true` if a document with `id` exists.
    pub async fn contains(&self, id: D::Id) -> bool {
        self.docs.read().await.contains_key(&id)
    }

    /// Returns copies of every document matching `pred`.
    ///
    /// The map lock is released before any document lock is awaited, so a
    /// scan never blocks inserts behind a held document.
    pub async fn filter<F>(&self, pred: F) -> Vec<D>
    where
        F: Fn(&D) -> bool,
    {
        let mut out = Vec::new();
        for lock in self.entries().await {
            let doc = lock.read().await;
            if pred(&doc) {
                out.push(doc.clone());
            }
        }
        out
    }

    async fn entries(&self) -> Vec<Arc<RwLock<D>>> {
        self.docs.read().await.values().map(Arc::clone).collect()
    }

    /// Returns copies of all documents.
    pub async fn snapshot(&self) -> Vec<D> {
        self.filter(|_| true).await
    }

    /// Replaces the whole collection, e.g. when restoring from storage.
    pub async fn replace_all(&self, docs: Vec<D>) {
        let mut map = self.docs.write().await;
        map.clear();
        for doc in docs {
            map.insert(doc.id(), Arc::new(RwLock::new(doc)));
        }
    }

    /// Returns the number of documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Returns `true` if the collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

impl<D: Document> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}
