//! Instance operations: the domain logic layered on the document store.
//!
//! Every mutation follows the same shape: load the document (seeding it on
//! first access), mutate an in-memory copy, write the whole document back.
//! The round trip is not atomic at the storage layer, so each operation runs
//! inside a per-sync-id critical section; operations on different sync ids
//! never contend.

mod import;

pub use import::{ExternalDocument, ImportSummary};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::{InstanceStore, StoreError};
use crate::models::{Chore, HistoryEntry, InstanceDocument, Tender};

/// Errors surfaced by instance operations.
#[derive(Debug)]
pub enum OpError {
    /// A required field was missing or malformed. The operation had no effect.
    InvalidArgument(String),
    /// A referenced id does not exist in the document. No effect.
    NotFound(String),
    /// The backing store failed. Fatal to the request.
    Storage(StoreError),
}

impl std::fmt::Display for OpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            OpError::NotFound(msg) => write!(f, "not found: {}", msg),
            OpError::Storage(e) => write!(f, "storage failure: {}", e),
        }
    }
}

impl std::error::Error for OpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OpError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for OpError {
    fn from(e: StoreError) -> Self {
        OpError::Storage(e)
    }
}

/// Trims `value` and rejects it if nothing remains.
fn require_trimmed(value: &str, field: &str) -> Result<String, OpError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OpError::InvalidArgument(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Domain operations over instance documents.
pub struct InstanceService {
    store: InstanceStore,
    /// One async mutex per sync id, created on first use and kept for the
    /// life of the process. Household-scale key counts make eviction moot.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InstanceService {
    pub fn new(store: InstanceStore) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, sync_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(sync_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `mutate` against the document for `sync_id` and persists the
    /// result, all inside that sync id's critical section.
    async fn with_instance<T>(
        &self,
        sync_id: &str,
        mutate: impl FnOnce(&mut InstanceDocument) -> Result<T, OpError>,
    ) -> Result<T, OpError> {
        let lock = self.lock_for(sync_id).await;
        let _guard = lock.lock().await;

        let mut doc = self.store.get_or_create(sync_id).await?;
        let result = mutate(&mut doc)?;
        self.store.replace(sync_id, &doc).await?;
        Ok(result)
    }

    /// Loads the document without writing it back.
    pub(crate) async fn load(&self, sync_id: &str) -> Result<InstanceDocument, OpError> {
        Ok(self.store.get_or_create(sync_id).await?)
    }

    // ---- Tenders ----

    pub async fn list_tenders(&self, sync_id: &str) -> Result<Vec<Tender>, OpError> {
        Ok(self.load(sync_id).await?.tenders)
    }

    /// Adds a tender. Names are not checked for uniqueness.
    pub async fn add_tender(&self, sync_id: &str, name: &str) -> Result<Tender, OpError> {
        let name = require_trimmed(name, "name")?;
        self.with_instance(sync_id, |doc| {
            let tender = Tender::new(name);
            doc.tenders.push(tender.clone());
            Ok(tender)
        })
        .await
    }

    /// Renames a tender in place. History entries keep the old name.
    pub async fn rename_tender(
        &self,
        sync_id: &str,
        tender_id: &str,
        new_name: &str,
    ) -> Result<Tender, OpError> {
        let new_name = require_trimmed(new_name, "name")?;
        let tender_id = tender_id.to_string();
        self.with_instance(sync_id, move |doc| {
            let tender = doc
                .tenders
                .iter_mut()
                .find(|t| t.id == tender_id)
                .ok_or_else(|| OpError::NotFound(format!("tender {}", tender_id)))?;
            tender.name = new_name;
            Ok(tender.clone())
        })
        .await
    }

    /// Removes a tender. History entries referencing the former name are
    /// untouched.
    pub async fn delete_tender(&self, sync_id: &str, tender_id: &str) -> Result<(), OpError> {
        let tender_id = tender_id.to_string();
        self.with_instance(sync_id, move |doc| {
            let before = doc.tenders.len();
            doc.tenders.retain(|t| t.id != tender_id);
            if doc.tenders.len() == before {
                return Err(OpError::NotFound(format!("tender {}", tender_id)));
            }
            Ok(())
        })
        .await
    }

    // ---- Chores ----

    pub async fn list_chores(&self, sync_id: &str) -> Result<Vec<Chore>, OpError> {
        Ok(self.load(sync_id).await?.chores)
    }

    pub async fn add_chore(
        &self,
        sync_id: &str,
        name: &str,
        icon: &str,
    ) -> Result<Chore, OpError> {
        let name = require_trimmed(name, "name")?;
        let icon = require_trimmed(icon, "icon")?;
        self.with_instance(sync_id, |doc| {
            let chore = Chore::new(name, icon);
            doc.chores.push(chore.clone());
            Ok(chore)
        })
        .await
    }

    /// Partial update: name and/or icon. At least one must be given, and
    /// any given field must be non-empty after trimming.
    pub async fn update_chore(
        &self,
        sync_id: &str,
        chore_id: &str,
        name: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Chore, OpError> {
        if name.is_none() && icon.is_none() {
            return Err(OpError::InvalidArgument(
                "at least one of name or icon must be given".to_string(),
            ));
        }
        let name = name.map(|n| require_trimmed(n, "name")).transpose()?;
        let icon = icon.map(|i| require_trimmed(i, "icon")).transpose()?;
        let chore_id = chore_id.to_string();
        self.with_instance(sync_id, move |doc| {
            let chore = doc
                .chores
                .iter_mut()
                .find(|c| c.id == chore_id)
                .ok_or_else(|| OpError::NotFound(format!("chore {}", chore_id)))?;
            if let Some(name) = name {
                chore.name = name;
            }
            if let Some(icon) = icon {
                chore.icon = icon;
            }
            Ok(chore.clone())
        })
        .await
    }

    /// Removes a chore and every history entry recorded against it, then
    /// rebuilds the last-tended cache from what remains.
    pub async fn delete_chore(&self, sync_id: &str, chore_id: &str) -> Result<(), OpError> {
        let chore_id = chore_id.to_string();
        self.with_instance(sync_id, move |doc| {
            let before = doc.chores.len();
            doc.chores.retain(|c| c.id != chore_id);
            if doc.chores.len() == before {
                return Err(OpError::NotFound(format!("chore {}", chore_id)));
            }
            doc.tending_log.retain(|e| e.chore_id != chore_id);
            doc.recompute_last_tended();
            Ok(())
        })
        .await
    }

    // ---- History ----

    /// Records that `tender_name` tended `chore_id` just now.
    ///
    /// Neither the tender name nor the chore id is checked against the
    /// document: ad hoc one-off tenders are allowed, and the client decides
    /// whether to also add the tender to the roster.
    pub async fn record_tending(
        &self,
        sync_id: &str,
        tender_name: &str,
        chore_id: &str,
        notes: Option<&str>,
    ) -> Result<HistoryEntry, OpError> {
        let tender_name = require_trimmed(tender_name, "tender")?;
        let chore_id = require_trimmed(chore_id, "chore_id")?;
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self.with_instance(sync_id, |doc| {
            let entry = HistoryEntry::new(tender_name, chore_id, notes);
            // The new entry is the newest by construction: no rescan needed.
            doc.last_tended_at = Some(entry.timestamp);
            doc.last_tender = Some(entry.person.clone());
            doc.tending_log.push(entry.clone());
            Ok(entry)
        })
        .await
    }

    /// All history entries, newest first. Equal timestamps keep their
    /// relative insertion order.
    pub async fn list_history(&self, sync_id: &str) -> Result<Vec<HistoryEntry>, OpError> {
        Ok(self.load(sync_id).await?.history_newest_first())
    }

    pub async fn delete_history_entry(
        &self,
        sync_id: &str,
        entry_id: &str,
    ) -> Result<(), OpError> {
        let entry_id = entry_id.to_string();
        self.with_instance(sync_id, move |doc| {
            let before = doc.tending_log.len();
            doc.tending_log.retain(|e| e.id != entry_id);
            if doc.tending_log.len() == before {
                return Err(OpError::NotFound(format!("history entry {}", entry_id)));
            }
            // The removed entry may have been the newest one.
            doc.recompute_last_tended();
            Ok(())
        })
        .await
    }
}
