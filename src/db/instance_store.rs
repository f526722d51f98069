//! Durable keyed storage of instance documents.
//!
//! One row per sync identifier. The tenders/chores/tending-log collections
//! are persisted as a single JSON blob in the `document` column; the two
//! last-tended cache fields live in scalar columns next to it. Every write
//! replaces the whole row in one statement, so readers never observe a
//! half-written document.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::models::{Chore, HistoryEntry, InstanceDocument, Tender};

/// Errors from the document store.
#[derive(Debug)]
pub enum StoreError {
    /// No document was ever created for this sync identifier.
    NotFound(String),
    /// The stored document blob could not be parsed.
    Corrupt(String, serde_json::Error),
    /// The backing database failed.
    Database(sqlx::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(sync_id) => {
                write!(f, "no instance for sync id {}", sync_id)
            }
            StoreError::Corrupt(sync_id, e) => {
                write!(f, "corrupt document for sync id {}: {}", sync_id, e)
            }
            StoreError::Database(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Corrupt(_, e) => Some(e),
            StoreError::Database(e) => Some(e),
            StoreError::NotFound(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

#[derive(sqlx::FromRow)]
struct InstanceRow {
    sync_id: String,
    document: String,
    last_tended_at: Option<i64>,
    last_tender: Option<String>,
}

/// The serialized shape of the `document` column.
#[derive(Serialize, Deserialize)]
struct DocumentBlob {
    tenders: Vec<Tender>,
    chores: Vec<Chore>,
    tending_log: Vec<HistoryEntry>,
}

/// Keyed document store over a SQLite pool.
#[derive(Debug, Clone)]
pub struct InstanceStore {
    pool: SqlitePool,
}

impl InstanceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the document for `sync_id`, creating and persisting a seeded
    /// one on first access.
    ///
    /// The seed insert uses `ON CONFLICT DO NOTHING`, so two concurrent
    /// first accesses converge on a single document: whichever insert lands
    /// first wins and the other caller reads it back.
    pub async fn get_or_create(&self, sync_id: &str) -> Result<InstanceDocument, StoreError> {
        let seed = InstanceDocument::seeded(sync_id);
        let blob = serialize_blob(&seed)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO instances (sync_id, document, last_tended_at, last_tender, created_at, updated_at)
            VALUES (?, ?, NULL, NULL, ?, ?)
            ON CONFLICT(sync_id) DO NOTHING
            "#,
        )
        .bind(sync_id)
        .bind(&blob)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let row: InstanceRow = sqlx::query_as(
            "SELECT sync_id, document, last_tended_at, last_tender FROM instances WHERE sync_id = ?",
        )
        .bind(sync_id)
        .fetch_one(&self.pool)
        .await?;

        hydrate(row)
    }

    /// Atomically overwrites the full document for an existing key.
    pub async fn replace(&self, sync_id: &str, doc: &InstanceDocument) -> Result<(), StoreError> {
        let blob = serialize_blob(doc)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            UPDATE instances
            SET document = ?, last_tended_at = ?, last_tender = ?, updated_at = ?
            WHERE sync_id = ?
            "#,
        )
        .bind(&blob)
        .bind(doc.last_tended_at)
        .bind(&doc.last_tender)
        .bind(&now)
        .bind(sync_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(sync_id.to_string()));
        }
        Ok(())
    }
}

fn serialize_blob(doc: &InstanceDocument) -> Result<String, StoreError> {
    let blob = DocumentBlob {
        tenders: doc.tenders.clone(),
        chores: doc.chores.clone(),
        tending_log: doc.tending_log.clone(),
    };
    serde_json::to_string(&blob).map_err(|e| StoreError::Corrupt(doc.sync_id.clone(), e))
}

fn hydrate(row: InstanceRow) -> Result<InstanceDocument, StoreError> {
    let blob: DocumentBlob = serde_json::from_str(&row.document)
        .map_err(|e| StoreError::Corrupt(row.sync_id.clone(), e))?;

    Ok(InstanceDocument {
        sync_id: row.sync_id,
        tenders: blob.tenders,
        chores: blob.chores,
        tending_log: blob.tending_log,
        last_tended_at: row.last_tended_at,
        last_tender: row.last_tender,
    })
}
