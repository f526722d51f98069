//! Bulk import of an external export into an instance document.
//!
//! The export carries the same three collections under its own field names
//! (`caretakers` for tenders, `last_caretaker` for the last tender). The
//! merge is a union by id: records whose id already exists in the document
//! are skipped silently, so re-running the same import is safe.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{InstanceService, OpError};
use crate::models::{Chore, HistoryEntry, Tender};

/// An external export of a whole instance.
///
/// The three collections are required; deserialization fails if any is
/// missing or not an array.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalDocument {
    pub caretakers: Vec<Tender>,
    pub chores: Vec<Chore>,
    pub tending_log: Vec<HistoryEntry>,
    #[serde(default)]
    pub last_tended_timestamp: Option<i64>,
    #[serde(default)]
    pub last_caretaker: Option<String>,
}

impl ExternalDocument {
    /// Checks every record before anything is merged, so a bad import has
    /// no partial effect.
    fn validate(&self) -> Result<(), OpError> {
        for (i, tender) in self.caretakers.iter().enumerate() {
            if tender.id.trim().is_empty() || tender.name.trim().is_empty() {
                return Err(OpError::InvalidArgument(format!(
                    "caretaker {} is missing an id or name",
                    i
                )));
            }
        }
        for (i, chore) in self.chores.iter().enumerate() {
            if chore.id.trim().is_empty()
                || chore.name.trim().is_empty()
                || chore.icon.trim().is_empty()
            {
                return Err(OpError::InvalidArgument(format!(
                    "chore {} is missing an id, name, or icon",
                    i
                )));
            }
        }
        for (i, entry) in self.tending_log.iter().enumerate() {
            if entry.id.trim().is_empty() || entry.person.trim().is_empty() {
                return Err(OpError::InvalidArgument(format!(
                    "tending log entry {} is missing an id or person",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Counts of records *presented* in the import payload.
///
/// Skipped duplicates are not distinguishable from inserted records here;
/// the summary describes the payload, not the merge outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub tenders: usize,
    pub chores: usize,
    pub history_entries: usize,
}

impl InstanceService {
    /// Merges `import` into the document for `sync_id`.
    ///
    /// Union by id, first-write-wins: existing ids keep their current
    /// content even when the import disagrees. The last-tended cache moves
    /// forward only if the import declares a strictly newer timestamp.
    pub async fn import(
        &self,
        sync_id: &str,
        import: ExternalDocument,
    ) -> Result<ImportSummary, OpError> {
        import.validate()?;

        let summary = ImportSummary {
            tenders: import.caretakers.len(),
            chores: import.chores.len(),
            history_entries: import.tending_log.len(),
        };

        self.with_instance(sync_id, move |doc| {
            let known: HashSet<String> = doc.tenders.iter().map(|t| t.id.clone()).collect();
            doc.tenders
                .extend(import.caretakers.into_iter().filter(|t| !known.contains(&t.id)));

            let known: HashSet<String> = doc.chores.iter().map(|c| c.id.clone()).collect();
            doc.chores
                .extend(import.chores.into_iter().filter(|c| !known.contains(&c.id)));

            let known: HashSet<String> = doc.tending_log.iter().map(|e| e.id.clone()).collect();
            doc.tending_log
                .extend(import.tending_log.into_iter().filter(|e| !known.contains(&e.id)));

            if let Some(imported_at) = import.last_tended_timestamp {
                let newer = match doc.last_tended_at {
                    Some(current) => imported_at > current,
                    None => true,
                };
                if newer {
                    doc.last_tended_at = Some(imported_at);
                    doc.last_tender = import.last_caretaker;
                }
            }

            Ok(summary)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_service;
    use super::*;

    fn sample_import() -> ExternalDocument {
        ExternalDocument {
            caretakers: vec![
                Tender {
                    id: "t-1".into(),
                    name: "Alice".into(),
                },
                Tender {
                    id: "t-2".into(),
                    name: "Bob".into(),
                },
            ],
            chores: vec![Chore {
                id: "c-1".into(),
                name: "Dishes".into(),
                icon: "🍽".into(),
            }],
            tending_log: vec![HistoryEntry {
                id: "h-1".into(),
                timestamp: 1_000,
                person: "Alice".into(),
                chore_id: "c-1".into(),
                notes: None,
            }],
            last_tended_timestamp: Some(1_000),
            last_caretaker: Some("Alice".into()),
        }
    }

    #[tokio::test]
    async fn test_import_merges_new_records() {
        let ctx = setup_service().await;
        let svc = &ctx.service;

        let summary = svc.import("x", sample_import()).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                tenders: 2,
                chores: 1,
                history_entries: 1
            }
        );

        let doc = svc.load("x").await.unwrap();
        assert_eq!(doc.tenders.len(), 2);
        // Seed chore plus the imported one.
        assert_eq!(doc.chores.len(), 2);
        assert_eq!(doc.tending_log.len(), 1);
        assert_eq!(doc.last_tended_at, Some(1_000));
        assert_eq!(doc.last_tender.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let ctx = setup_service().await;
        let svc = &ctx.service;

        svc.import("x", sample_import()).await.unwrap();
        let once = svc.load("x").await.unwrap();

        let summary = svc.import("x", sample_import()).await.unwrap();
        let twice = svc.load("x").await.unwrap();

        assert_eq!(once, twice);
        // The summary still reports what was presented.
        assert_eq!(summary.tenders, 2);
    }

    #[tokio::test]
    async fn test_import_keeps_existing_content_on_id_conflict() {
        let ctx = setup_service().await;
        let svc = &ctx.service;

        svc.import("x", sample_import()).await.unwrap();

        let mut conflicting = sample_import();
        conflicting.caretakers[0].name = "Not Alice".into();
        let summary = svc.import("x", conflicting).await.unwrap();
        assert_eq!(summary.tenders, 2);

        let doc = svc.load("x").await.unwrap();
        assert_eq!(doc.tenders.len(), 2);
        let t1 = doc.tenders.iter().find(|t| t.id == "t-1").unwrap();
        assert_eq!(t1.name, "Alice");
    }

    #[tokio::test]
    async fn test_import_last_tended_newest_wins() {
        let ctx = setup_service().await;
        let svc = &ctx.service;

        svc.import("x", sample_import()).await.unwrap();

        // Older declared timestamp: cache unchanged.
        let mut older = sample_import();
        older.caretakers.clear();
        older.chores.clear();
        older.tending_log.clear();
        older.last_tended_timestamp = Some(500);
        older.last_caretaker = Some("Bob".into());
        svc.import("x", older).await.unwrap();

        let doc = svc.load("x").await.unwrap();
        assert_eq!(doc.last_tended_at, Some(1_000));
        assert_eq!(doc.last_tender.as_deref(), Some("Alice"));

        // Strictly newer: cache moves.
        let mut newer = sample_import();
        newer.caretakers.clear();
        newer.chores.clear();
        newer.tending_log.clear();
        newer.last_tended_timestamp = Some(2_000);
        newer.last_caretaker = Some("Bob".into());
        svc.import("x", newer).await.unwrap();

        let doc = svc.load("x").await.unwrap();
        assert_eq!(doc.last_tended_at, Some(2_000));
        assert_eq!(doc.last_tender.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_import_without_declared_timestamp_leaves_cache() {
        let ctx = setup_service().await;
        let svc = &ctx.service;

        let mut import = sample_import();
        import.last_tended_timestamp = None;
        import.last_caretaker = None;
        svc.import("x", import).await.unwrap();

        let doc = svc.load("x").await.unwrap();
        assert!(doc.last_tended_at.is_none());
        assert!(doc.last_tender.is_none());
    }

    #[tokio::test]
    async fn test_import_validation_rejects_bad_records_without_effect() {
        let ctx = setup_service().await;
        let svc = &ctx.service;

        let mut bad = sample_import();
        bad.chores[0].icon = "  ".into();
        let result = svc.import("x", bad).await;
        assert!(matches!(result, Err(OpError::InvalidArgument(_))));

        // Nothing was merged.
        let doc = svc.load("x").await.unwrap();
        assert!(doc.tenders.is_empty());
        assert_eq!(doc.chores.len(), 1);
        assert!(doc.tending_log.is_empty());

        let mut bad = sample_import();
        bad.tending_log[0].person = "".into();
        assert!(matches!(
            svc.import("x", bad).await,
            Err(OpError::InvalidArgument(_))
        ));

        let mut bad = sample_import();
        bad.caretakers[1].id = "".into();
        assert!(matches!(
            svc.import("x", bad).await,
            Err(OpError::InvalidArgument(_))
        ));
    }
}
