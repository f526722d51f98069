use serde::{Deserialize, Serialize};

use super::{Chore, HistoryEntry, Tender};

/// The complete state for one sync identifier.
///
/// Owns its collections exclusively: nothing is shared across sync ids.
/// The two `last_*` fields are caches derived from `tending_log` and must
/// stay consistent with it: both absent iff the log is empty, otherwise
/// taken from the entry with the maximum timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDocument {
    pub sync_id: String,
    pub tenders: Vec<Tender>,
    pub chores: Vec<Chore>,
    pub tending_log: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tended_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tender: Option<String>,
}

impl InstanceDocument {
    /// A fresh document as seeded on first access: one default chore,
    /// nothing else.
    pub fn seeded(sync_id: impl Into<String>) -> Self {
        Self {
            sync_id: sync_id.into(),
            tenders: Vec::new(),
            chores: vec![Chore::default_seed()],
            tending_log: Vec::new(),
            last_tended_at: None,
            last_tender: None,
        }
    }

    /// Rebuilds `last_tended_at` / `last_tender` from the log.
    ///
    /// Must run after any deletion that could have removed the newest entry.
    /// Ties on the maximum timestamp resolve to the first entry in stored
    /// order.
    pub fn recompute_last_tended(&mut self) {
        let newest = self
            .tending_log
            .iter()
            .reduce(|best, e| if e.timestamp > best.timestamp { e } else { best });
        match newest {
            Some(entry) => {
                self.last_tended_at = Some(entry.timestamp);
                self.last_tender = Some(entry.person.clone());
            }
            None => {
                self.last_tended_at = None;
                self.last_tender = None;
            }
        }
    }

    /// The log ordered newest first. Entries with equal timestamps keep
    /// their relative insertion order.
    pub fn history_newest_first(&self) -> Vec<HistoryEntry> {
        let mut entries = self.tending_log.clone();
        entries.sort_by_key(|e| std::cmp::Reverse(e.timestamp));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: i64, person: &str) -> HistoryEntry {
        let mut e = HistoryEntry::new(person, "chore-1", None);
        e.timestamp = ts;
        e
    }

    #[test]
    fn test_seeded_document() {
        let doc = InstanceDocument::seeded("x");
        assert_eq!(doc.sync_id, "x");
        assert!(doc.tenders.is_empty());
        assert_eq!(doc.chores.len(), 1);
        assert_eq!(doc.chores[0].name, "Water the plants");
        assert!(doc.tending_log.is_empty());
        assert!(doc.last_tended_at.is_none());
        assert!(doc.last_tender.is_none());
    }

    #[test]
    fn test_recompute_empty_log_clears_cache() {
        let mut doc = InstanceDocument::seeded("x");
        doc.last_tended_at = Some(42);
        doc.last_tender = Some("Alice".into());

        doc.recompute_last_tended();

        assert!(doc.last_tended_at.is_none());
        assert!(doc.last_tender.is_none());
    }

    #[test]
    fn test_recompute_picks_maximum_timestamp() {
        let mut doc = InstanceDocument::seeded("x");
        doc.tending_log = vec![entry(10, "Alice"), entry(30, "Bob"), entry(20, "Carol")];

        doc.recompute_last_tended();

        assert_eq!(doc.last_tended_at, Some(30));
        assert_eq!(doc.last_tender.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_recompute_tie_takes_first_in_stored_order() {
        let mut doc = InstanceDocument::seeded("x");
        doc.tending_log = vec![entry(10, "Alice"), entry(30, "Bob"), entry(30, "Carol")];

        doc.recompute_last_tended();

        assert_eq!(doc.last_tended_at, Some(30));
        assert_eq!(doc.last_tender.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_history_newest_first_is_stable() {
        let mut doc = InstanceDocument::seeded("x");
        doc.tending_log = vec![
            entry(10, "Alice"),
            entry(30, "Bob"),
            entry(30, "Carol"),
            entry(20, "Dan"),
        ];

        let ordered = doc.history_newest_first();
        let people: Vec<&str> = ordered.iter().map(|e| e.person.as_str()).collect();
        assert_eq!(people, vec!["Bob", "Carol", "Dan", "Alice"]);
    }
}
