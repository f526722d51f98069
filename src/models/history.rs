use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tending event in the log.
///
/// `person` is a name snapshot taken when the event was recorded, not a
/// reference into the tenders list: renaming or deleting a tender never
/// rewrites history. `chore_id` is a soft reference and may dangle if the
/// chore was deleted without cascading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub person: String,
    pub chore_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HistoryEntry {
    pub fn new(
        person: impl Into<String>,
        chore_id: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            person: person.into(),
            chore_id: chore_id.into(),
            notes,
        }
    }
}
