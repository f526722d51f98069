use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person who tends chores.
///
/// Names are not unique: two tenders may share a name by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tender {
    pub id: String,
    pub name: String,
}

impl Tender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}
