use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recurring household chore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chore {
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl Chore {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            icon: icon.into(),
        }
    }

    /// The chore every fresh instance is seeded with.
    pub fn default_seed() -> Self {
        Self::new("Water the plants", "🪴")
    }
}
