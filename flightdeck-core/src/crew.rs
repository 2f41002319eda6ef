use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crew member assignable to flights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crew {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl Crew {
    /// Display name used in flight summaries.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
