use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub id: Uuid,
    pub name: String,
    pub closest_big_city: String,
}

/// A directed leg between two airports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub source_id: Uuid,
    pub destination_id: Uuid,
    /// Great-circle distance in kilometres.
    pub distance: i32,
}
