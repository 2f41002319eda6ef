use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aircraft family (e.g. "Boeing 737"), a plain lookup entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirplaneType {
    pub id: Uuid,
    pub name: String,
}

/// A physical airplane with a fixed seating grid.
///
/// The grid dimensions define the valid ticket coordinates for every flight
/// operated by this airplane; see `seating::validate_seat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airplane {
    pub id: Uuid,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
    pub airplane_type_id: Uuid,
}

impl Airplane {
    /// Total sellable seats: rows x seats-in-row.
    pub fn capacity(&self) -> i32 {
        self.rows * self.seats_in_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_rows_times_seats() {
        let plane = Airplane {
            id: Uuid::new_v4(),
            name: "narrowbody".to_string(),
            rows: 60,
            seats_in_row: 8,
            airplane_type_id: Uuid::new_v4(),
        };

        assert_eq!(plane.capacity(), 480);
    }
}
