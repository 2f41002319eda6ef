use serde::{Deserialize, Serialize};

use crate::fleet::Airplane;

/// One (row, seat) cell of a flight's seat map, with no purchaser identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRef {
    pub row: i32,
    pub seat: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    #[error("row {row} must be in range [1, {rows}]")]
    RowOutOfRange { row: i32, rows: i32 },

    #[error("seat {seat} must be in range [1, {seats_in_row}]")]
    SeatOutOfRange { seat: i32, seats_in_row: i32 },
}

/// Check a (row, seat) pair against an airplane's capacity grid.
///
/// Pure function; the row bound is checked before the seat bound.
pub fn validate_seat(row: i32, seat: i32, airplane: &Airplane) -> Result<(), SeatError> {
    if row < 1 || row > airplane.rows {
        return Err(SeatError::RowOutOfRange {
            row,
            rows: airplane.rows,
        });
    }

    if seat < 1 || seat > airplane.seats_in_row {
        return Err(SeatError::SeatOutOfRange {
            seat,
            seats_in_row: airplane.seats_in_row,
        });
    }

    Ok(())
}
