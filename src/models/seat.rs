use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One physical position inside a hall. Rows and columns start at 1.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub hall_id: i64,
    pub row: i32,
    pub col: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSeat {
    pub hall_id: i64,
    pub row: i32,
    pub col: i32,
}
