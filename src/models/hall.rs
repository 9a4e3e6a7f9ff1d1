use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Hall {
    pub id: i64,
    pub name: String,
    pub seat_count: i32,
    pub rows: i32,
    pub cols: i32,
}

impl Hall {
    pub fn same_geometry(&self, other: &Hall) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }
}

#[derive(Debug, Clone)]
pub struct NewHall {
    pub name: String,
    pub seat_count: i32,
    pub rows: i32,
    pub cols: i32,
}
