use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Showtime {
    pub id: i64,
    pub movie_id: i64,
    pub hall_id: i64,
    pub start_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShowtime {
    pub movie_id: i64,
    pub hall_id: i64,
    pub start_at: DateTime<Utc>,
}

/// Fields an admin may change on an existing showtime. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ShowtimeChanges {
    pub start_at: Option<DateTime<Utc>>,
    pub hall_id: Option<i64>,
}

impl ShowtimeChanges {
    pub fn is_empty(&self) -> bool {
        self.start_at.is_none() && self.hall_id.is_none()
    }
}
