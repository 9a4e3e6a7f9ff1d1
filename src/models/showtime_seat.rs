use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Availability of one seat for one showtime.
///
/// `Sold` is part of the stored vocabulary but no operation moves a seat there yet;
/// it is reserved for a future confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Locked,
    Sold,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Locked => "locked",
            SeatStatus::Sold => "sold",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SeatStatus::Available)
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown seat status: {0}")]
pub struct UnknownSeatStatus(pub String);

impl FromStr for SeatStatus {
    type Err = UnknownSeatStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SeatStatus::Available),
            "locked" => Ok(SeatStatus::Locked),
            "sold" => Ok(SeatStatus::Sold),
            other => Err(UnknownSeatStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for SeatStatus {
    type Error = UnknownSeatStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShowtimeSeat {
    pub id: i64,
    pub showtime_id: i64,
    pub seat_id: i64,
    #[sqlx(try_from = "String")]
    pub status: SeatStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct NewShowtimeSeat {
    pub showtime_id: i64,
    pub seat_id: i64,
    pub status: SeatStatus,
}

/// A showtime seat joined with its physical position, as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SeatMapEntry {
    pub showtime_seat_id: i64,
    pub seat_id: i64,
    pub row: i32,
    pub col: i32,
    #[sqlx(try_from = "String")]
    pub status: SeatStatus,
}
