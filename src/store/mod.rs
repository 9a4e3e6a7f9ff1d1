//! Store port.
//!
//! Everything the services persist goes through [`Store`] and the transaction handle it
//! hands out, [`StoreTx`]. A handle is passed explicitly down the call chain so that nested
//! steps (seat map, capacity check, status transition) always run inside the caller's
//! transaction. Dropping a handle without calling `commit` discards its writes.
//!
//! Backends:
//! - [`postgres::PgStore`]: sqlx over PostgreSQL, constraints enforced by the schema.
//! - [`memory::MemoryStore`]: in-process tables with the same constraints, transactions
//!   fully serialised. Used by tests and for running without a database.

use async_trait::async_trait;

use crate::models::{
    Hall, Movie, NewHall, NewMovie, NewReservation, NewSeat, NewShowtime, NewShowtimeSeat,
    NewUser, Reservation, Seat, SeatMapEntry, SeatStatus, Showtime, ShowtimeSeat, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Constraint names shared by the schema and the in-memory backend.
pub mod constraints {
    pub const USER_NAME: &str = "uq_users_name";
    pub const MOVIE_TITLE: &str = "uq_movies_title";
    pub const HALL_NAME: &str = "uq_halls_name";
    pub const SEAT_POSITION: &str = "uq_seats_position";
    pub const SHOWTIME_SEAT_PAIR: &str = "uq_showtime_seats_pair";
    pub const RESERVATION_TICKET: &str = "uq_reservations_ticket";

    pub const SEAT_HALL_FK: &str = "fk_seats_hall";
    pub const SHOWTIME_MOVIE_FK: &str = "fk_showtimes_movie";
    pub const SHOWTIME_HALL_FK: &str = "fk_showtimes_hall";
    pub const RESERVATION_SHOWTIME_FK: &str = "fk_reservations_showtime";
    pub const RESERVATION_SEAT_FK: &str = "fk_reservations_seat";
    pub const RESERVATION_USER_FK: &str = "fk_reservations_user";
    pub const SHOWTIME_SEAT_SHOWTIME_FK: &str = "fk_showtime_seats_showtime";
    pub const SHOWTIME_SEAT_SEAT_FK: &str = "fk_showtime_seats_seat";

    pub const HALL_GEOMETRY: &str = "ck_halls_geometry";
    pub const SEAT_POSITION_POSITIVE: &str = "ck_seats_position";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint {0} violated")]
    UniqueViolation(String),

    #[error("foreign key constraint {0} violated")]
    ForeignKeyViolation(String),

    #[error("check constraint {0} violated")]
    CheckViolation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(c) if c == constraint)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, StoreError::ForeignKeyViolation(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// Operations available inside one transaction.
///
/// `*_for_update` lookups take a row lock on backends that have one; the in-memory backend
/// already serialises whole transactions.
#[async_trait]
pub trait StoreTx: Send {
    // users
    async fn insert_user(&mut self, user: &NewUser) -> StoreResult<User>;
    async fn user_by_name(&mut self, name: &str) -> StoreResult<Option<User>>;

    // movies
    async fn insert_movie(&mut self, movie: &NewMovie) -> StoreResult<Movie>;
    async fn movie_by_id(&mut self, id: i64) -> StoreResult<Option<Movie>>;
    async fn movie_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Movie>>;
    async fn list_movies(&mut self) -> StoreResult<Vec<Movie>>;
    async fn update_movie(&mut self, movie: &Movie) -> StoreResult<()>;
    async fn delete_movie(&mut self, id: i64) -> StoreResult<bool>;

    // halls
    async fn insert_hall(&mut self, hall: &NewHall) -> StoreResult<Hall>;
    async fn hall_by_id(&mut self, id: i64) -> StoreResult<Option<Hall>>;
    async fn hall_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Hall>>;
    async fn list_halls(&mut self) -> StoreResult<Vec<Hall>>;
    async fn update_hall(&mut self, hall: &Hall) -> StoreResult<()>;
    async fn delete_hall(&mut self, id: i64) -> StoreResult<bool>;

    // seats
    async fn insert_seats(&mut self, seats: &[NewSeat]) -> StoreResult<u64>;
    async fn seats_by_hall(&mut self, hall_id: i64) -> StoreResult<Vec<Seat>>;
    async fn delete_seats_by_hall(&mut self, hall_id: i64) -> StoreResult<u64>;

    // showtimes
    async fn insert_showtime(&mut self, showtime: &NewShowtime) -> StoreResult<Showtime>;
    async fn showtime_by_id(&mut self, id: i64) -> StoreResult<Option<Showtime>>;
    async fn showtime_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Showtime>>;
    async fn list_showtimes(&mut self) -> StoreResult<Vec<Showtime>>;
    async fn showtimes_by_movie(&mut self, movie_id: i64) -> StoreResult<Vec<Showtime>>;
    async fn showtimes_by_hall(&mut self, hall_id: i64) -> StoreResult<Vec<Showtime>>;
    async fn update_showtime(&mut self, showtime: &Showtime) -> StoreResult<()>;
    async fn delete_showtime(&mut self, id: i64) -> StoreResult<bool>;

    // showtime seats
    async fn insert_showtime_seats(&mut self, seats: &[NewShowtimeSeat]) -> StoreResult<u64>;
    async fn showtime_seat_id(&mut self, showtime_id: i64, seat_id: i64) -> StoreResult<Option<i64>>;
    async fn showtime_seat_for_update(&mut self, id: i64) -> StoreResult<Option<ShowtimeSeat>>;
    async fn count_showtime_seats(&mut self, showtime_id: i64) -> StoreResult<i64>;
    async fn seat_map(&mut self, showtime_id: i64) -> StoreResult<Vec<SeatMapEntry>>;
    async fn set_showtime_seat_status(&mut self, id: i64, status: SeatStatus) -> StoreResult<()>;

    // reservations
    async fn insert_reservation(&mut self, reservation: &NewReservation) -> StoreResult<Reservation>;
    async fn reservation_by_id(&mut self, id: i64) -> StoreResult<Option<Reservation>>;
    async fn reservations_by_user(&mut self, user_id: i64) -> StoreResult<Vec<Reservation>>;
    async fn count_reservations_by_showtime(&mut self, showtime_id: i64) -> StoreResult<i64>;
    async fn delete_reservation(&mut self, id: i64) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
