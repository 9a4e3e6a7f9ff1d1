//! In-process store.
//!
//! All tables live behind one async mutex. A transaction holds the lock for its whole
//! lifetime and works on a private copy of the tables; `commit` swaps the copy in, dropping
//! or rolling back throws it away. Transactions are therefore fully serialised, which is
//! stronger than what the services ask for.
//!
//! The backend enforces the same unique, foreign-key and check constraints as the SQL schema
//! and reports them with the same constraint names, so service code cannot tell the two apart.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{constraints, Store, StoreError, StoreResult, StoreTx};
use crate::models::{
    Hall, Movie, NewHall, NewMovie, NewReservation, NewSeat, NewShowtime, NewShowtimeSeat,
    NewUser, Reservation, Seat, SeatMapEntry, SeatStatus, Showtime, ShowtimeSeat, User,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    movies: BTreeMap<i64, Movie>,
    halls: BTreeMap<i64, Hall>,
    seats: BTreeMap<i64, Seat>,
    showtimes: BTreeMap<i64, Showtime>,
    showtime_seats: BTreeMap<i64, ShowtimeSeat>,
    reservations: BTreeMap<i64, Reservation>,
}

impl Tables {
    // One sequence for every table; ids only need to be unique per table.
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_hall(&self, hall: &Hall) -> StoreResult<()> {
        if hall.rows <= 0
            || hall.cols <= 0
            || i64::from(hall.seat_count) != i64::from(hall.rows) * i64::from(hall.cols)
        {
            return Err(StoreError::CheckViolation(constraints::HALL_GEOMETRY.into()));
        }
        if self
            .halls
            .values()
            .any(|h| h.id != hall.id && h.name == hall.name)
        {
            return Err(StoreError::UniqueViolation(constraints::HALL_NAME.into()));
        }
        Ok(())
    }

    fn check_showtime_refs(&self, movie_id: i64, hall_id: i64) -> StoreResult<()> {
        if !self.movies.contains_key(&movie_id) {
            return Err(StoreError::ForeignKeyViolation(constraints::SHOWTIME_MOVIE_FK.into()));
        }
        if !self.halls.contains_key(&hall_id) {
            return Err(StoreError::ForeignKeyViolation(constraints::SHOWTIME_HALL_FK.into()));
        }
        Ok(())
    }

    /// Removes the given seats and the showtime seats built on them.
    /// Reservations pointing at any of them block the whole removal.
    fn remove_seats(&mut self, seat_ids: &[i64]) -> StoreResult<u64> {
        if self
            .reservations
            .values()
            .any(|r| seat_ids.contains(&r.seat_id))
        {
            return Err(StoreError::ForeignKeyViolation(
                constraints::RESERVATION_SEAT_FK.into(),
            ));
        }
        self.showtime_seats
            .retain(|_, ss| !seat_ids.contains(&ss.seat_id));
        let before = self.seats.len();
        self.seats.retain(|id, _| !seat_ids.contains(id));
        Ok((before - self.seats.len()) as u64)
    }

    fn hall_seat_ids(&self, hall_id: i64) -> Vec<i64> {
        self.seats
            .values()
            .filter(|s| s.hall_id == hall_id)
            .map(|s| s.id)
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx { guard, work }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
}

#[async_trait]
impl StoreTx for MemoryTx {
    /* ---------- USERS ---------- */

    async fn insert_user(&mut self, user: &NewUser) -> StoreResult<User> {
        if self.work.users.values().any(|u| u.name == user.name) {
            return Err(StoreError::UniqueViolation(constraints::USER_NAME.into()));
        }
        let row = User {
            id: self.work.next_id(),
            name: user.name.clone(),
            hashed_password: user.hashed_password.clone(),
            role: user.role,
        };
        self.work.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn user_by_name(&mut self, name: &str) -> StoreResult<Option<User>> {
        Ok(self.work.users.values().find(|u| u.name == name).cloned())
    }

    /* ---------- MOVIES ---------- */

    async fn insert_movie(&mut self, movie: &NewMovie) -> StoreResult<Movie> {
        if self.work.movies.values().any(|m| m.title == movie.title) {
            return Err(StoreError::UniqueViolation(constraints::MOVIE_TITLE.into()));
        }
        let row = Movie {
            id: self.work.next_id(),
            title: movie.title.clone(),
            description: movie.description.clone(),
        };
        self.work.movies.insert(row.id, row.clone());
        Ok(row)
    }

    async fn movie_by_id(&mut self, id: i64) -> StoreResult<Option<Movie>> {
        Ok(self.work.movies.get(&id).cloned())
    }

    async fn movie_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Movie>> {
        Ok(self.work.movies.get(&id).cloned())
    }

    async fn list_movies(&mut self) -> StoreResult<Vec<Movie>> {
        Ok(self.work.movies.values().cloned().collect())
    }

    async fn update_movie(&mut self, movie: &Movie) -> StoreResult<()> {
        if self
            .work
            .movies
            .values()
            .any(|m| m.id != movie.id && m.title == movie.title)
        {
            return Err(StoreError::UniqueViolation(constraints::MOVIE_TITLE.into()));
        }
        if let Some(row) = self.work.movies.get_mut(&movie.id) {
            *row = movie.clone();
        }
        Ok(())
    }

    async fn delete_movie(&mut self, id: i64) -> StoreResult<bool> {
        if self.work.showtimes.values().any(|s| s.movie_id == id) {
            return Err(StoreError::ForeignKeyViolation(constraints::SHOWTIME_MOVIE_FK.into()));
        }
        Ok(self.work.movies.remove(&id).is_some())
    }

    /* ---------- HALLS ---------- */

    async fn insert_hall(&mut self, hall: &NewHall) -> StoreResult<Hall> {
        let row = Hall {
            id: 0,
            name: hall.name.clone(),
            seat_count: hall.seat_count,
            rows: hall.rows,
            cols: hall.cols,
        };
        self.work.check_hall(&row)?;
        let row = Hall {
            id: self.work.next_id(),
            ..row
        };
        self.work.halls.insert(row.id, row.clone());
        Ok(row)
    }

    async fn hall_by_id(&mut self, id: i64) -> StoreResult<Option<Hall>> {
        Ok(self.work.halls.get(&id).cloned())
    }

    async fn hall_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Hall>> {
        Ok(self.work.halls.get(&id).cloned())
    }

    async fn list_halls(&mut self) -> StoreResult<Vec<Hall>> {
        Ok(self.work.halls.values().cloned().collect())
    }

    async fn update_hall(&mut self, hall: &Hall) -> StoreResult<()> {
        self.work.check_hall(hall)?;
        if let Some(row) = self.work.halls.get_mut(&hall.id) {
            *row = hall.clone();
        }
        Ok(())
    }

    async fn delete_hall(&mut self, id: i64) -> StoreResult<bool> {
        if self.work.showtimes.values().any(|s| s.hall_id == id) {
            return Err(StoreError::ForeignKeyViolation(constraints::SHOWTIME_HALL_FK.into()));
        }
        if !self.work.halls.contains_key(&id) {
            return Ok(false);
        }
        let seat_ids = self.work.hall_seat_ids(id);
        self.work.remove_seats(&seat_ids)?;
        self.work.halls.remove(&id);
        Ok(true)
    }

    /* ---------- SEATS ---------- */

    async fn insert_seats(&mut self, seats: &[NewSeat]) -> StoreResult<u64> {
        for seat in seats {
            if !self.work.halls.contains_key(&seat.hall_id) {
                return Err(StoreError::ForeignKeyViolation(constraints::SEAT_HALL_FK.into()));
            }
            if seat.row <= 0 || seat.col <= 0 {
                return Err(StoreError::CheckViolation(
                    constraints::SEAT_POSITION_POSITIVE.into(),
                ));
            }
            if self
                .work
                .seats
                .values()
                .any(|s| s.hall_id == seat.hall_id && s.row == seat.row && s.col == seat.col)
            {
                return Err(StoreError::UniqueViolation(constraints::SEAT_POSITION.into()));
            }
            let row = Seat {
                id: self.work.next_id(),
                hall_id: seat.hall_id,
                row: seat.row,
                col: seat.col,
            };
            self.work.seats.insert(row.id, row);
        }
        Ok(seats.len() as u64)
    }

    async fn seats_by_hall(&mut self, hall_id: i64) -> StoreResult<Vec<Seat>> {
        let mut seats: Vec<Seat> = self
            .work
            .seats
            .values()
            .filter(|s| s.hall_id == hall_id)
            .cloned()
            .collect();
        seats.sort_by_key(|s| (s.row, s.col));
        Ok(seats)
    }

    async fn delete_seats_by_hall(&mut self, hall_id: i64) -> StoreResult<u64> {
        let seat_ids = self.work.hall_seat_ids(hall_id);
        self.work.remove_seats(&seat_ids)
    }

    /* ---------- SHOWTIMES ---------- */

    async fn insert_showtime(&mut self, showtime: &NewShowtime) -> StoreResult<Showtime> {
        self.work
            .check_showtime_refs(showtime.movie_id, showtime.hall_id)?;
        let row = Showtime {
            id: self.work.next_id(),
            movie_id: showtime.movie_id,
            hall_id: showtime.hall_id,
            start_at: showtime.start_at,
        };
        self.work.showtimes.insert(row.id, row.clone());
        Ok(row)
    }

    async fn showtime_by_id(&mut self, id: i64) -> StoreResult<Option<Showtime>> {
        Ok(self.work.showtimes.get(&id).cloned())
    }

    async fn showtime_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Showtime>> {
        Ok(self.work.showtimes.get(&id).cloned())
    }

    async fn list_showtimes(&mut self) -> StoreResult<Vec<Showtime>> {
        let mut rows: Vec<Showtime> = self.work.showtimes.values().cloned().collect();
        rows.sort_by_key(|s| (s.start_at, s.id));
        Ok(rows)
    }

    async fn showtimes_by_movie(&mut self, movie_id: i64) -> StoreResult<Vec<Showtime>> {
        let mut rows: Vec<Showtime> = self
            .work
            .showtimes
            .values()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.start_at, s.id));
        Ok(rows)
    }

    async fn showtimes_by_hall(&mut self, hall_id: i64) -> StoreResult<Vec<Showtime>> {
        let mut rows: Vec<Showtime> = self
            .work
            .showtimes
            .values()
            .filter(|s| s.hall_id == hall_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| (s.start_at, s.id));
        Ok(rows)
    }

    async fn update_showtime(&mut self, showtime: &Showtime) -> StoreResult<()> {
        self.work
            .check_showtime_refs(showtime.movie_id, showtime.hall_id)?;
        if let Some(row) = self.work.showtimes.get_mut(&showtime.id) {
            *row = showtime.clone();
        }
        Ok(())
    }

    async fn delete_showtime(&mut self, id: i64) -> StoreResult<bool> {
        if self.work.reservations.values().any(|r| r.showtime_id == id) {
            return Err(StoreError::ForeignKeyViolation(
                constraints::RESERVATION_SHOWTIME_FK.into(),
            ));
        }
        if self.work.showtimes.remove(&id).is_none() {
            return Ok(false);
        }
        self.work.showtime_seats.retain(|_, ss| ss.showtime_id != id);
        Ok(true)
    }

    /* ---------- SHOWTIME SEATS ---------- */

    async fn insert_showtime_seats(&mut self, seats: &[NewShowtimeSeat]) -> StoreResult<u64> {
        for seat in seats {
            if !self.work.showtimes.contains_key(&seat.showtime_id) {
                return Err(StoreError::ForeignKeyViolation(
                    constraints::SHOWTIME_SEAT_SHOWTIME_FK.into(),
                ));
            }
            if !self.work.seats.contains_key(&seat.seat_id) {
                return Err(StoreError::ForeignKeyViolation(
                    constraints::SHOWTIME_SEAT_SEAT_FK.into(),
                ));
            }
            if self
                .work
                .showtime_seats
                .values()
                .any(|ss| ss.showtime_id == seat.showtime_id && ss.seat_id == seat.seat_id)
            {
                return Err(StoreError::UniqueViolation(
                    constraints::SHOWTIME_SEAT_PAIR.into(),
                ));
            }
            let row = ShowtimeSeat {
                id: self.work.next_id(),
                showtime_id: seat.showtime_id,
                seat_id: seat.seat_id,
                status: seat.status,
            };
            self.work.showtime_seats.insert(row.id, row);
        }
        Ok(seats.len() as u64)
    }

    async fn showtime_seat_id(&mut self, showtime_id: i64, seat_id: i64) -> StoreResult<Option<i64>> {
        Ok(self
            .work
            .showtime_seats
            .values()
            .find(|ss| ss.showtime_id == showtime_id && ss.seat_id == seat_id)
            .map(|ss| ss.id))
    }

    async fn showtime_seat_for_update(&mut self, id: i64) -> StoreResult<Option<ShowtimeSeat>> {
        Ok(self.work.showtime_seats.get(&id).cloned())
    }

    async fn count_showtime_seats(&mut self, showtime_id: i64) -> StoreResult<i64> {
        Ok(self
            .work
            .showtime_seats
            .values()
            .filter(|ss| ss.showtime_id == showtime_id)
            .count() as i64)
    }

    async fn seat_map(&mut self, showtime_id: i64) -> StoreResult<Vec<SeatMapEntry>> {
        let mut entries: Vec<SeatMapEntry> = self
            .work
            .showtime_seats
            .values()
            .filter(|ss| ss.showtime_id == showtime_id)
            .filter_map(|ss| {
                self.work.seats.get(&ss.seat_id).map(|seat| SeatMapEntry {
                    showtime_seat_id: ss.id,
                    seat_id: seat.id,
                    row: seat.row,
                    col: seat.col,
                    status: ss.status,
                })
            })
            .collect();
        entries.sort_by_key(|e| (e.row, e.col));
        Ok(entries)
    }

    async fn set_showtime_seat_status(&mut self, id: i64, status: SeatStatus) -> StoreResult<()> {
        if let Some(row) = self.work.showtime_seats.get_mut(&id) {
            row.status = status;
        }
        Ok(())
    }

    /* ---------- RESERVATIONS ---------- */

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> StoreResult<Reservation> {
        if !self.work.showtimes.contains_key(&reservation.showtime_id) {
            return Err(StoreError::ForeignKeyViolation(
                constraints::RESERVATION_SHOWTIME_FK.into(),
            ));
        }
        if !self.work.seats.contains_key(&reservation.seat_id) {
            return Err(StoreError::ForeignKeyViolation(
                constraints::RESERVATION_SEAT_FK.into(),
            ));
        }
        if !self.work.users.contains_key(&reservation.user_id) {
            return Err(StoreError::ForeignKeyViolation(
                constraints::RESERVATION_USER_FK.into(),
            ));
        }
        if self.work.reservations.values().any(|r| {
            r.showtime_id == reservation.showtime_id && r.seat_id == reservation.seat_id
        }) {
            return Err(StoreError::UniqueViolation(
                constraints::RESERVATION_TICKET.into(),
            ));
        }
        let row = Reservation {
            id: self.work.next_id(),
            showtime_id: reservation.showtime_id,
            seat_id: reservation.seat_id,
            user_id: reservation.user_id,
            created_at: Utc::now(),
        };
        self.work.reservations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn reservation_by_id(&mut self, id: i64) -> StoreResult<Option<Reservation>> {
        Ok(self.work.reservations.get(&id).cloned())
    }

    async fn reservations_by_user(&mut self, user_id: i64) -> StoreResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self
            .work
            .reservations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn count_reservations_by_showtime(&mut self, showtime_id: i64) -> StoreResult<i64> {
        Ok(self
            .work
            .reservations
            .values()
            .filter(|r| r.showtime_id == showtime_id)
            .count() as i64)
    }

    async fn delete_reservation(&mut self, id: i64) -> StoreResult<bool> {
        Ok(self.work.reservations.remove(&id).is_some())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
