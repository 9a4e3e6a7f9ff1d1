use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::{PgPool, Postgres, Transaction};

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::database::Database;
use crate::models::{
    Hall, Movie, NewHall, NewMovie, NewReservation, NewSeat, NewShowtime, NewShowtimeSeat,
    NewUser, Reservation, Seat, SeatMapEntry, SeatStatus, Showtime, ShowtimeSeat, User,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool.clone() }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(classify)?;
        Ok(Box::new(PgTx { tx }))
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Sorts constraint failures out of the generic sqlx error so callers can react to them.
fn classify(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        match db_err.kind() {
            ErrorKind::UniqueViolation => return StoreError::UniqueViolation(constraint),
            ErrorKind::ForeignKeyViolation => return StoreError::ForeignKeyViolation(constraint),
            ErrorKind::CheckViolation => return StoreError::CheckViolation(constraint),
            _ => {}
        }
    }
    StoreError::Database(err)
}

/* ---------- column lists ---------- */

const HALL_COLUMNS: &str = r#"id, name, seat_count, "rows", "cols""#;
const SHOWTIME_COLUMNS: &str = "id, movie_id, hall_id, start_at";
const SHOWTIME_SEAT_COLUMNS: &str = "id, showtime_id, seat_id, status";
const RESERVATION_COLUMNS: &str = "id, showtime_id, seat_id, user_id, created_at";

#[async_trait]
impl StoreTx for PgTx {
    /* ---------- USERS ---------- */

    async fn insert_user(&mut self, user: &NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, hashed_password, role)
             VALUES ($1, $2, $3)
             RETURNING id, name, hashed_password, role",
        )
        .bind(&user.name)
        .bind(&user.hashed_password)
        .bind(user.role.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn user_by_name(&mut self, name: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, hashed_password, role FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)
    }

    /* ---------- MOVIES ---------- */

    async fn insert_movie(&mut self, movie: &NewMovie) -> StoreResult<Movie> {
        sqlx::query_as::<_, Movie>(
            "INSERT INTO movies (title, description) VALUES ($1, $2)
             RETURNING id, title, description",
        )
        .bind(&movie.title)
        .bind(&movie.description)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn movie_by_id(&mut self, id: i64) -> StoreResult<Option<Movie>> {
        sqlx::query_as::<_, Movie>("SELECT id, title, description FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn movie_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Movie>> {
        sqlx::query_as::<_, Movie>(
            "SELECT id, title, description FROM movies WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn list_movies(&mut self) -> StoreResult<Vec<Movie>> {
        sqlx::query_as::<_, Movie>("SELECT id, title, description FROM movies ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn update_movie(&mut self, movie: &Movie) -> StoreResult<()> {
        sqlx::query("UPDATE movies SET title = $2, description = $3 WHERE id = $1")
            .bind(movie.id)
            .bind(&movie.title)
            .bind(&movie.description)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_movie(&mut self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(res.rows_affected() > 0)
    }

    /* ---------- HALLS ---------- */

    async fn insert_hall(&mut self, hall: &NewHall) -> StoreResult<Hall> {
        sqlx::query_as::<_, Hall>(&format!(
            r#"INSERT INTO halls (name, seat_count, "rows", "cols") VALUES ($1, $2, $3, $4)
             RETURNING {HALL_COLUMNS}"#
        ))
        .bind(&hall.name)
        .bind(hall.seat_count)
        .bind(hall.rows)
        .bind(hall.cols)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn hall_by_id(&mut self, id: i64) -> StoreResult<Option<Hall>> {
        sqlx::query_as::<_, Hall>(&format!("SELECT {HALL_COLUMNS} FROM halls WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn hall_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Hall>> {
        sqlx::query_as::<_, Hall>(&format!(
            "SELECT {HALL_COLUMNS} FROM halls WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn list_halls(&mut self) -> StoreResult<Vec<Hall>> {
        sqlx::query_as::<_, Hall>(&format!("SELECT {HALL_COLUMNS} FROM halls ORDER BY id"))
            .fetch_all(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn update_hall(&mut self, hall: &Hall) -> StoreResult<()> {
        sqlx::query(r#"UPDATE halls SET name = $2, seat_count = $3, "rows" = $4, "cols" = $5 WHERE id = $1"#)
            .bind(hall.id)
            .bind(&hall.name)
            .bind(hall.seat_count)
            .bind(hall.rows)
            .bind(hall.cols)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_hall(&mut self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM halls WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(res.rows_affected() > 0)
    }

    /* ---------- SEATS ---------- */

    async fn insert_seats(&mut self, seats: &[NewSeat]) -> StoreResult<u64> {
        if seats.is_empty() {
            return Ok(0);
        }
        let hall_ids: Vec<i64> = seats.iter().map(|s| s.hall_id).collect();
        let rows: Vec<i32> = seats.iter().map(|s| s.row).collect();
        let cols: Vec<i32> = seats.iter().map(|s| s.col).collect();

        let res = sqlx::query(
            r#"INSERT INTO seats (hall_id, "row", "col")
             SELECT * FROM UNNEST($1::int8[], $2::int4[], $3::int4[])"#,
        )
        .bind(hall_ids)
        .bind(rows)
        .bind(cols)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(res.rows_affected())
    }

    async fn seats_by_hall(&mut self, hall_id: i64) -> StoreResult<Vec<Seat>> {
        sqlx::query_as::<_, Seat>(
            r#"SELECT id, hall_id, "row", "col" FROM seats WHERE hall_id = $1 ORDER BY "row", "col""#,
        )
        .bind(hall_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn delete_seats_by_hall(&mut self, hall_id: i64) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM seats WHERE hall_id = $1")
            .bind(hall_id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(res.rows_affected())
    }

    /* ---------- SHOWTIMES ---------- */

    async fn insert_showtime(&mut self, showtime: &NewShowtime) -> StoreResult<Showtime> {
        sqlx::query_as::<_, Showtime>(&format!(
            "INSERT INTO showtimes (movie_id, hall_id, start_at) VALUES ($1, $2, $3)
             RETURNING {SHOWTIME_COLUMNS}"
        ))
        .bind(showtime.movie_id)
        .bind(showtime.hall_id)
        .bind(showtime.start_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn showtime_by_id(&mut self, id: i64) -> StoreResult<Option<Showtime>> {
        sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn showtime_by_id_for_update(&mut self, id: i64) -> StoreResult<Option<Showtime>> {
        sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn list_showtimes(&mut self) -> StoreResult<Vec<Showtime>> {
        sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes ORDER BY start_at, id"
        ))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn showtimes_by_movie(&mut self, movie_id: i64) -> StoreResult<Vec<Showtime>> {
        sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE movie_id = $1 ORDER BY start_at, id"
        ))
        .bind(movie_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn showtimes_by_hall(&mut self, hall_id: i64) -> StoreResult<Vec<Showtime>> {
        sqlx::query_as::<_, Showtime>(&format!(
            "SELECT {SHOWTIME_COLUMNS} FROM showtimes WHERE hall_id = $1 ORDER BY start_at, id"
        ))
        .bind(hall_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn update_showtime(&mut self, showtime: &Showtime) -> StoreResult<()> {
        sqlx::query("UPDATE showtimes SET movie_id = $2, hall_id = $3, start_at = $4 WHERE id = $1")
            .bind(showtime.id)
            .bind(showtime.movie_id)
            .bind(showtime.hall_id)
            .bind(showtime.start_at)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_showtime(&mut self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM showtimes WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(res.rows_affected() > 0)
    }

    /* ---------- SHOWTIME SEATS ---------- */

    async fn insert_showtime_seats(&mut self, seats: &[NewShowtimeSeat]) -> StoreResult<u64> {
        if seats.is_empty() {
            return Ok(0);
        }
        let showtime_ids: Vec<i64> = seats.iter().map(|s| s.showtime_id).collect();
        let seat_ids: Vec<i64> = seats.iter().map(|s| s.seat_id).collect();
        let statuses: Vec<String> = seats.iter().map(|s| s.status.as_str().to_string()).collect();

        let res = sqlx::query(
            "INSERT INTO showtime_seats (showtime_id, seat_id, status)
             SELECT * FROM UNNEST($1::int8[], $2::int8[], $3::varchar[])",
        )
        .bind(showtime_ids)
        .bind(seat_ids)
        .bind(statuses)
        .execute(&mut *self.tx)
        .await
        .map_err(classify)?;
        Ok(res.rows_affected())
    }

    async fn showtime_seat_id(&mut self, showtime_id: i64, seat_id: i64) -> StoreResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM showtime_seats WHERE showtime_id = $1 AND seat_id = $2",
        )
        .bind(showtime_id)
        .bind(seat_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn showtime_seat_for_update(&mut self, id: i64) -> StoreResult<Option<ShowtimeSeat>> {
        sqlx::query_as::<_, ShowtimeSeat>(&format!(
            "SELECT {SHOWTIME_SEAT_COLUMNS} FROM showtime_seats WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn count_showtime_seats(&mut self, showtime_id: i64) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM showtime_seats WHERE showtime_id = $1")
            .bind(showtime_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn seat_map(&mut self, showtime_id: i64) -> StoreResult<Vec<SeatMapEntry>> {
        sqlx::query_as::<_, SeatMapEntry>(
            r#"
            SELECT ss.id AS showtime_seat_id, s.id AS seat_id, s."row", s."col", ss.status
            FROM showtime_seats ss
            JOIN seats s ON s.id = ss.seat_id
            WHERE ss.showtime_id = $1
            ORDER BY s."row", s."col"
            "#,
        )
        .bind(showtime_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn set_showtime_seat_status(&mut self, id: i64, status: SeatStatus) -> StoreResult<()> {
        sqlx::query("UPDATE showtime_seats SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(())
    }

    /* ---------- RESERVATIONS ---------- */

    async fn insert_reservation(&mut self, reservation: &NewReservation) -> StoreResult<Reservation> {
        sqlx::query_as::<_, Reservation>(&format!(
            "INSERT INTO reservations (showtime_id, seat_id, user_id) VALUES ($1, $2, $3)
             RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(reservation.showtime_id)
        .bind(reservation.seat_id)
        .bind(reservation.user_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn reservation_by_id(&mut self, id: i64) -> StoreResult<Option<Reservation>> {
        sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn reservations_by_user(&mut self, user_id: i64) -> StoreResult<Vec<Reservation>> {
        sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(classify)
    }

    async fn count_reservations_by_showtime(&mut self, showtime_id: i64) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations WHERE showtime_id = $1")
            .bind(showtime_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(classify)
    }

    async fn delete_reservation(&mut self, id: i64) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(classify)?;
        Ok(res.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await.map_err(classify)
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await.map_err(classify)
    }
}
