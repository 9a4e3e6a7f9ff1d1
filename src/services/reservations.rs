//! Reservation state machine.
//!
//! A reservation and the status of its showtime seat always change together, in one
//! transaction: reserving moves the seat `available -> locked`, cancelling moves it back.
//! The unique `(showtime_id, seat_id)` constraint on reservations decides which of two
//! concurrent reservers gets the seat; the loser sees [`ServiceError::SeatTaken`].

use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{NewReservation, Reservation, SeatMapEntry, SeatStatus};
use crate::store::{constraints, Store, StoreError, StoreTx};

use super::{capacity, finish, showtime_seats};

pub async fn reserve(
    store: &dyn Store,
    user_id: i64,
    showtime_id: i64,
    seat_id: i64,
) -> ServiceResult<Reservation> {
    let mut tx = store.begin().await?;
    let result = reserve_in(tx.as_mut(), user_id, showtime_id, seat_id).await;
    let reservation = finish(tx, result).await?;
    info!(
        "reservation {} created: user={} showtime={} seat={}",
        reservation.id, user_id, showtime_id, seat_id
    );
    Ok(reservation)
}

async fn reserve_in(
    tx: &mut dyn StoreTx,
    user_id: i64,
    showtime_id: i64,
    seat_id: i64,
) -> ServiceResult<Reservation> {
    let showtime = tx
        .showtime_by_id(showtime_id)
        .await?
        .ok_or(ServiceError::ShowtimeNotExist)?;

    capacity::remaining_tickets(tx, &showtime).await?;

    let held = tx.reservations_by_user(user_id).await?;
    if held.iter().any(|r| r.showtime_id == showtime_id) {
        return Err(ServiceError::AlreadyReserved);
    }

    let reservation = tx
        .insert_reservation(&NewReservation {
            showtime_id,
            seat_id,
            user_id,
        })
        .await
        .map_err(|e| match e {
            e if e.is_unique_violation(constraints::RESERVATION_TICKET) => {
                warn!("seat {} of showtime {} already taken", seat_id, showtime_id);
                ServiceError::SeatTaken
            }
            StoreError::ForeignKeyViolation(c) if c == constraints::RESERVATION_USER_FK => {
                ServiceError::NotFound("user")
            }
            StoreError::ForeignKeyViolation(_) => ServiceError::NotFound("seat"),
            other => ServiceError::Store(other),
        })?;

    showtime_seats::transition(tx, showtime_id, seat_id, SeatStatus::Locked).await?;

    Ok(reservation)
}

pub async fn cancel_reservation(store: &dyn Store, reservation_id: i64) -> ServiceResult<()> {
    let mut tx = store.begin().await?;
    let result = cancel_in(tx.as_mut(), reservation_id).await;
    finish(tx, result).await?;
    info!("reservation {} cancelled", reservation_id);
    Ok(())
}

async fn cancel_in(tx: &mut dyn StoreTx, reservation_id: i64) -> ServiceResult<()> {
    let reservation = tx
        .reservation_by_id(reservation_id)
        .await?
        .ok_or(ServiceError::NotFound("reservation"))?;

    tx.delete_reservation(reservation.id).await?;
    showtime_seats::transition(
        tx,
        reservation.showtime_id,
        reservation.seat_id,
        SeatStatus::Available,
    )
    .await?;
    Ok(())
}

pub async fn reservation_by_id(store: &dyn Store, id: i64) -> ServiceResult<Reservation> {
    let mut tx = store.begin().await?;
    let result = match tx.reservation_by_id(id).await {
        Ok(Some(r)) => Ok(r),
        Ok(None) => Err(ServiceError::NotFound("reservation")),
        Err(e) => Err(e.into()),
    };
    finish(tx, result).await
}

pub async fn reservations_for_user(store: &dyn Store, user_id: i64) -> ServiceResult<Vec<Reservation>> {
    let mut tx = store.begin().await?;
    let result = tx.reservations_by_user(user_id).await.map_err(ServiceError::from);
    finish(tx, result).await
}

/// Every seat of the showtime with its position and current status.
pub async fn showtime_seat_map(store: &dyn Store, showtime_id: i64) -> ServiceResult<Vec<SeatMapEntry>> {
    let mut tx = store.begin().await?;
    let result = seat_map_in(tx.as_mut(), showtime_id).await;
    finish(tx, result).await
}

async fn seat_map_in(tx: &mut dyn StoreTx, showtime_id: i64) -> ServiceResult<Vec<SeatMapEntry>> {
    if tx.showtime_by_id(showtime_id).await?.is_none() {
        return Err(ServiceError::NotFound("showtime"));
    }
    Ok(tx.seat_map(showtime_id).await?)
}
