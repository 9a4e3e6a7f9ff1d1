use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{NewShowtimeSeat, SeatStatus, Showtime, ShowtimeSeat};
use crate::store::StoreTx;

/// Creates one `available` showtime seat per seat of the showtime's hall.
pub async fn init_for_showtime(tx: &mut dyn StoreTx, showtime: &Showtime) -> ServiceResult<u64> {
    let seats = tx.seats_by_hall(showtime.hall_id).await?;
    let rows: Vec<NewShowtimeSeat> = seats
        .iter()
        .map(|seat| NewShowtimeSeat {
            showtime_id: showtime.id,
            seat_id: seat.id,
            status: SeatStatus::Available,
        })
        .collect();
    let inserted = tx.insert_showtime_seats(&rows).await?;
    debug!("showtime {} materialized {} seats", showtime.id, inserted);
    Ok(inserted)
}

/// Locks showtime seat `id` and moves it to `target`. A no-op transition is an error.
pub async fn update_status(
    tx: &mut dyn StoreTx,
    id: i64,
    target: SeatStatus,
) -> ServiceResult<ShowtimeSeat> {
    let mut seat = tx
        .showtime_seat_for_update(id)
        .await?
        .ok_or(ServiceError::ShowtimeSeatNotExist)?;
    if seat.status == target {
        return Err(ServiceError::ShowtimeSeatStatusNotChange);
    }
    tx.set_showtime_seat_status(seat.id, target).await?;
    seat.status = target;
    Ok(seat)
}

/// Moves the showtime seat for `(showtime_id, seat_id)` to `target`.
pub async fn transition(
    tx: &mut dyn StoreTx,
    showtime_id: i64,
    seat_id: i64,
    target: SeatStatus,
) -> ServiceResult<ShowtimeSeat> {
    let id = tx
        .showtime_seat_id(showtime_id, seat_id)
        .await?
        .ok_or(ServiceError::ShowtimeSeatNotExist)?;
    update_status(tx, id, target).await
}
