use crate::error::{ServiceError, ServiceResult};
use crate::models::Showtime;
use crate::store::{Store, StoreTx};

use super::finish;

/// Hall capacity minus reservations already held for the showtime.
///
/// Fails closed: a showtime with nothing left reports `NoTicketsAvailable` instead of `0`.
pub async fn remaining_tickets(tx: &mut dyn StoreTx, showtime: &Showtime) -> ServiceResult<i64> {
    let hall = tx
        .hall_by_id(showtime.hall_id)
        .await?
        .ok_or(ServiceError::NotFound("hall"))?;
    let reserved = tx.count_reservations_by_showtime(showtime.id).await?;

    let remaining = i64::from(hall.seat_count) - reserved;
    if remaining <= 0 {
        return Err(ServiceError::NoTicketsAvailable);
    }
    Ok(remaining)
}

pub async fn get_remaining_tickets(store: &dyn Store, showtime_id: i64) -> ServiceResult<i64> {
    let mut tx = store.begin().await?;
    let result = remaining_for_id(tx.as_mut(), showtime_id).await;
    finish(tx, result).await
}

async fn remaining_for_id(tx: &mut dyn StoreTx, showtime_id: i64) -> ServiceResult<i64> {
    let showtime = tx
        .showtime_by_id(showtime_id)
        .await?
        .ok_or(ServiceError::NotFound("showtime"))?;
    remaining_tickets(tx, &showtime).await
}
