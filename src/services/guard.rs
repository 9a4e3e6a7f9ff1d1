use tracing::warn;

use crate::error::{ServiceError, ServiceResult};
use crate::store::{StoreError, StoreTx};

pub async fn ensure_hall_unreferenced(tx: &mut dyn StoreTx, hall_id: i64) -> ServiceResult<()> {
    if !tx.showtimes_by_hall(hall_id).await?.is_empty() {
        warn!("hall {} is referenced by showtimes", hall_id);
        return Err(ServiceError::RelatedResourceExists("hall"));
    }
    Ok(())
}

pub async fn ensure_movie_unreferenced(tx: &mut dyn StoreTx, movie_id: i64) -> ServiceResult<()> {
    if !tx.showtimes_by_movie(movie_id).await?.is_empty() {
        warn!("movie {} is referenced by showtimes", movie_id);
        return Err(ServiceError::RelatedResourceExists("movie"));
    }
    Ok(())
}

pub async fn ensure_showtime_unreferenced(
    tx: &mut dyn StoreTx,
    showtime_id: i64,
) -> ServiceResult<()> {
    if tx.count_showtime_seats(showtime_id).await? > 0 {
        warn!("showtime {} already has a seat map", showtime_id);
        return Err(ServiceError::RelatedResourceExists("showtime"));
    }
    Ok(())
}

/// Restricting foreign keys on delete mean something still points at the row.
pub(crate) fn restricted(err: StoreError, resource: &'static str) -> ServiceError {
    if err.is_foreign_key_violation() {
        ServiceError::RelatedResourceExists(resource)
    } else {
        ServiceError::Store(err)
    }
}
