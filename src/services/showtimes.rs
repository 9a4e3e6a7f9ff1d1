use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{NewShowtime, Showtime, ShowtimeChanges};
use crate::store::{constraints, Store, StoreError, StoreTx};

use super::{finish, guard, showtime_seats};

fn missing_reference(err: StoreError) -> ServiceError {
    match err {
        StoreError::ForeignKeyViolation(c) if c == constraints::SHOWTIME_MOVIE_FK => {
            ServiceError::NotFound("movie")
        }
        StoreError::ForeignKeyViolation(_) => ServiceError::NotFound("hall"),
        other => ServiceError::Store(other),
    }
}

/// Schedules a showtime and materializes one available seat per hall seat.
pub async fn create_showtime(store: &dyn Store, showtime: NewShowtime) -> ServiceResult<Showtime> {
    let mut tx = store.begin().await?;
    let result = create_in(tx.as_mut(), &showtime).await;
    let created = finish(tx, result).await?;
    info!(
        "showtime {} created: movie={} hall={} start_at={}",
        created.id, created.movie_id, created.hall_id, created.start_at
    );
    Ok(created)
}

async fn create_in(tx: &mut dyn StoreTx, showtime: &NewShowtime) -> ServiceResult<Showtime> {
    if tx.movie_by_id(showtime.movie_id).await?.is_none() {
        return Err(ServiceError::NotFound("movie"));
    }
    if tx.hall_by_id(showtime.hall_id).await?.is_none() {
        return Err(ServiceError::NotFound("hall"));
    }
    let created = tx.insert_showtime(showtime).await.map_err(missing_reference)?;
    showtime_seats::init_for_showtime(tx, &created).await?;
    Ok(created)
}

pub async fn get_showtime(store: &dyn Store, id: i64) -> ServiceResult<Showtime> {
    let mut tx = store.begin().await?;
    let result = match tx.showtime_by_id(id).await {
        Ok(Some(showtime)) => Ok(showtime),
        Ok(None) => Err(ServiceError::NotFound("showtime")),
        Err(e) => Err(e.into()),
    };
    finish(tx, result).await
}

pub async fn list_showtimes(store: &dyn Store) -> ServiceResult<Vec<Showtime>> {
    let mut tx = store.begin().await?;
    let result = tx.list_showtimes().await.map_err(ServiceError::from);
    finish(tx, result).await
}

/// Changes start time and/or hall of a showtime that has no seat map yet.
///
/// The row keeps its id; seats are materialized for the resulting hall afterwards.
pub async fn update_showtime(
    store: &dyn Store,
    id: i64,
    changes: ShowtimeChanges,
) -> ServiceResult<Showtime> {
    if changes.is_empty() {
        return Err(ServiceError::InvalidInput("nothing to update".into()));
    }
    let mut tx = store.begin().await?;
    let result = update_in(tx.as_mut(), id, &changes).await;
    let updated = finish(tx, result).await?;
    info!("showtime {} updated", id);
    Ok(updated)
}

async fn update_in(
    tx: &mut dyn StoreTx,
    id: i64,
    changes: &ShowtimeChanges,
) -> ServiceResult<Showtime> {
    let mut showtime = tx
        .showtime_by_id_for_update(id)
        .await?
        .ok_or(ServiceError::NotFound("showtime"))?;
    guard::ensure_showtime_unreferenced(tx, id).await?;

    if let Some(hall_id) = changes.hall_id {
        if tx.hall_by_id(hall_id).await?.is_none() {
            return Err(ServiceError::NotFound("hall"));
        }
        showtime.hall_id = hall_id;
    }
    if let Some(start_at) = changes.start_at {
        showtime.start_at = start_at;
    }

    tx.update_showtime(&showtime).await.map_err(missing_reference)?;
    showtime_seats::init_for_showtime(tx, &showtime).await?;
    Ok(showtime)
}

pub async fn delete_showtime(store: &dyn Store, id: i64) -> ServiceResult<()> {
    let mut tx = store.begin().await?;
    let result = delete_in(tx.as_mut(), id).await;
    finish(tx, result).await?;
    info!("showtime {} deleted", id);
    Ok(())
}

async fn delete_in(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<()> {
    if tx.showtime_by_id_for_update(id).await?.is_none() {
        return Err(ServiceError::NotFound("showtime"));
    }
    guard::ensure_showtime_unreferenced(tx, id).await?;
    if !tx
        .delete_showtime(id)
        .await
        .map_err(|e| guard::restricted(e, "showtime"))?
    {
        return Err(ServiceError::NotFound("showtime"));
    }
    Ok(())
}
