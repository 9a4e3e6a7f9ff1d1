use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Hall, NewHall, Seat};
use crate::store::{constraints, Store, StoreError, StoreTx};

use super::{finish, guard, seat_map};

fn validate_geometry(name: &str, seat_count: i32, rows: i32, cols: i32) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("hall name must not be empty".into()));
    }
    if rows <= 0 || cols <= 0 {
        return Err(ServiceError::InvalidInput("rows and cols must be positive".into()));
    }
    if i64::from(seat_count) != i64::from(rows) * i64::from(cols) {
        return Err(ServiceError::InvalidInput(format!(
            "seat_count {} does not match {} rows x {} cols",
            seat_count, rows, cols
        )));
    }
    Ok(())
}

fn hall_write_error(err: StoreError) -> ServiceError {
    match err {
        e if e.is_unique_violation(constraints::HALL_NAME) => ServiceError::AlreadyExists("hall"),
        StoreError::CheckViolation(c) => {
            ServiceError::InvalidInput(format!("hall violates {}", c))
        }
        other => ServiceError::Store(other),
    }
}

/// Creates the hall and its seat grid in one transaction.
pub async fn create_hall(store: &dyn Store, hall: NewHall) -> ServiceResult<Hall> {
    validate_geometry(&hall.name, hall.seat_count, hall.rows, hall.cols)?;

    let mut tx = store.begin().await?;
    let result = create_in(tx.as_mut(), &hall).await;
    let created = finish(tx, result).await?;
    info!("hall {} created with {} seats", created.id, created.seat_count);
    Ok(created)
}

async fn create_in(tx: &mut dyn StoreTx, hall: &NewHall) -> ServiceResult<Hall> {
    let created = tx.insert_hall(hall).await.map_err(hall_write_error)?;
    seat_map::init_seats_for_hall(tx, &created).await?;
    Ok(created)
}

pub async fn get_hall(store: &dyn Store, id: i64) -> ServiceResult<Hall> {
    let mut tx = store.begin().await?;
    let result = match tx.hall_by_id(id).await {
        Ok(Some(hall)) => Ok(hall),
        Ok(None) => Err(ServiceError::NotFound("hall")),
        Err(e) => Err(e.into()),
    };
    finish(tx, result).await
}

pub async fn list_halls(store: &dyn Store) -> ServiceResult<Vec<Hall>> {
    let mut tx = store.begin().await?;
    let result = tx.list_halls().await.map_err(ServiceError::from);
    finish(tx, result).await
}

pub async fn hall_seats(store: &dyn Store, hall_id: i64) -> ServiceResult<Vec<Seat>> {
    let mut tx = store.begin().await?;
    let result = seats_in(tx.as_mut(), hall_id).await;
    finish(tx, result).await
}

async fn seats_in(tx: &mut dyn StoreTx, hall_id: i64) -> ServiceResult<Vec<Seat>> {
    if tx.hall_by_id(hall_id).await?.is_none() {
        return Err(ServiceError::NotFound("hall"));
    }
    Ok(tx.seats_by_hall(hall_id).await?)
}

/// Replaces name and geometry of an unreferenced hall. A new geometry rebuilds the seat grid.
pub async fn update_hall(store: &dyn Store, hall: Hall) -> ServiceResult<()> {
    validate_geometry(&hall.name, hall.seat_count, hall.rows, hall.cols)?;

    let mut tx = store.begin().await?;
    let result = update_in(tx.as_mut(), &hall).await;
    finish(tx, result).await?;
    info!("hall {} updated", hall.id);
    Ok(())
}

async fn update_in(tx: &mut dyn StoreTx, hall: &Hall) -> ServiceResult<()> {
    let current = tx
        .hall_by_id_for_update(hall.id)
        .await?
        .ok_or(ServiceError::NotFound("hall"))?;
    guard::ensure_hall_unreferenced(tx, hall.id).await?;

    tx.update_hall(hall).await.map_err(hall_write_error)?;

    if !current.same_geometry(hall) {
        tx.delete_seats_by_hall(hall.id).await?;
        seat_map::init_seats_for_hall(tx, hall).await?;
    }
    Ok(())
}

pub async fn delete_hall(store: &dyn Store, id: i64) -> ServiceResult<()> {
    let mut tx = store.begin().await?;
    let result = delete_in(tx.as_mut(), id).await;
    finish(tx, result).await?;
    info!("hall {} deleted", id);
    Ok(())
}

async fn delete_in(tx: &mut dyn StoreTx, id: i64) -> ServiceResult<()> {
    if tx.hall_by_id_for_update(id).await?.is_none() {
        return Err(ServiceError::NotFound("hall"));
    }
    guard::ensure_hall_unreferenced(tx, id).await?;

    if !tx
        .delete_hall(id)
        .await
        .map_err(|e| guard::restricted(e, "hall"))?
    {
        return Err(ServiceError::NotFound("hall"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_must_match_seat_count() {
        assert!(validate_geometry("A", 6, 2, 3).is_ok());
        assert!(matches!(
            validate_geometry("A", 5, 2, 3),
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(validate_geometry("A", 0, 0, 3).is_err());
        assert!(validate_geometry("  ", 1, 1, 1).is_err());
    }
}
