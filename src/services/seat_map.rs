use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Hall, NewSeat};
use crate::store::StoreTx;

/// Every position of the hall grid, row-major, rows and columns counted from 1.
pub fn build_seat_map(hall: &Hall) -> Vec<NewSeat> {
    let rows = hall.rows.max(0);
    let cols = hall.cols.max(0);
    let mut seats = Vec::with_capacity((rows as usize) * (cols as usize));
    for row in 1..=rows {
        for col in 1..=cols {
            seats.push(NewSeat {
                hall_id: hall.id,
                row,
                col,
            });
        }
    }
    seats
}

/// Persists the seat grid of a freshly created (or reshaped) hall inside `tx`.
pub async fn init_seats_for_hall(tx: &mut dyn StoreTx, hall: &Hall) -> ServiceResult<u64> {
    if hall.rows <= 0 || hall.cols <= 0 {
        return Err(ServiceError::InvalidInput(
            "hall rows and cols must be positive".into(),
        ));
    }
    let seats = build_seat_map(hall);
    let inserted = tx.insert_seats(&seats).await?;
    debug!("hall {} seat map: {} seats", hall.id, inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hall(rows: i32, cols: i32) -> Hall {
        Hall {
            id: 7,
            name: "Main".into(),
            seat_count: rows * cols,
            rows,
            cols,
        }
    }

    #[test]
    fn two_by_three_grid() {
        let seats = build_seat_map(&hall(2, 3));
        let positions: Vec<(i32, i32)> = seats.iter().map(|s| (s.row, s.col)).collect();
        assert_eq!(
            positions,
            vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]
        );
        assert!(seats.iter().all(|s| s.hall_id == 7));
    }

    proptest! {
        #[test]
        fn grid_covers_every_position_once(rows in 1i32..40, cols in 1i32..40) {
            let seats = build_seat_map(&hall(rows, cols));
            prop_assert_eq!(seats.len() as i32, rows * cols);

            let mut unique: Vec<(i32, i32)> = seats.iter().map(|s| (s.row, s.col)).collect();
            unique.sort_unstable();
            unique.dedup();
            prop_assert_eq!(unique.len(), seats.len());
            prop_assert!(seats.iter().all(|s| s.row >= 1 && s.row <= rows && s.col >= 1 && s.col <= cols));
        }
    }
}
