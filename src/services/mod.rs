//! Service layer.
//!
//! Every public operation opens one store transaction, runs its steps against the
//! transaction handle and closes it through [`finish`]. Helpers that take
//! `&mut dyn StoreTx` never commit on their own; they always join the caller's transaction.
//!
//! Components:
//! 1.  **seat_map**: builds the fixed seat grid of a hall.
//! 2.  **showtime_seats**: materializes per-showtime availability and moves seats between states.
//! 3.  **capacity**: remaining tickets for a showtime.
//! 4.  **reservations**: reserve and cancel, the only writers of seat status.
//! 5.  **guard**: refuses structural changes that would orphan dependent rows.
//! 6.  **halls / movies / showtimes / users / captcha**: the catalog, accounts and the
//!     challenge gate in front of register and login.

use tracing::warn;

use crate::error::ServiceResult;
use crate::store::StoreTx;

pub mod capacity;
pub mod captcha;
pub mod guard;
pub mod halls;
pub mod movies;
pub mod reservations;
pub mod seat_map;
pub mod showtime_seats;
pub mod showtimes;
pub mod users;

/// Commits on success, rolls back on failure and hands the original result back.
pub(crate) async fn finish<T>(tx: Box<dyn StoreTx>, result: ServiceResult<T>) -> ServiceResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("rollback failed after {}: {:?}", err, rollback_err);
            }
            Err(err)
        }
    }
}
