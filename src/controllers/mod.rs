pub mod captcha;
pub mod halls;
pub mod movies;
pub mod reservations;
pub mod response;
pub mod showtimes;
pub mod users;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(captcha::routes())
        .merge(users::routes())
        .merge(movies::routes())
        .merge(halls::routes())
        .merge(showtimes::routes())
        .merge(reservations::routes())
}
