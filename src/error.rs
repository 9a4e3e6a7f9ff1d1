use crate::cache::CacheError;
use crate::store::StoreError;

/// Failures reported by the reservation and catalog services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("{0} is still referenced by other records")]
    RelatedResourceExists(&'static str),

    #[error("showtime does not exist")]
    ShowtimeNotExist,

    #[error("no tickets available for this showtime")]
    NoTicketsAvailable,

    #[error("user already holds a reservation for this showtime")]
    AlreadyReserved,

    #[error("seat is already taken for this showtime")]
    SeatTaken,

    #[error("showtime seat already has the requested status")]
    ShowtimeSeatStatusNotChange,

    #[error("seat is not part of this showtime")]
    ShowtimeSeatNotExist,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
