pub mod hall;
pub mod movie;
pub mod reservation;
pub mod seat;
pub mod showtime;
pub mod showtime_seat;
pub mod user;

pub use hall::{Hall, NewHall};
pub use movie::{Movie, NewMovie};
pub use reservation::{NewReservation, Reservation};
pub use seat::{NewSeat, Seat};
pub use showtime::{NewShowtime, Showtime, ShowtimeChanges};
pub use showtime_seat::{NewShowtimeSeat, SeatMapEntry, SeatStatus, ShowtimeSeat};
pub use user::{NewUser, User, UserRole};
