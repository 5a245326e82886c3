// src/db/mod.rs
pub mod models;
pub mod sqlite;

pub use models::{
    DiningTable, NewReservation, NewTable, Reservation, ReservationStatus, TableStatus,
};
pub use sqlite::SqliteRepo;
