use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ReservationStatus {
    Booked,
    Seated,
    Finished,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Booked => "booked",
            ReservationStatus::Seated => "seated",
            ReservationStatus::Finished => "finished",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(ReservationStatus::Booked),
            "seated" => Ok(ReservationStatus::Seated),
            "finished" => Ok(ReservationStatus::Finished),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TableStatus {
    Free,
    Occupied,
}

impl fmt::Display for TableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableStatus::Free => f.write_str("free"),
            TableStatus::Occupied => f.write_str("occupied"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reservation {
    pub reservation_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub reservation_date: String,
    pub reservation_time: String,
    pub people: i32,
    pub status: ReservationStatus,
    pub created_at: i64, // timestamp unix
    pub updated_at: i64, // timestamp unix
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiningTable {
    pub table_id: i64,
    pub table_name: String,
    pub capacity: i32,
    pub status: TableStatus,
    pub reservation_id: Option<i64>,
    pub created_at: i64, // timestamp unix
    pub updated_at: i64, // timestamp unix
}

/// Reserva ya validada en la frontera de la API, lista para persistir.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub reservation_date: String,
    pub reservation_time: String,
    pub people: i32,
    pub status: ReservationStatus,
}

/// Mesa ya validada en la frontera de la API.
#[derive(Debug, Clone)]
pub struct NewTable {
    pub table_name: String,
    pub capacity: i32,
    pub reservation_id: Option<i64>,
}
