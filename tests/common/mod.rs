//! Utilidades compartidas por las suites de integración.
//!
//! Cada test monta el servicio completo de Actix sobre un pool SQLite en
//! memoria de una única conexión, con el esquema recién creado.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use mesas_reservation::db::SqliteRepo;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;

pub async fn test_repo() -> SqliteRepo {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("pool SQLite en memoria");

    let repo = SqliteRepo { pool };
    repo.create_schema().await.expect("esquema SQLite");
    repo
}

/// Primer día de la semana pedida al menos una semana en el futuro, para que
/// cualquier hora del día pase la regla de "fecha futura".
pub fn next_weekday(target: Weekday) -> NaiveDate {
    let mut date = Local::now().date_naive() + Duration::days(7);
    while date.weekday() != target {
        date += Duration::days(1);
    }
    date
}

/// Cuerpo válido de reserva para un lunes futuro a las 18:00
pub fn reservation_data(people: i64) -> Value {
    json!({
        "first_name": "Al",
        "last_name": "B",
        "mobile_number": "555-1234",
        "reservation_date": next_weekday(Weekday::Mon).to_string(),
        "reservation_time": "18:00",
        "people": people,
    })
}
