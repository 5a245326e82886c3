//! # API de Mesas
//!
//! Gestión de mesas del comedor: crear, listar, sentar una reserva en una
//! mesa (`PUT /tables/{id}/seat`) y liberarla (`DELETE /tables/{id}/seat`).
//! Sentar y liberar actualizan mesa y reserva dentro de una única
//! transacción en la capa de persistencia.

use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AppError, AppResult, DataEnvelope};
use crate::db::models::{DiningTable, NewTable, Reservation, ReservationStatus, TableStatus};
use crate::db::SqliteRepo;

/// Cuerpo para crear una mesa
///
/// `capacity` llega como JSON crudo para poder distinguir "ausente" de
/// "no numérico" en los mensajes de validación.
#[derive(Deserialize)]
pub struct TablePayload {
    /// Nombre de la mesa (mínimo 2 caracteres)
    pub table_name: Option<String>,
    /// Aforo de la mesa
    pub capacity: Option<Value>,
    /// Reserva a sentar en la mesa recién creada (opcional)
    pub reservation_id: Option<i64>,
}

/// Cuerpo para sentar una reserva en una mesa existente
#[derive(Deserialize)]
pub struct SeatPayload {
    pub reservation_id: Option<i64>,
}

/// Valida el cuerpo de una mesa y lo convierte en un registro tipado
///
/// # Reglas, en orden
/// - `table_name` presente, no vacío y de al menos 2 caracteres
/// - `capacity` presente, numérica y de al menos 1
pub fn validate_table_payload(payload: &TablePayload) -> AppResult<NewTable> {
    let table_name = match payload.table_name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(AppError::Validation(
                "'table_name' field cannot be empty".to_string(),
            ))
        }
    };

    if table_name.chars().count() < 2 {
        return Err(AppError::Validation(
            "'table_name' field must be at least 2 characters".to_string(),
        ));
    }

    let capacity_raw = match payload.capacity.as_ref() {
        None | Some(Value::Null) => {
            return Err(AppError::Validation(
                "'capacity' field cannot be empty".to_string(),
            ))
        }
        Some(Value::String(text)) if text.is_empty() => {
            return Err(AppError::Validation(
                "'capacity' field cannot be empty".to_string(),
            ))
        }
        Some(value) => value,
    };

    let capacity = capacity_raw
        .as_i64()
        .ok_or_else(|| AppError::Validation("'capacity' must be a number".to_string()))?;

    if capacity < 1 {
        return Err(AppError::Validation(
            "'capacity' field must be at least 1".to_string(),
        ));
    }

    Ok(NewTable {
        table_name: table_name.to_string(),
        capacity: capacity as i32,
        reservation_id: payload.reservation_id,
    })
}

/// Precondiciones para sentar una reserva en una mesa
///
/// # Reglas, en orden
/// - La mesa no puede estar ya ocupada
/// - La reserva no puede estar ya sentada
/// - El aforo de la mesa debe cubrir a los comensales
pub fn validate_seating(table: &DiningTable, reservation: &Reservation) -> AppResult<()> {
    if table.status == TableStatus::Occupied {
        return Err(AppError::Validation(
            "The table selected is currently occupied".to_string(),
        ));
    }

    if reservation.status == ReservationStatus::Seated {
        return Err(AppError::Validation(
            "The reservation selected is already seated".to_string(),
        ));
    }

    if table.capacity < reservation.people {
        return Err(AppError::Validation(format!(
            "The table selected does not have enough space to seat {} people",
            reservation.people
        )));
    }

    Ok(())
}

/// Precondición para liberar: la mesa tiene que estar ocupada
pub fn validate_occupied(table: &DiningTable) -> AppResult<()> {
    if table.status != TableStatus::Occupied {
        return Err(AppError::Validation(
            "This table is not occupied".to_string(),
        ));
    }

    Ok(())
}

/// Busca una mesa por el id de la ruta
async fn lookup_table(repo: &SqliteRepo, raw_id: &str) -> AppResult<DiningTable> {
    let found = match raw_id.parse::<i64>() {
        Ok(id) => repo.read_table(id).await?,
        Err(_) => None,
    };

    found.ok_or_else(|| AppError::NotFound(format!("table_id {} does not exist", raw_id)))
}

/// Busca la reserva referenciada en el cuerpo de la petición
///
/// # Errores
/// - `Validation` si el cuerpo no trae `reservation_id`
/// - `NotFound` si la reserva no existe
async fn lookup_referenced_reservation(
    repo: &SqliteRepo,
    reservation_id: Option<i64>,
) -> AppResult<Reservation> {
    let reservation_id = reservation_id.ok_or_else(|| {
        AppError::Validation("reservation_id field must be included in the body".to_string())
    })?;

    repo.read_reservation(reservation_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("reservation_id {} does not exist", reservation_id))
        })
}

/// Lista todas las mesas, sin filtros
#[get("/tables")]
async fn list_tables(repo: web::Data<SqliteRepo>) -> AppResult<impl Responder> {
    let tables = repo.list_tables().await?;

    Ok(HttpResponse::Ok().json(json!({ "data": tables })))
}

/// Crea una nueva mesa
///
/// Si el cuerpo trae `reservation_id`, la reserva debe existir: la mesa nace
/// ocupada y la reserva pasa a `seated` en la misma transacción. En caso
/// contrario la mesa nace libre.
///
/// # Respuesta
/// `201 Created` con `{ "data": mesa }`
#[post("/tables")]
async fn create_table(
    repo: web::Data<SqliteRepo>,
    body: web::Json<DataEnvelope<TablePayload>>,
) -> AppResult<impl Responder> {
    let payload = body.into_inner().require_data()?;
    let new = validate_table_payload(&payload)?;

    if new.reservation_id.is_some() {
        lookup_referenced_reservation(repo.get_ref(), new.reservation_id).await?;
    }

    let table = repo.create_table(&new).await?;

    Ok(HttpResponse::Created().json(json!({ "data": table })))
}

/// Sienta una reserva en una mesa
///
/// Marca la mesa como ocupada con la reserva enlazada y la reserva como
/// `seated`.
///
/// # Respuesta
/// `200 OK` con `{ "data": { "status": "seated" } }`
#[put("/tables/{id}/seat")]
async fn seat_table(
    repo: web::Data<SqliteRepo>,
    path: web::Path<String>,
    body: web::Json<DataEnvelope<SeatPayload>>,
) -> AppResult<impl Responder> {
    let payload = body.into_inner().require_data()?;
    let table = lookup_table(repo.get_ref(), &path).await?;
    let reservation = lookup_referenced_reservation(repo.get_ref(), payload.reservation_id).await?;
    validate_seating(&table, &reservation)?;

    repo.occupy_table(table.table_id, reservation.reservation_id)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": { "status": "seated" } })))
}

/// Libera una mesa ocupada
///
/// La reserva enlazada pasa a `finished` (estado terminal) y la mesa queda
/// libre y sin enlace.
///
/// # Respuesta
/// `200 OK` con `{ "data": { "status": "finished" } }`
#[delete("/tables/{id}/seat")]
async fn unseat_table(
    repo: web::Data<SqliteRepo>,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let table = lookup_table(repo.get_ref(), &path).await?;
    validate_occupied(&table)?;

    let reservation_id = table.reservation_id.ok_or_else(|| {
        AppError::internal_trace(
            &format!("Mesa {} ocupada sin reserva enlazada", table.table_id),
            None,
        )
    })?;

    repo.free_table(table.table_id, reservation_id).await?;

    Ok(HttpResponse::Ok().json(json!({ "data": { "status": "finished" } })))
}

/// Configura las rutas relacionadas con mesas
///
/// # Rutas disponibles
/// - `GET /tables` - Listar mesas
/// - `POST /tables` - Crear mesa
/// - `PUT /tables/{id}/seat` - Sentar una reserva
/// - `DELETE /tables/{id}/seat` - Liberar la mesa
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_tables);
    cfg.service(create_table);
    cfg.service(seat_table);
    cfg.service(unseat_table);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(status: TableStatus, capacity: i32, reservation_id: Option<i64>) -> DiningTable {
        DiningTable {
            table_id: 1,
            table_name: "A1".to_string(),
            capacity,
            status,
            reservation_id,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn reservation(status: ReservationStatus, people: i32) -> Reservation {
        Reservation {
            reservation_id: 7,
            first_name: "Al".to_string(),
            last_name: "B".to_string(),
            mobile_number: "555-1234".to_string(),
            reservation_date: "2030-01-07".to_string(),
            reservation_time: "18:00".to_string(),
            people,
            status,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn validation_message(result: AppResult<NewTable>) -> String {
        match result {
            Err(AppError::Validation(message)) => message,
            _ => panic!("se esperaba error de validación"),
        }
    }

    #[test]
    fn accepts_a_complete_payload() {
        let payload = TablePayload {
            table_name: Some("A1".to_string()),
            capacity: Some(json!(2)),
            reservation_id: None,
        };
        let new = validate_table_payload(&payload).unwrap();
        assert_eq!(new.table_name, "A1");
        assert_eq!(new.capacity, 2);
    }

    #[test]
    fn table_name_rules() {
        let payload = TablePayload {
            table_name: None,
            capacity: Some(json!(2)),
            reservation_id: None,
        };
        assert_eq!(
            validation_message(validate_table_payload(&payload)),
            "'table_name' field cannot be empty"
        );

        let payload = TablePayload {
            table_name: Some("A".to_string()),
            capacity: Some(json!(2)),
            reservation_id: None,
        };
        assert_eq!(
            validation_message(validate_table_payload(&payload)),
            "'table_name' field must be at least 2 characters"
        );
    }

    #[test]
    fn capacity_rules() {
        let payload = TablePayload {
            table_name: Some("A1".to_string()),
            capacity: None,
            reservation_id: None,
        };
        assert_eq!(
            validation_message(validate_table_payload(&payload)),
            "'capacity' field cannot be empty"
        );

        let payload = TablePayload {
            table_name: Some("A1".to_string()),
            capacity: Some(json!("dos")),
            reservation_id: None,
        };
        assert_eq!(
            validation_message(validate_table_payload(&payload)),
            "'capacity' must be a number"
        );

        let payload = TablePayload {
            table_name: Some("A1".to_string()),
            capacity: Some(json!(0)),
            reservation_id: None,
        };
        assert_eq!(
            validation_message(validate_table_payload(&payload)),
            "'capacity' field must be at least 1"
        );
    }

    #[test]
    fn seating_rejects_an_occupied_table() {
        let result = validate_seating(
            &table(TableStatus::Occupied, 4, Some(2)),
            &reservation(ReservationStatus::Booked, 2),
        );
        assert!(matches!(
            result,
            Err(AppError::Validation(message))
                if message == "The table selected is currently occupied"
        ));
    }

    #[test]
    fn seating_rejects_an_already_seated_reservation() {
        let result = validate_seating(
            &table(TableStatus::Free, 4, None),
            &reservation(ReservationStatus::Seated, 2),
        );
        assert!(matches!(
            result,
            Err(AppError::Validation(message))
                if message == "The reservation selected is already seated"
        ));
    }

    #[test]
    fn seating_rejects_an_undersized_table() {
        let result = validate_seating(
            &table(TableStatus::Free, 2, None),
            &reservation(ReservationStatus::Booked, 4),
        );
        assert!(matches!(
            result,
            Err(AppError::Validation(message))
                if message == "The table selected does not have enough space to seat 4 people"
        ));
    }

    #[test]
    fn seating_accepts_a_fitting_party() {
        let result = validate_seating(
            &table(TableStatus::Free, 4, None),
            &reservation(ReservationStatus::Booked, 4),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn unseating_requires_an_occupied_table() {
        let result = validate_occupied(&table(TableStatus::Free, 4, None));
        assert!(matches!(
            result,
            Err(AppError::Validation(message)) if message == "This table is not occupied"
        ));

        assert!(validate_occupied(&table(TableStatus::Occupied, 4, Some(7))).is_ok());
    }
}
