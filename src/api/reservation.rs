//! # API de Reservas
//!
//! Este módulo maneja todas las operaciones relacionadas con reservas:
//! - Crear nuevas reservas
//! - Listar reservas con filtros opcionales (fecha, móvil)
//! - Leer una reserva por id
//! - Cambiar el estado de una reserva (`booked` → `seated` → `finished`, o `cancelled`)
//! - Editar los campos de una reserva existente
//!
//! La validación es una cadena ordenada de funciones puras: cada paso
//! devuelve `AppResult` y el handler corta con `?` en el primer fallo, sin
//! efectos parciales sobre la base de datos.

use actix_web::{get, post, put, web, HttpResponse, Responder};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AppError, AppResult, DataEnvelope};
use crate::db::models::{NewReservation, Reservation, ReservationStatus};
use crate::db::SqliteRepo;

/// Cuerpo para crear o editar una reserva
///
/// Los campos llegan "sueltos" (opcionales, `people` como JSON crudo) para
/// que la validación pueda señalar exactamente el campo ausente o mal
/// tipado, en lugar de un error genérico de deserialización.
#[derive(Deserialize)]
pub struct ReservationPayload {
    /// Nombre del cliente
    pub first_name: Option<String>,
    /// Apellido del cliente
    pub last_name: Option<String>,
    /// Teléfono de contacto (dígitos y guiones)
    pub mobile_number: Option<String>,
    /// Fecha de la reserva (formato YYYY-MM-DD)
    pub reservation_date: Option<String>,
    /// Hora de la reserva (formato HH:MM)
    pub reservation_time: Option<String>,
    /// Número de comensales
    pub people: Option<Value>,
    /// Estado inicial; si viene, sólo se admite "booked"
    pub status: Option<String>,
}

/// Cuerpo para cambiar el estado de una reserva
#[derive(Deserialize)]
pub struct StatusPayload {
    pub status: Option<String>,
}

/// Parámetros de consulta para listar reservas
#[derive(Deserialize)]
struct ReservationQuery {
    /// Filtrar por fecha específica (formato YYYY-MM-DD)
    date: Option<String>,
    /// Filtrar por número de móvil (coincidencia parcial)
    mobile_number: Option<String>,
}

fn require_field(value: Option<&String>, field: &str) -> AppResult<String> {
    match value {
        Some(text) if !text.is_empty() => Ok(text.clone()),
        _ => Err(AppError::Validation(format!("Field required: '{}'", field))),
    }
}

/// Valida el cuerpo completo de una reserva y lo convierte en un registro tipado
///
/// # Reglas, en orden
/// - Todos los campos obligatorios presentes y no vacíos
/// - `reservation_date` + `reservation_time` parsean juntos como fecha-hora
/// - `people` es un entero JSON y vale al menos 1
/// - `status`, si viene, sólo puede ser "booked"
/// - `mobile_number` contiene únicamente dígitos y guiones
///
/// # Errores
/// `Validation` (400) con un mensaje que identifica el campo y la regla
pub fn validate_reservation_payload(payload: &ReservationPayload) -> AppResult<NewReservation> {
    let first_name = require_field(payload.first_name.as_ref(), "first_name")?;
    let last_name = require_field(payload.last_name.as_ref(), "last_name")?;
    let mobile_number = require_field(payload.mobile_number.as_ref(), "mobile_number")?;
    let reservation_date = require_field(payload.reservation_date.as_ref(), "reservation_date")?;
    let reservation_time = require_field(payload.reservation_time.as_ref(), "reservation_time")?;

    let people_raw = match payload.people.as_ref() {
        None | Some(Value::Null) => {
            return Err(AppError::Validation("Field required: 'people'".to_string()))
        }
        Some(Value::String(text)) if text.is_empty() => {
            return Err(AppError::Validation("Field required: 'people'".to_string()))
        }
        Some(value) => value,
    };

    parse_reservation_datetime(&reservation_date, &reservation_time)?;

    let people = people_raw.as_i64().ok_or_else(|| {
        AppError::Validation("Number required in 'people' field".to_string())
    })?;

    if people < 1 {
        return Err(AppError::Validation(
            "Must be at least 1 person in 'people' field".to_string(),
        ));
    }

    if let Some(status) = payload.status.as_deref() {
        if status != "booked" {
            return Err(AppError::Validation(format!("'status' cannot be {}", status)));
        }
    }

    if !mobile_number.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(AppError::Validation(
            "'mobile_number' field must be a number".to_string(),
        ));
    }

    Ok(NewReservation {
        first_name,
        last_name,
        mobile_number,
        reservation_date,
        reservation_time,
        people: people as i32,
        status: ReservationStatus::Booked,
    })
}

/// Combina fecha y hora en un `NaiveDateTime`; acepta HH:MM y HH:MM:SS
fn parse_reservation_datetime(date: &str, time: &str) -> AppResult<NaiveDateTime> {
    let parsed_date = NaiveDate::parse_from_str(date, "%Y-%m-%d");
    let parsed_time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"));

    match (parsed_date, parsed_time) {
        (Ok(date), Ok(time)) => Ok(date.and_time(time)),
        _ => Err(AppError::Validation(
            "'reservation_date' or 'reservation_time' field is not in the correct format"
                .to_string(),
        )),
    }
}

/// Valida las reglas de horario del restaurante
///
/// # Reglas, en orden
/// - Cerrado los martes
/// - La fecha-hora debe ser estrictamente futura
/// - No se abre hasta las 10:30
/// - Última reserva admitida a las 21:30 (corte único de cierre)
pub fn validate_business_hours(new: &NewReservation) -> AppResult<()> {
    let when = parse_reservation_datetime(&new.reservation_date, &new.reservation_time)?;

    if when.weekday() == Weekday::Tue {
        return Err(AppError::Validation(
            "Restaurant is closed on Tuesday".to_string(),
        ));
    }

    if when <= Local::now().naive_local() {
        return Err(AppError::Validation(
            "Reservation must be made for a future date and time".to_string(),
        ));
    }

    let (hour, minute) = (when.hour(), when.minute());

    if hour < 10 || (hour == 10 && minute < 30) {
        return Err(AppError::Validation(
            "Restaurant is not open until 10:30AM".to_string(),
        ));
    }

    if hour > 21 || (hour == 21 && minute > 30) {
        return Err(AppError::Validation(
            "Reservation must be made at or before 9:30PM".to_string(),
        ));
    }

    Ok(())
}

/// Valida el cuerpo de un cambio de estado contra la reserva existente
///
/// # Errores
/// - `Validation` si falta `status`, no es uno de los cuatro estados, o la
///   reserva ya está `finished` (estado terminal)
pub fn validate_status_update(
    payload: &StatusPayload,
    existing: &Reservation,
) -> AppResult<ReservationStatus> {
    let status = match payload.status.as_deref() {
        Some(status) if !status.is_empty() => status,
        _ => return Err(AppError::Validation("Body must include a status".to_string())),
    };

    let status = status.parse::<ReservationStatus>().map_err(|_| {
        AppError::Validation(format!("Status field cannot be {}", status))
    })?;

    if existing.status == ReservationStatus::Finished {
        return Err(AppError::Validation(
            "Unable to update a finished reservation".to_string(),
        ));
    }

    Ok(status)
}

/// Busca una reserva por el id de la ruta
///
/// # Errores
/// `NotFound` (404) si el id no existe; un id no numérico se trata igual que
/// un id ausente
async fn lookup_reservation(repo: &SqliteRepo, raw_id: &str) -> AppResult<Reservation> {
    let found = match raw_id.parse::<i64>() {
        Ok(id) => repo.read_reservation(id).await?,
        Err(_) => None,
    };

    found.ok_or_else(|| AppError::NotFound(format!("{} does not exist", raw_id)))
}

/// Lista reservas, con filtros opcionales por fecha o móvil
///
/// Las reservas en estado `finished` nunca aparecen en el listado.
#[get("/reservations")]
async fn list_reservations(
    repo: web::Data<SqliteRepo>,
    query: web::Query<ReservationQuery>,
) -> AppResult<impl Responder> {
    let reservations = repo
        .list_reservations(query.date.as_deref(), query.mobile_number.as_deref())
        .await?;

    let reservations: Vec<Reservation> = reservations
        .into_iter()
        .filter(|reservation| reservation.status != ReservationStatus::Finished)
        .collect();

    Ok(HttpResponse::Ok().json(json!({ "data": reservations })))
}

/// Crea una nueva reserva
///
/// # Validaciones
/// Cuerpo completo ([`validate_reservation_payload`]) y reglas de horario
/// ([`validate_business_hours`]). El estado inicial siempre se fuerza a
/// `booked`.
///
/// # Respuesta
/// `201 Created` con `{ "data": reserva }`
#[post("/reservations")]
async fn create_reservation(
    repo: web::Data<SqliteRepo>,
    body: web::Json<DataEnvelope<ReservationPayload>>,
) -> AppResult<impl Responder> {
    let payload = body.into_inner().require_data()?;
    let new = validate_reservation_payload(&payload)?;
    validate_business_hours(&new)?;

    let reservation = repo.create_reservation(&new).await?;

    Ok(HttpResponse::Created().json(json!({ "data": reservation })))
}

/// Lee una reserva por id
#[get("/reservations/{id}")]
async fn read_reservation(
    repo: web::Data<SqliteRepo>,
    path: web::Path<String>,
) -> AppResult<impl Responder> {
    let reservation = lookup_reservation(repo.get_ref(), &path).await?;

    Ok(HttpResponse::Ok().json(json!({ "data": reservation })))
}

/// Cambia el estado de una reserva existente
///
/// # Respuesta
/// `200 OK` con `{ "data": { "status": nuevo_estado } }`
#[put("/reservations/{id}/status")]
async fn update_reservation_status(
    repo: web::Data<SqliteRepo>,
    path: web::Path<String>,
    body: web::Json<DataEnvelope<StatusPayload>>,
) -> AppResult<impl Responder> {
    let payload = body.into_inner().require_data()?;
    let reservation = lookup_reservation(repo.get_ref(), &path).await?;
    let status = validate_status_update(&payload, &reservation)?;

    repo.update_reservation_status(reservation.reservation_id, status)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": { "status": status } })))
}

/// Edita los campos de una reserva existente
///
/// Revalida el cuerpo completo y las reglas de horario igual que en la
/// creación; el estado no se toca por esta vía.
#[put("/reservations/{id}")]
async fn edit_reservation(
    repo: web::Data<SqliteRepo>,
    path: web::Path<String>,
    body: web::Json<DataEnvelope<ReservationPayload>>,
) -> AppResult<impl Responder> {
    let payload = body.into_inner().require_data()?;
    let reservation = lookup_reservation(repo.get_ref(), &path).await?;
    let fields = validate_reservation_payload(&payload)?;
    validate_business_hours(&fields)?;

    let updated = repo
        .edit_reservation(reservation.reservation_id, &fields)
        .await?;

    Ok(HttpResponse::Ok().json(json!({ "data": updated })))
}

/// Configura las rutas relacionadas con reservas
///
/// # Rutas disponibles
/// - `GET /reservations` - Listar (filtros `date`, `mobile_number`)
/// - `POST /reservations` - Crear nueva reserva
/// - `GET /reservations/{id}` - Leer reserva
/// - `PUT /reservations/{id}/status` - Cambiar estado
/// - `PUT /reservations/{id}` - Editar campos
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_reservations);
    cfg.service(create_reservation);
    cfg.service(read_reservation);
    cfg.service(update_reservation_status);
    cfg.service(edit_reservation);
}
