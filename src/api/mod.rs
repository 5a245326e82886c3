//! # Módulo API
//!
//! Este módulo contiene todas las rutas y controladores de la API REST.
//!
//! ## Módulos principales
//!
//! - [`reservation`] - Gestión de reservas (crear, listar, leer, editar, cambiar estado)
//! - [`table`] - Gestión de mesas (crear, listar, sentar, liberar)
//! - [`errors`] - Manejo de errores de la aplicación
//!
//! Todos los cuerpos de petición y respuesta van envueltos en un objeto
//! `{ "data": ... }`.

pub mod errors;
pub mod middleware;
pub mod reservation;
pub mod table;

// Re-exportar tipos comunes para facilitar su uso
pub use errors::{AppError, AppResult, ErrorResponse};

use actix_web::web;
use serde::Deserialize;

/// Envoltura `{ "data": ... }` de los cuerpos de petición
#[derive(Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
}

impl<T> DataEnvelope<T> {
    /// Extrae el objeto `data`, rechazando cuerpos que no lo incluyan
    pub fn require_data(self) -> AppResult<T> {
        self.data
            .ok_or_else(|| AppError::Validation("Body must include a data object".to_string()))
    }
}

/// Configura todas las rutas de la API
///
/// ## Rutas configuradas
///
/// - `/reservations/*` - Ver [`reservation::routes`]
/// - `/tables/*` - Ver [`table::routes`]
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    reservation::routes(cfg);
    table::routes(cfg);
}
