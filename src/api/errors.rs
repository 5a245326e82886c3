//! # Manejo de errores de la aplicación
//!
//! Jerarquía de errores construida con thiserror. Cada fallo termina en una
//! respuesta JSON `{error, message}` con su código HTTP: validación → 400,
//! no encontrado → 404, base de datos / interno → 500.

use actix_web::{HttpResponse, ResponseError};
use std::error::Error;
use thiserror::Error;

/// Tipos de error de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    /// Error de base de datos con contexto de la operación
    ///
    /// Mantiene la cadena de errores original de sqlx para debugging;
    /// hacia el cliente sólo viaja un mensaje opaco.
    #[error("Error de base de datos en operación '{operation}': {source}")]
    Database {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// Entrada inválida: campo ausente, mal formado o fuera de regla
    #[error("Error de validación: {0}")]
    Validation(String),

    /// Recurso referenciado que no existe
    #[error("No encontrado: {0}")]
    NotFound(String),

    /// Error interno con código de rastreo
    #[error("Error interno (trace: {trace_id}): {message}")]
    InternalWithTrace { trace_id: String, message: String },

    /// Error interno simple
    #[error("Error interno: {0}")]
    Internal(String),
}

// Métodos helper para crear errores con contexto
impl AppError {
    /// Crea un error de base de datos con contexto de operación
    pub fn database(operation: &str, source: sqlx::Error) -> Self {
        Self::Database {
            operation: operation.to_string(),
            source,
        }
    }

    /// Crea un error interno con trace ID
    pub fn internal_trace(message: &str, trace_id: Option<String>) -> Self {
        Self::InternalWithTrace {
            trace_id: trace_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            message: message.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        // Log detallado del error antes de responder
        match self {
            Self::Database { operation, source } => {
                tracing::error!(
                    operation = %operation,
                    error = %source,
                    error_chain = ?source.source(),
                    "Database error occurred"
                );
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Error de base de datos".to_string(),
                    message: "Error interno del servidor".to_string(),
                })
            }
            Self::Validation(message) => {
                tracing::warn!(message = %message, "Validation error");
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Error de validación".to_string(),
                    message: message.clone(),
                })
            }
            Self::NotFound(message) => {
                tracing::info!(message = %message, "Resource not found");
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "No encontrado".to_string(),
                    message: message.clone(),
                })
            }
            Self::InternalWithTrace { trace_id, message } => {
                tracing::error!(
                    trace_id = %trace_id,
                    message = %message,
                    "Internal error with trace"
                );
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Error interno".to_string(),
                    message: format!("Error interno (trace: {})", trace_id),
                })
            }
            Self::Internal(message) => {
                tracing::error!(message = %message, "Internal error");
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Error interno".to_string(),
                    message: "Error interno del servidor".to_string(),
                })
            }
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

pub type AppResult<T> = Result<T, AppError>;

// Conversión automática desde sqlx::Error
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::Database {
            operation: "database_operation".to_string(),
            source: error,
        }
    }
}
