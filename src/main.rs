//! # Mesas Reservation Server
//!
//! Servidor web de reservas y gestión de mesas de restaurante construido con
//! Rust, Actix Web y SQLite.
//!
//! ## Características principales
//!
//! - **Sistema de reservas**: alta, listado, edición y ciclo de estados
//!   (`booked` → `seated` → `finished`, o `cancelled`)
//! - **Gestión de mesas**: alta, listado, sentar y liberar reservas
//! - **Reglas de negocio**: horario de apertura, cierre los martes,
//!   aforo de las mesas
//! - **API REST**: peticiones y respuestas JSON envueltas en `{data: ...}`
//!
//! ## Configuración
//!
//! El servidor se configura mediante variables de entorno (archivo `.env`):
//!
//! ```env
//! # Base de datos SQLite
//! DATABASE_URL=sqlite://reservations.db?mode=rwc
//!
//! # Servidor
//! BIND_ADDRESS=0.0.0.0:8080
//!
//! # Logging
//! RUST_LOG=debug,sqlx=info
//! ```
//!
//! ## Ejecución
//!
//! ```bash
//! # 1. Configurar variables de entorno
//! cp .env.example .env
//!
//! # 2. Compilar y ejecutar (el esquema se crea al arrancar)
//! cargo run
//! ```
//!
//! ## Arquitectura
//!
//! ```text
//! Cliente (staff)
//!     ↓ HTTP/JSON
//! API REST (Actix Web)
//!     ↓ sqlx
//! SQLite
//! ```

use actix_web::{middleware::Logger, web, App, HttpServer};
use std::env;

use mesas_reservation::api::middleware::ErrorLogExt;
use mesas_reservation::{api, db};

/// Función principal que inicia el servidor web
///
/// # Funcionalidad
///
/// 1. Carga variables de entorno desde `.env`
/// 2. Configura el sistema de logging con tracing
/// 3. Abre el pool de conexiones SQLite
/// 4. Crea el esquema (tablas e índices) si no existe
/// 5. Configura el servidor HTTP con middleware de logging y las rutas de la API
/// 6. Inicia el servidor en la dirección especificada
///
/// # Errores
///
/// Retorna `std::io::Error` si no se puede abrir la base de datos, crear el
/// esquema o bindear al puerto especificado.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Configurar sistema de logging con tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mesas_reservation=debug".parse().unwrap())
                .add_directive("sqlx=info".parse().unwrap()),
        )
        .init();

    tracing::info!("Iniciando Mesas Reservation Server con SQLite...");

    // Inicializar conexión a SQLite y asegurar el esquema
    let repo = match db::SqliteRepo::init().await {
        Ok(repo) => {
            if let Err(e) = repo
                .create_schema()
                .await
                .log_error_context("creando esquema SQLite")
            {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Error de SQLite: {}", e),
                ));
            }
            repo
        }
        Err(e) => {
            tracing::error!("Error conectando a SQLite: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Error de SQLite: {}", e),
            ));
        }
    };

    // Obtener dirección de bind desde variables de entorno
    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    tracing::info!("Servidor iniciando en {}", bind_address);

    // Crear y configurar el servidor HTTP
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(repo.clone()))
            .wrap(Logger::default())
            .configure(api::init_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
