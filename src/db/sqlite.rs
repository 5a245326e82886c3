use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::env;

use crate::api::AppError;
use crate::db::models::{
    DiningTable, NewReservation, NewTable, Reservation, ReservationStatus, TableStatus,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pub pool: SqlitePool,
}

impl SqliteRepo {
    pub async fn init() -> Result<SqliteRepo> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://reservations.db?mode=rwc".to_string());

        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<SqliteRepo> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Internal(format!("Error conectando a SQLite: {}", e)))?;

        // Test connection
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| AppError::Internal(format!("Error validando conexión SQLite: {}", e)))?;

        tracing::info!("Conexión a SQLite establecida exitosamente");

        Ok(SqliteRepo { pool })
    }

    // Crea tablas e índices si todavía no existen
    pub async fn create_schema(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS reservations (
                reservation_id   INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name       TEXT    NOT NULL,
                last_name        TEXT    NOT NULL,
                mobile_number    TEXT    NOT NULL,
                reservation_date TEXT    NOT NULL,
                reservation_time TEXT    NOT NULL,
                people           INTEGER NOT NULL,
                status           TEXT    NOT NULL DEFAULT 'booked',
                created_at       INTEGER NOT NULL,
                updated_at       INTEGER NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tables (
                table_id       INTEGER PRIMARY KEY AUTOINCREMENT,
                table_name     TEXT    NOT NULL,
                capacity       INTEGER NOT NULL,
                status         TEXT    NOT NULL DEFAULT 'free',
                reservation_id INTEGER REFERENCES reservations (reservation_id),
                created_at     INTEGER NOT NULL,
                updated_at     INTEGER NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_reservations_date ON reservations (reservation_date)",
            "CREATE INDEX IF NOT EXISTS idx_reservations_mobile ON reservations (mobile_number)",
            "CREATE INDEX IF NOT EXISTS idx_reservations_status ON reservations (status)",
            "CREATE INDEX IF NOT EXISTS idx_tables_status ON tables (status)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database("create_schema", e))?;
        }

        tracing::info!("Esquema SQLite creado exitosamente");
        Ok(())
    }

    pub async fn create_reservation(&self, new: &NewReservation) -> Result<Reservation> {
        let now = Self::current_timestamp();

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations
                (first_name, last_name, mobile_number, reservation_date,
                 reservation_time, people, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.mobile_number)
        .bind(&new.reservation_date)
        .bind(&new.reservation_time)
        .bind(new.people)
        .bind(new.status)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database("create_reservation", e))?;

        Ok(reservation)
    }

    pub async fn read_reservation(&self, reservation_id: i64) -> Result<Option<Reservation>> {
        let reservation = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE reservation_id = ?",
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database("read_reservation", e))?;

        Ok(reservation)
    }

    // Filtro opcional por fecha o por número de móvil (coincidencia parcial,
    // ignorando guiones). La fecha tiene prioridad sobre el móvil.
    pub async fn list_reservations(
        &self,
        date: Option<&str>,
        mobile: Option<&str>,
    ) -> Result<Vec<Reservation>> {
        let query = match (date, mobile) {
            (Some(date), _) => sqlx::query_as::<_, Reservation>(
                "SELECT * FROM reservations WHERE reservation_date = ? ORDER BY reservation_time",
            )
            .bind(date),
            (None, Some(mobile)) => sqlx::query_as::<_, Reservation>(
                r#"
                SELECT * FROM reservations
                WHERE replace(mobile_number, '-', '') LIKE '%' || replace(?, '-', '') || '%'
                ORDER BY reservation_date, reservation_time
                "#,
            )
            .bind(mobile),
            (None, None) => sqlx::query_as::<_, Reservation>(
                "SELECT * FROM reservations ORDER BY reservation_date, reservation_time",
            ),
        };

        let reservations = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database("list_reservations", e))?;

        Ok(reservations)
    }

    pub async fn update_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE reservations SET status = ?, updated_at = ? WHERE reservation_id = ?",
        )
        .bind(status)
        .bind(Self::current_timestamp())
        .bind(reservation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database("update_reservation_status", e))?;

        Ok(())
    }

    pub async fn edit_reservation(
        &self,
        reservation_id: i64,
        fields: &NewReservation,
    ) -> Result<Reservation> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET first_name = ?, last_name = ?, mobile_number = ?,
                reservation_date = ?, reservation_time = ?, people = ?, updated_at = ?
            WHERE reservation_id = ?
            RETURNING *
            "#,
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.mobile_number)
        .bind(&fields.reservation_date)
        .bind(&fields.reservation_time)
        .bind(fields.people)
        .bind(Self::current_timestamp())
        .bind(reservation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database("edit_reservation", e))?;

        Ok(reservation)
    }

    // Si la mesa nace con una reserva asignada queda ocupada y la reserva
    // pasa a 'seated'; ambas escrituras van en la misma transacción.
    pub async fn create_table(&self, new: &NewTable) -> Result<DiningTable> {
        let now = Self::current_timestamp();
        let status = if new.reservation_id.is_some() {
            TableStatus::Occupied
        } else {
            TableStatus::Free
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("create_table", e))?;

        let table = sqlx::query_as::<_, DiningTable>(
            r#"
            INSERT INTO tables
                (table_name, capacity, status, reservation_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new.table_name)
        .bind(new.capacity)
        .bind(status)
        .bind(new.reservation_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database("create_table", e))?;

        if let Some(reservation_id) = new.reservation_id {
            sqlx::query(
                "UPDATE reservations SET status = ?, updated_at = ? WHERE reservation_id = ?",
            )
            .bind(ReservationStatus::Seated)
            .bind(now)
            .bind(reservation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("create_table", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database("create_table", e))?;

        Ok(table)
    }

    pub async fn read_table(&self, table_id: i64) -> Result<Option<DiningTable>> {
        let table = sqlx::query_as::<_, DiningTable>("SELECT * FROM tables WHERE table_id = ?")
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database("read_table", e))?;

        Ok(table)
    }

    pub async fn list_tables(&self) -> Result<Vec<DiningTable>> {
        let tables = sqlx::query_as::<_, DiningTable>("SELECT * FROM tables ORDER BY table_name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database("list_tables", e))?;

        Ok(tables)
    }

    // Ocupar mesa y sentar la reserva: una única transacción para que no
    // quede una mesa ocupada con la reserva aún en 'booked'.
    pub async fn occupy_table(&self, table_id: i64, reservation_id: i64) -> Result<()> {
        let now = Self::current_timestamp();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("occupy_table", e))?;

        sqlx::query(
            "UPDATE tables SET status = ?, reservation_id = ?, updated_at = ? WHERE table_id = ?",
        )
        .bind(TableStatus::Occupied)
        .bind(reservation_id)
        .bind(now)
        .bind(table_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("occupy_table", e))?;

        sqlx::query(
            "UPDATE reservations SET status = ?, updated_at = ? WHERE reservation_id = ?",
        )
        .bind(ReservationStatus::Seated)
        .bind(now)
        .bind(reservation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("occupy_table", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("occupy_table", e))?;

        Ok(())
    }

    // Liberar mesa y dar por terminada su reserva, también transaccional.
    pub async fn free_table(&self, table_id: i64, reservation_id: i64) -> Result<()> {
        let now = Self::current_timestamp();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("free_table", e))?;

        sqlx::query(
            "UPDATE reservations SET status = ?, updated_at = ? WHERE reservation_id = ?",
        )
        .bind(ReservationStatus::Finished)
        .bind(now)
        .bind(reservation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("free_table", e))?;

        sqlx::query(
            "UPDATE tables SET status = ?, reservation_id = NULL, updated_at = ? WHERE table_id = ?",
        )
        .bind(TableStatus::Free)
        .bind(now)
        .bind(table_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("free_table", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("free_table", e))?;

        Ok(())
    }

    // Función auxiliar para obtener timestamp actual
    pub fn current_timestamp() -> i64 {
        chrono::Utc::now().timestamp()
    }
}
