use super::DbRepository;
use super::audit::insert_audit;
use crate::DbError;
use availability::{TimeRange, fits_within, is_available};
use chrono::{NaiveDate, NaiveTime};
use core_types::{
    AuditAction, BookingSlot, BookingStatus, Court, CourtStatus, CourtType, NewAuditEntry,
    NewCourt, NewCourtType,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

const COURT_SELECT: &str = "SELECT ca.id, ca.nombre AS name, ca.tipo_cancha_id AS court_type_id, \
    tc.nombre AS court_type_name, ca.deporte AS sport, ca.capacidad AS capacity, \
    ca.precio_hora AS price_per_hour, ca.estado AS status, ca.horario_apertura AS opens_at, \
    ca.horario_cierre AS closes_at, ca.descripcion AS description, ca.fecha_creacion AS created_at \
    FROM canchas ca LEFT JOIN tipos_cancha tc ON tc.id = ca.tipo_cancha_id";

const COURT_TYPE_COLUMNS: &str = "id, nombre AS name, descripcion AS description, \
    precio_hora AS price_per_hour, activo AS active, fecha_creacion AS created_at";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CourtStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub maintenance: i64,
    pub sports: i64,
    pub average_price: Option<Decimal>,
}

// One booking on a given day, tagged with its court.
#[derive(Debug, FromRow)]
struct CourtSlotRow {
    court_id: i32,
    id: i32,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: BookingStatus,
}

impl DbRepository {
    // ==========================================================================
    // Court types
    // ==========================================================================

    pub async fn create_court_type(
        &self,
        court_type: &NewCourtType,
        actor: &str,
    ) -> Result<CourtType, DbError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO tipos_cancha (nombre, descripcion, precio_hora, activo) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            COURT_TYPE_COLUMNS
        );
        let created = sqlx::query_as::<_, CourtType>(&sql)
            .bind(&court_type.name)
            .bind(court_type.description.as_deref())
            .bind(court_type.price_per_hour)
            .bind(court_type.active)
            .fetch_one(&mut *tx)
            .await?;
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Insert, "tipos_cancha").record(created.id),
        )
        .await?;
        tx.commit().await?;
        Ok(created)
    }

    pub async fn list_court_types(&self) -> Result<Vec<CourtType>, DbError> {
        let sql = format!("SELECT {} FROM tipos_cancha ORDER BY nombre", COURT_TYPE_COLUMNS);
        let types = sqlx::query_as::<_, CourtType>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(types)
    }

    pub async fn get_court_type(&self, id: i32) -> Result<CourtType, DbError> {
        let sql = format!("SELECT {} FROM tipos_cancha WHERE id = $1", COURT_TYPE_COLUMNS);
        sqlx::query_as::<_, CourtType>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("court type", id))
    }

    pub async fn update_court_type(
        &self,
        id: i32,
        court_type: &NewCourtType,
        actor: &str,
    ) -> Result<CourtType, DbError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "UPDATE tipos_cancha SET nombre = $1, descripcion = $2, precio_hora = $3, activo = $4 \
             WHERE id = $5 RETURNING {}",
            COURT_TYPE_COLUMNS
        );
        let updated = sqlx::query_as::<_, CourtType>(&sql)
            .bind(&court_type.name)
            .bind(court_type.description.as_deref())
            .bind(court_type.price_per_hour)
            .bind(court_type.active)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("court type", id))?;
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Update, "tipos_cancha").record(id),
        )
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Courts of a deleted type keep existing with no type.
    pub async fn delete_court_type(&self, id: i32, actor: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM tipos_cancha WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("court type", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Delete, "tipos_cancha").record(id),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    // ==========================================================================
    // Courts
    // ==========================================================================

    pub async fn create_court(&self, court: &NewCourt, actor: &str) -> Result<Court, DbError> {
        let mut tx = self.pool.begin().await?;
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO canchas (
                nombre, tipo_cancha_id, deporte, capacidad, precio_hora, estado,
                horario_apertura, horario_cierre, descripcion
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&court.name)
        .bind(court.court_type_id)
        .bind(&court.sport)
        .bind(court.capacity)
        .bind(court.price_per_hour)
        .bind(court.status)
        .bind(court.opens_at)
        .bind(court.closes_at)
        .bind(court.description.as_deref())
        .fetch_one(&mut *tx)
        .await?;
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Insert, "canchas")
                .record(id)
                .details(format!("court '{}' created", court.name)),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(court_id = id, actor, "Court created.");
        self.get_court(id).await
    }

    pub async fn get_court(&self, id: i32) -> Result<Court, DbError> {
        let sql = format!("{} WHERE ca.id = $1", COURT_SELECT);
        sqlx::query_as::<_, Court>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("court", id))
    }

    pub async fn list_courts(&self) -> Result<Vec<Court>, DbError> {
        let sql = format!("{} ORDER BY ca.nombre", COURT_SELECT);
        let courts = sqlx::query_as::<_, Court>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(courts)
    }

    pub async fn list_active_courts(&self) -> Result<Vec<Court>, DbError> {
        let sql = format!("{} WHERE ca.estado = $1 ORDER BY ca.nombre", COURT_SELECT);
        let courts = sqlx::query_as::<_, Court>(&sql)
            .bind(CourtStatus::Active)
            .fetch_all(&self.pool)
            .await?;
        Ok(courts)
    }

    pub async fn list_courts_by_sport(&self, sport: &str) -> Result<Vec<Court>, DbError> {
        let sql = format!(
            "{} WHERE LOWER(ca.deporte) = LOWER($1) ORDER BY ca.nombre",
            COURT_SELECT
        );
        let courts = sqlx::query_as::<_, Court>(&sql)
            .bind(sport.trim())
            .fetch_all(&self.pool)
            .await?;
        Ok(courts)
    }

    /// Case-insensitive substring search over name, sport, type and description.
    pub async fn search_courts(&self, term: &str) -> Result<Vec<Court>, DbError> {
        let pattern = format!("%{}%", term.trim());
        let sql = format!(
            "{} WHERE ca.nombre ILIKE $1 OR ca.deporte ILIKE $1 \
                OR COALESCE(tc.nombre, '') ILIKE $1 OR COALESCE(ca.descripcion, '') ILIKE $1 \
             ORDER BY ca.nombre",
            COURT_SELECT
        );
        let courts = sqlx::query_as::<_, Court>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(courts)
    }

    pub async fn update_court(&self, id: i32, court: &NewCourt, actor: &str) -> Result<Court, DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query(
            r#"
            UPDATE canchas SET
                nombre = $1, tipo_cancha_id = $2, deporte = $3, capacidad = $4,
                precio_hora = $5, estado = $6, horario_apertura = $7, horario_cierre = $8,
                descripcion = $9
            WHERE id = $10
            "#,
        )
        .bind(&court.name)
        .bind(court.court_type_id)
        .bind(&court.sport)
        .bind(court.capacity)
        .bind(court.price_per_hour)
        .bind(court.status)
        .bind(court.opens_at)
        .bind(court.closes_at)
        .bind(court.description.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("court", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Update, "canchas").record(id),
        )
        .await?;
        tx.commit().await?;
        self.get_court(id).await
    }

    pub async fn set_court_status(
        &self,
        id: i32,
        status: CourtStatus,
        actor: &str,
    ) -> Result<Court, DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("UPDATE canchas SET estado = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("court", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Update, "canchas")
                .record(id)
                .details(format!("status -> {}", status)),
        )
        .await?;
        tx.commit().await?;
        self.get_court(id).await
    }

    /// Courts with bookings cannot be deleted; set them inactive instead.
    pub async fn delete_court(&self, id: i32, actor: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM canchas WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("court", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Delete, "canchas").record(id),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn court_stats(&self) -> Result<CourtStats, DbError> {
        let stats = sqlx::query_as::<_, CourtStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE estado = 'activa') AS active,
                COUNT(*) FILTER (WHERE estado = 'inactiva') AS inactive,
                COUNT(*) FILTER (WHERE estado = 'mantenimiento') AS maintenance,
                COUNT(DISTINCT deporte) AS sports,
                AVG(precio_hora) AS average_price
            FROM canchas
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Active courts whose opening hours contain `requested` and that have no
    /// active booking overlapping it on `date`.
    pub async fn available_courts(
        &self,
        date: NaiveDate,
        requested: TimeRange,
    ) -> Result<Vec<Court>, DbError> {
        let courts = self.list_active_courts().await?;
        let rows = sqlx::query_as::<_, CourtSlotRow>(
            r#"
            SELECT cancha_id AS court_id, id, hora_inicio AS start_time, hora_fin AS end_time, estado AS status
            FROM reservas
            WHERE fecha_reserva = $1 AND estado IN ('pendiente', 'confirmada')
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        let available = courts
            .into_iter()
            .filter(|court| {
                TimeRange::new(court.opens_at, court.closes_at)
                    .map(|window| fits_within(&window, &requested))
                    .unwrap_or(false)
            })
            .filter(|court| {
                let slots: Vec<BookingSlot> = rows
                    .iter()
                    .filter(|row| row.court_id == court.id)
                    .map(|row| BookingSlot {
                        id: row.id,
                        start_time: row.start_time,
                        end_time: row.end_time,
                        status: row.status,
                    })
                    .collect();
                is_available(&slots, requested, None)
            })
            .collect();
        Ok(available)
    }
}
