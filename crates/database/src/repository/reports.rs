use super::{DateRange, DbRepository};
use crate::DbError;
use core_types::BookingStatus;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

// Booking revenue is duration times the court's hourly price; cancelled bookings earn nothing.
const REVENUE: &str = "COALESCE(SUM(r.duracion * ca.precio_hora) FILTER (WHERE r.estado <> 'cancelada'), 0)";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct GeneralStats {
    pub total_bookings: i64,
    pub bookings_today: i64,
    pub active_clients: i64,
    pub active_courts: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct StatusCount {
    pub status: BookingStatus,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MonthlyStat {
    pub year: i32,
    pub month: i32,
    pub total_bookings: i64,
    pub revenue: Decimal,
    pub unique_clients: i64,
    pub courts_used: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ClientRanking {
    pub client_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub total_bookings: i64,
    pub total_spent: Decimal,
    pub average_per_booking: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CourtRanking {
    pub court_id: i32,
    pub court_name: String,
    pub court_type: Option<String>,
    pub total_bookings: i64,
    pub revenue: Decimal,
    pub average_per_booking: Option<Decimal>,
}

/// Usage by starting hour (0-23).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct HourlyStat {
    pub hour: i32,
    pub total_bookings: i64,
    pub revenue: Decimal,
}

/// Usage by weekday, 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WeekdayStat {
    pub weekday: i32,
    pub total_bookings: i64,
    pub revenue: Decimal,
}

impl DbRepository {
    /// Headline numbers for the dashboard. `range` restricts the booking count and revenue.
    pub async fn general_stats(&self, range: DateRange) -> Result<GeneralStats, DbError> {
        let stats = sqlx::query_as::<_, GeneralStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM reservas
                  WHERE ($1::date IS NULL OR fecha_reserva >= $1)
                    AND ($2::date IS NULL OR fecha_reserva <= $2)) AS total_bookings,
                (SELECT COUNT(*) FROM reservas WHERE fecha_reserva = CURRENT_DATE) AS bookings_today,
                (SELECT COUNT(*) FROM clientes WHERE estado = 'activo') AS active_clients,
                (SELECT COUNT(*) FROM canchas WHERE estado = 'activa') AS active_courts,
                (SELECT COALESCE(SUM(monto), 0) FROM pagos
                  WHERE estado = 'completado'
                    AND ($1::date IS NULL OR fecha_pago::date >= $1)
                    AND ($2::date IS NULL OR fecha_pago::date <= $2)) AS total_revenue
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    pub async fn bookings_by_status(&self, range: DateRange) -> Result<Vec<StatusCount>, DbError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT estado AS status, COUNT(*) AS total
            FROM reservas
            WHERE ($1::date IS NULL OR fecha_reserva >= $1)
              AND ($2::date IS NULL OR fecha_reserva <= $2)
            GROUP BY estado
            ORDER BY total DESC
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    /// One row per month with bookings, newest first. `year` restricts to one year.
    pub async fn monthly_stats(&self, year: Option<i32>) -> Result<Vec<MonthlyStat>, DbError> {
        let sql = format!(
            r#"
            SELECT
                EXTRACT(YEAR FROM r.fecha_reserva)::int AS year,
                EXTRACT(MONTH FROM r.fecha_reserva)::int AS month,
                COUNT(*) AS total_bookings,
                {} AS revenue,
                COUNT(DISTINCT r.cliente_id) AS unique_clients,
                COUNT(DISTINCT r.cancha_id) AS courts_used
            FROM reservas r
            JOIN canchas ca ON ca.id = r.cancha_id
            WHERE ($1::int IS NULL OR EXTRACT(YEAR FROM r.fecha_reserva)::int = $1)
            GROUP BY 1, 2
            ORDER BY year DESC, month DESC
            "#,
            REVENUE
        );
        let stats = sqlx::query_as::<_, MonthlyStat>(&sql)
            .bind(year)
            .fetch_all(&self.pool)
            .await?;
        Ok(stats)
    }

    /// Active clients ranked by number of bookings, then by spend.
    pub async fn top_clients(&self, range: DateRange, limit: i64) -> Result<Vec<ClientRanking>, DbError> {
        let sql = format!(
            r#"
            SELECT
                c.id AS client_id, c.nombre AS first_name, c.apellido AS last_name, c.email,
                COUNT(r.id) AS total_bookings,
                {} AS total_spent,
                AVG(r.duracion * ca.precio_hora) AS average_per_booking
            FROM clientes c
            LEFT JOIN reservas r ON r.cliente_id = c.id
                AND ($1::date IS NULL OR r.fecha_reserva >= $1)
                AND ($2::date IS NULL OR r.fecha_reserva <= $2)
            LEFT JOIN canchas ca ON ca.id = r.cancha_id
            WHERE c.estado = 'activo'
            GROUP BY c.id, c.nombre, c.apellido, c.email
            ORDER BY total_bookings DESC, total_spent DESC
            LIMIT $3
            "#,
            REVENUE
        );
        let ranking = sqlx::query_as::<_, ClientRanking>(&sql)
            .bind(range.from)
            .bind(range.to)
            .bind(limit.clamp(1, 100))
            .fetch_all(&self.pool)
            .await?;
        Ok(ranking)
    }

    /// Courts not marked inactive, ranked by number of bookings, then by revenue.
    pub async fn top_courts(&self, range: DateRange, limit: i64) -> Result<Vec<CourtRanking>, DbError> {
        let sql = format!(
            r#"
            SELECT
                ca.id AS court_id, ca.nombre AS court_name, tc.nombre AS court_type,
                COUNT(r.id) AS total_bookings,
                {} AS revenue,
                AVG(r.duracion * ca.precio_hora) AS average_per_booking
            FROM canchas ca
            LEFT JOIN tipos_cancha tc ON tc.id = ca.tipo_cancha_id
            LEFT JOIN reservas r ON r.cancha_id = ca.id
                AND ($1::date IS NULL OR r.fecha_reserva >= $1)
                AND ($2::date IS NULL OR r.fecha_reserva <= $2)
            WHERE ca.estado <> 'inactiva'
            GROUP BY ca.id, ca.nombre, tc.nombre
            ORDER BY total_bookings DESC, revenue DESC
            LIMIT $3
            "#,
            REVENUE
        );
        let ranking = sqlx::query_as::<_, CourtRanking>(&sql)
            .bind(range.from)
            .bind(range.to)
            .bind(limit.clamp(1, 100))
            .fetch_all(&self.pool)
            .await?;
        Ok(ranking)
    }

    pub async fn hourly_stats(&self, range: DateRange) -> Result<Vec<HourlyStat>, DbError> {
        let sql = format!(
            r#"
            SELECT
                EXTRACT(HOUR FROM r.hora_inicio)::int AS hour,
                COUNT(*) AS total_bookings,
                {} AS revenue
            FROM reservas r
            JOIN canchas ca ON ca.id = r.cancha_id
            WHERE ($1::date IS NULL OR r.fecha_reserva >= $1)
              AND ($2::date IS NULL OR r.fecha_reserva <= $2)
            GROUP BY 1
            ORDER BY hour
            "#,
            REVENUE
        );
        let stats = sqlx::query_as::<_, HourlyStat>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(stats)
    }

    pub async fn weekday_stats(&self, range: DateRange) -> Result<Vec<WeekdayStat>, DbError> {
        let sql = format!(
            r#"
            SELECT
                EXTRACT(DOW FROM r.fecha_reserva)::int AS weekday,
                COUNT(*) AS total_bookings,
                {} AS revenue
            FROM reservas r
            JOIN canchas ca ON ca.id = r.cancha_id
            WHERE ($1::date IS NULL OR r.fecha_reserva >= $1)
              AND ($2::date IS NULL OR r.fecha_reserva <= $2)
            GROUP BY 1
            ORDER BY weekday
            "#,
            REVENUE
        );
        let stats = sqlx::query_as::<_, WeekdayStat>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(stats)
    }
}
