use super::DbRepository;
use super::audit::insert_audit;
use crate::DbError;
use availability::{TimeRange, find_conflicts};
use chrono::NaiveDate;
use core_types::{
    AuditAction, Booking, BookingSlot, BookingStatus, BookingUpdate, NewAuditEntry, NewBooking,
    Page, PageRequest,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, Postgres, Transaction};

pub(crate) const BOOKING_SELECT: &str = "SELECT r.id, r.cliente_id AS client_id, \
    c.nombre AS client_first_name, c.apellido AS client_last_name, \
    r.cancha_id AS court_id, ca.nombre AS court_name, tc.nombre AS court_type, \
    r.fecha_reserva AS date, r.hora_inicio AS start_time, r.hora_fin AS end_time, \
    r.duracion AS duration_hours, r.estado AS status, r.observaciones AS notes, \
    ca.precio_hora AS price_per_hour, (r.duracion * ca.precio_hora) AS total_price, \
    r.fecha_creacion AS created_at \
    FROM reservas r \
    JOIN clientes c ON c.id = r.cliente_id \
    JOIN canchas ca ON ca.id = r.cancha_id \
    LEFT JOIN tipos_cancha tc ON tc.id = ca.tipo_cancha_id";

const BOOKING_ORDER: &str = "ORDER BY r.fecha_reserva DESC, r.hora_inicio DESC, r.id DESC";

/// Optional criteria for `filter_bookings`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
    pub court_id: Option<i32>,
    pub client_id: Option<i32>,
}

/// Booking length in hours, rounded to two decimals.
pub(crate) fn duration_hours(range: &TimeRange) -> Decimal {
    (Decimal::from(range.duration_minutes()) / Decimal::from(60)).round_dp(2)
}

fn conflict_message(court_id: i32, date: NaiveDate, conflicts: &[BookingSlot]) -> String {
    let spans: Vec<String> = conflicts
        .iter()
        .map(|slot| {
            format!(
                "#{} {}-{}",
                slot.id,
                slot.start_time.format("%H:%M"),
                slot.end_time.format("%H:%M")
            )
        })
        .collect();
    format!(
        "court {} is not available on {}: overlaps {}",
        court_id,
        date,
        spans.join(", ")
    )
}

/// Bookings of one court on one day, in start order.
async fn slots_on(
    conn: &mut PgConnection,
    court_id: i32,
    date: NaiveDate,
) -> Result<Vec<BookingSlot>, DbError> {
    let slots = sqlx::query_as::<_, BookingSlot>(
        r#"
        SELECT id, hora_inicio AS start_time, hora_fin AS end_time, estado AS status
        FROM reservas
        WHERE cancha_id = $1 AND fecha_reserva = $2
        ORDER BY hora_inicio
        "#,
    )
    .bind(court_id)
    .bind(date)
    .fetch_all(conn)
    .await?;
    Ok(slots)
}

/// Locks the court row, then checks the requested range against that court's
/// bookings for the day. Concurrent writers for the same court queue on the lock,
/// so the check and the following write are atomic.
async fn lock_court_and_check(
    tx: &mut Transaction<'_, Postgres>,
    court_id: i32,
    date: NaiveDate,
    requested: TimeRange,
    exclude_id: Option<i32>,
) -> Result<(), DbError> {
    let locked: Option<i32> = sqlx::query_scalar("SELECT id FROM canchas WHERE id = $1 FOR UPDATE")
        .bind(court_id)
        .fetch_optional(&mut **tx)
        .await?;
    if locked.is_none() {
        return Err(DbError::not_found("court", court_id));
    }

    let existing = slots_on(&mut **tx, court_id, date).await?;
    let conflicts = find_conflicts(&existing, requested, exclude_id);
    if !conflicts.is_empty() {
        tracing::warn!(court_id, %date, conflicts = conflicts.len(), "Booking rejected: slot taken.");
        return Err(DbError::Conflict(conflict_message(court_id, date, &conflicts)));
    }
    Ok(())
}

/// Locks a booking row and returns its current status.
async fn lock_booking(
    tx: &mut Transaction<'_, Postgres>,
    id: i32,
) -> Result<BookingStatus, DbError> {
    sqlx::query_scalar::<_, BookingStatus>("SELECT estado FROM reservas WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| DbError::not_found("booking", id))
}

fn requested_range(booking: &NewBooking) -> Result<TimeRange, DbError> {
    TimeRange::new(booking.start_time, booking.end_time).map_err(|e| DbError::Invalid(e.to_string()))
}

impl DbRepository {
    /// Creates a pending booking if the slot is free.
    ///
    /// The availability check and the insert run in one transaction holding a
    /// lock on the court row. The schema's exclusion constraint backs this up;
    /// either path surfaces as `DbError::Conflict`.
    pub async fn create_booking(&self, booking: &NewBooking, actor: &str) -> Result<Booking, DbError> {
        let requested = requested_range(booking)?;
        let mut tx = self.pool.begin().await?;

        lock_court_and_check(&mut tx, booking.court_id, booking.date, requested, None).await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO reservas (cliente_id, cancha_id, fecha_reserva, hora_inicio, hora_fin, duracion, estado, observaciones)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(booking.client_id)
        .bind(booking.court_id)
        .bind(booking.date)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(duration_hours(&requested))
        .bind(BookingStatus::Pending)
        .bind(booking.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Insert, "reservas")
                .record(id)
                .details(format!(
                    "court {} on {} {}-{}",
                    booking.court_id,
                    booking.date,
                    booking.start_time.format("%H:%M"),
                    booking.end_time.format("%H:%M")
                )),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(booking_id = id, court_id = booking.court_id, date = %booking.date, actor, "Booking created.");
        self.get_booking(id).await
    }

    /// Replaces every editable field of a booking.
    ///
    /// The slot is re-checked excluding the booking itself, so shrinking or
    /// keeping its own range never conflicts with itself.
    pub async fn update_booking(
        &self,
        id: i32,
        update: &BookingUpdate,
        actor: &str,
    ) -> Result<Booking, DbError> {
        let fields = &update.fields;
        let requested = requested_range(fields)?;
        let mut tx = self.pool.begin().await?;

        let current = lock_booking(&mut tx, id).await?;
        if !current.can_transition_to(update.status) {
            return Err(DbError::Invalid(format!(
                "booking {} cannot move from {} to {}",
                id, current, update.status
            )));
        }
        if update.status.blocks_availability() {
            lock_court_and_check(&mut tx, fields.court_id, fields.date, requested, Some(id)).await?;
        }

        sqlx::query(
            r#"
            UPDATE reservas SET
                cliente_id = $1, cancha_id = $2, fecha_reserva = $3, hora_inicio = $4,
                hora_fin = $5, duracion = $6, estado = $7, observaciones = $8,
                fecha_actualizacion = NOW()
            WHERE id = $9
            "#,
        )
        .bind(fields.client_id)
        .bind(fields.court_id)
        .bind(fields.date)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(duration_hours(&requested))
        .bind(update.status)
        .bind(fields.notes.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Update, "reservas").record(id),
        )
        .await?;
        tx.commit().await?;
        self.get_booking(id).await
    }

    /// Cancels a pending or confirmed booking and appends the reason to its notes.
    pub async fn cancel_booking(&self, id: i32, reason: &str, actor: &str) -> Result<Booking, DbError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_booking(&mut tx, id).await?;
        if current.is_terminal() {
            return Err(DbError::Conflict(format!("booking {} is already {}", id, current)));
        }

        sqlx::query(
            r#"
            UPDATE reservas SET
                estado = $1,
                observaciones = COALESCE(observaciones || E'\n', '') || $2,
                fecha_actualizacion = NOW()
            WHERE id = $3
            "#,
        )
        .bind(BookingStatus::Cancelled)
        .bind(format!("Cancelled: {}", reason))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Cancel, "reservas")
                .record(id)
                .details(reason),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(booking_id = id, actor, "Booking cancelled.");
        self.get_booking(id).await
    }

    /// Moves a booking to `status` when the transition is allowed.
    pub async fn set_booking_status(
        &self,
        id: i32,
        status: BookingStatus,
        actor: &str,
    ) -> Result<Booking, DbError> {
        let mut tx = self.pool.begin().await?;
        let current = lock_booking(&mut tx, id).await?;
        if !current.can_transition_to(status) {
            return Err(DbError::Invalid(format!(
                "booking {} cannot move from {} to {}",
                id, current, status
            )));
        }

        sqlx::query("UPDATE reservas SET estado = $1, fecha_actualizacion = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let action = if status == BookingStatus::Cancelled {
            AuditAction::Cancel
        } else {
            AuditAction::Update
        };
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, action, "reservas")
                .record(id)
                .details(format!("status {} -> {}", current, status)),
        )
        .await?;
        tx.commit().await?;
        self.get_booking(id).await
    }

    pub async fn get_booking(&self, id: i32) -> Result<Booking, DbError> {
        let sql = format!("{} WHERE r.id = $1", BOOKING_SELECT);
        sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("booking", id))
    }

    pub async fn list_bookings(&self, page: PageRequest) -> Result<Page<Booking>, DbError> {
        let page = page.normalized();
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservas")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!("{} {} LIMIT $1 OFFSET $2", BOOKING_SELECT, BOOKING_ORDER);
        let items = sqlx::query_as::<_, Booking>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::new(items, page, total))
    }

    /// Pending and confirmed bookings from today on, soonest first.
    pub async fn list_active_bookings(&self) -> Result<Vec<Booking>, DbError> {
        let sql = format!(
            "{} WHERE r.estado IN ('pendiente', 'confirmada') AND r.fecha_reserva >= CURRENT_DATE \
             ORDER BY r.fecha_reserva, r.hora_inicio",
            BOOKING_SELECT
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    pub async fn bookings_on(&self, date: NaiveDate) -> Result<Vec<Booking>, DbError> {
        let sql = format!(
            "{} WHERE r.fecha_reserva = $1 ORDER BY ca.nombre, r.hora_inicio",
            BOOKING_SELECT
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    pub async fn bookings_for_client(&self, client_id: i32) -> Result<Vec<Booking>, DbError> {
        let sql = format!("{} WHERE r.cliente_id = $1 {}", BOOKING_SELECT, BOOKING_ORDER);
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    pub async fn bookings_for_court(&self, court_id: i32) -> Result<Vec<Booking>, DbError> {
        let sql = format!("{} WHERE r.cancha_id = $1 {}", BOOKING_SELECT, BOOKING_ORDER);
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(court_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    pub async fn filter_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, DbError> {
        let sql = format!(
            "{} WHERE ($1::date IS NULL OR r.fecha_reserva >= $1) \
               AND ($2::date IS NULL OR r.fecha_reserva <= $2) \
               AND ($3::estado_reserva IS NULL OR r.estado = $3) \
               AND ($4::int IS NULL OR r.cancha_id = $4) \
               AND ($5::int IS NULL OR r.cliente_id = $5) \
             {}",
            BOOKING_SELECT, BOOKING_ORDER
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.status)
            .bind(filter.court_id)
            .bind(filter.client_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }

    /// Every booking of a court on a day, whatever its status.
    pub async fn booking_slots(&self, court_id: i32, date: NaiveDate) -> Result<Vec<BookingSlot>, DbError> {
        let mut conn = self.pool.acquire().await?;
        slots_on(&mut conn, court_id, date).await
    }

    /// Active bookings that overlap `requested`, ignoring `exclude_id`.
    /// An empty result means the slot is free. Advisory only: writes re-check under a lock.
    pub async fn booking_conflicts(
        &self,
        court_id: i32,
        date: NaiveDate,
        requested: TimeRange,
        exclude_id: Option<i32>,
    ) -> Result<Vec<BookingSlot>, DbError> {
        let existing = self.booking_slots(court_id, date).await?;
        Ok(find_conflicts(&existing, requested, exclude_id))
    }

    pub async fn check_availability(
        &self,
        court_id: i32,
        date: NaiveDate,
        requested: TimeRange,
        exclude_id: Option<i32>,
    ) -> Result<bool, DbError> {
        Ok(self
            .booking_conflicts(court_id, date, requested, exclude_id)
            .await?
            .is_empty())
    }

    /// Deletes every booking dated before `cutoff`, with its payments. Returns the number removed.
    pub async fn purge_bookings_before(&self, cutoff: NaiveDate, actor: &str) -> Result<u64, DbError> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM reservas WHERE fecha_reserva < $1")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Purge, "reservas")
                .details(format!("{} bookings before {} removed", removed, cutoff)),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(removed, %cutoff, actor, "Old bookings purged.");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal::Decimal;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn duration_is_expressed_in_hours() {
        let range = TimeRange::new(t(14, 0), t(15, 30)).unwrap();
        assert_eq!(duration_hours(&range), Decimal::new(150, 2));

        let range = TimeRange::new(t(9, 0), t(9, 20)).unwrap();
        assert_eq!(duration_hours(&range), Decimal::new(33, 2));
    }

    #[test]
    fn conflict_message_lists_offending_bookings() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let slots = [BookingSlot {
            id: 7,
            start_time: t(14, 0),
            end_time: t(15, 0),
            status: BookingStatus::Confirmed,
        }];
        let msg = conflict_message(3, date, &slots);
        assert_eq!(msg, "court 3 is not available on 2026-03-14: overlaps #7 14:00-15:00");
    }
}
