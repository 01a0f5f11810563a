use super::bookings::BOOKING_SELECT;
use super::audit::insert_audit;
use super::{DateRange, DbRepository};
use crate::DbError;
use core_types::{
    AuditAction, Booking, NewAuditEntry, NewPayment, Page, PageRequest, Payment, PaymentMethod,
    PaymentUpdate,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

const PAYMENT_SELECT: &str = "SELECT p.id, p.reserva_id AS booking_id, p.cliente_id AS client_id, \
    c.nombre AS client_first_name, c.apellido AS client_last_name, p.monto AS amount, \
    p.metodo_pago AS method, p.estado AS status, p.observaciones AS notes, \
    p.fecha_pago AS paid_at, p.fecha_creacion AS created_at, p.fecha_actualizacion AS updated_at \
    FROM pagos p JOIN clientes c ON c.id = p.cliente_id";

const PAYMENT_ORDER: &str = "ORDER BY p.fecha_pago DESC, p.id DESC";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PaymentStats {
    pub total_payments: i64,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub unique_clients: i64,
    pub paid_bookings: i64,
}

impl DbRepository {
    /// Records a payment. The paying client is taken from the booking.
    pub async fn register_payment(&self, payment: &NewPayment, actor: &str) -> Result<Payment, DbError> {
        let mut tx = self.pool.begin().await?;
        let client_id: i32 = sqlx::query_scalar("SELECT cliente_id FROM reservas WHERE id = $1")
            .bind(payment.booking_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("booking", payment.booking_id))?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO pagos (reserva_id, cliente_id, monto, metodo_pago, estado, observaciones)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(payment.booking_id)
        .bind(client_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.notes.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Insert, "pagos")
                .record(id)
                .details(format!(
                    "{} {} for booking {}",
                    payment.amount, payment.method, payment.booking_id
                )),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(payment_id = id, booking_id = payment.booking_id, actor, "Payment registered.");
        self.get_payment(id).await
    }

    pub async fn get_payment(&self, id: i32) -> Result<Payment, DbError> {
        let sql = format!("{} WHERE p.id = $1", PAYMENT_SELECT);
        sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("payment", id))
    }

    pub async fn list_payments(&self, page: PageRequest) -> Result<Page<Payment>, DbError> {
        let page = page.normalized();
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pagos")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!("{} {} LIMIT $1 OFFSET $2", PAYMENT_SELECT, PAYMENT_ORDER);
        let items = sqlx::query_as::<_, Payment>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::new(items, page, total))
    }

    pub async fn payments_for_booking(&self, booking_id: i32) -> Result<Vec<Payment>, DbError> {
        let sql = format!("{} WHERE p.reserva_id = $1 {}", PAYMENT_SELECT, PAYMENT_ORDER);
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn payments_for_client(&self, client_id: i32) -> Result<Vec<Payment>, DbError> {
        let sql = format!("{} WHERE p.cliente_id = $1 {}", PAYMENT_SELECT, PAYMENT_ORDER);
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn payments_between(&self, range: DateRange) -> Result<Vec<Payment>, DbError> {
        let sql = format!(
            "{} WHERE ($1::date IS NULL OR p.fecha_pago::date >= $1) \
               AND ($2::date IS NULL OR p.fecha_pago::date <= $2) {}",
            PAYMENT_SELECT, PAYMENT_ORDER
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn payments_by_method(&self, method: PaymentMethod) -> Result<Vec<Payment>, DbError> {
        let sql = format!("{} WHERE p.metodo_pago = $1 {}", PAYMENT_SELECT, PAYMENT_ORDER);
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(method)
            .fetch_all(&self.pool)
            .await?;
        Ok(payments)
    }

    pub async fn update_payment(
        &self,
        id: i32,
        update: &PaymentUpdate,
        actor: &str,
    ) -> Result<Payment, DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query(
            r#"
            UPDATE pagos SET monto = $1, metodo_pago = $2, estado = $3, observaciones = $4,
                fecha_actualizacion = NOW()
            WHERE id = $5
            "#,
        )
        .bind(update.amount)
        .bind(update.method)
        .bind(update.status)
        .bind(update.notes.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("payment", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Update, "pagos").record(id),
        )
        .await?;
        tx.commit().await?;
        self.get_payment(id).await
    }

    pub async fn delete_payment(&self, id: i32, actor: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM pagos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("payment", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Delete, "pagos").record(id),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Totals over completed payments whose date falls inside `range`.
    pub async fn payment_stats(&self, range: DateRange) -> Result<PaymentStats, DbError> {
        let stats = sqlx::query_as::<_, PaymentStats>(
            r#"
            SELECT
                COUNT(*) AS total_payments,
                COALESCE(SUM(p.monto), 0) AS total_amount,
                COALESCE(AVG(p.monto), 0) AS average_amount,
                COUNT(DISTINCT p.cliente_id) AS unique_clients,
                COUNT(DISTINCT p.reserva_id) AS paid_bookings
            FROM pagos p
            WHERE p.estado = 'completado'
              AND ($1::date IS NULL OR p.fecha_pago::date >= $1)
              AND ($2::date IS NULL OR p.fecha_pago::date <= $2)
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    /// Confirmed bookings with no completed payment.
    pub async fn bookings_without_payment(&self) -> Result<Vec<Booking>, DbError> {
        let sql = format!(
            "{} WHERE r.estado = 'confirmada' \
               AND NOT EXISTS ( \
                   SELECT 1 FROM pagos p WHERE p.reserva_id = r.id AND p.estado = 'completado' \
               ) \
             ORDER BY r.fecha_reserva DESC, r.hora_inicio DESC",
            BOOKING_SELECT
        );
        let bookings = sqlx::query_as::<_, Booking>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(bookings)
    }
}
