use super::{DateRange, DbRepository};
use crate::DbError;
use core_types::{AuditAction, AuditEntry, NewAuditEntry, Page, PageRequest};
use serde::Serialize;
use sqlx::{FromRow, PgConnection};

const AUDIT_COLUMNS: &str = "id, usuario AS actor, tipo_accion AS action, tabla AS table_name, \
    registro_id AS record_id, detalles AS details, resultado AS outcome, ip_address, \
    fecha_hora AS occurred_at";

/// Number of audit rows per (action, table) pair.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AuditStat {
    pub action: AuditAction,
    pub table_name: String,
    pub total: i64,
    pub failures: i64,
}

/// Writes an audit row on an existing connection or transaction, so that the
/// audit record commits or rolls back together with the change it describes.
pub(crate) async fn insert_audit(
    conn: &mut PgConnection,
    entry: &NewAuditEntry,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO auditoria (usuario, tipo_accion, tabla, registro_id, detalles, resultado, ip_address)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&entry.actor)
    .bind(entry.action)
    .bind(&entry.table_name)
    .bind(entry.record_id)
    .bind(entry.details.as_deref())
    .bind(&entry.outcome)
    .bind(entry.ip_address.as_deref())
    .fetch_one(conn)
    .await?;
    Ok(id)
}

impl DbRepository {
    /// Appends a standalone audit row, e.g. for logins and failed attempts.
    pub async fn record_audit(&self, entry: &NewAuditEntry) -> Result<i64, DbError> {
        let mut conn = self.pool.acquire().await?;
        insert_audit(&mut conn, entry).await
    }

    pub async fn list_audit(&self, page: PageRequest) -> Result<Page<AuditEntry>, DbError> {
        let page = page.normalized();
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM auditoria")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM auditoria ORDER BY fecha_hora DESC, id DESC LIMIT $1 OFFSET $2",
            AUDIT_COLUMNS
        );
        let items = sqlx::query_as::<_, AuditEntry>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::new(items, page, total))
    }

    /// Audit rows whose date falls inside `range` (both ends inclusive).
    pub async fn audit_between(&self, range: DateRange) -> Result<Vec<AuditEntry>, DbError> {
        let sql = format!(
            "SELECT {} FROM auditoria \
             WHERE ($1::date IS NULL OR fecha_hora::date >= $1) \
               AND ($2::date IS NULL OR fecha_hora::date <= $2) \
             ORDER BY fecha_hora DESC, id DESC",
            AUDIT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AuditEntry>(&sql)
            .bind(range.from)
            .bind(range.to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn audit_by_actor(&self, actor: &str) -> Result<Vec<AuditEntry>, DbError> {
        let sql = format!(
            "SELECT {} FROM auditoria WHERE usuario = $1 ORDER BY fecha_hora DESC, id DESC",
            AUDIT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AuditEntry>(&sql)
            .bind(actor)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn audit_by_table(&self, table: &str) -> Result<Vec<AuditEntry>, DbError> {
        let sql = format!(
            "SELECT {} FROM auditoria WHERE tabla = $1 ORDER BY fecha_hora DESC, id DESC",
            AUDIT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AuditEntry>(&sql)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn audit_by_action(&self, action: AuditAction) -> Result<Vec<AuditEntry>, DbError> {
        let sql = format!(
            "SELECT {} FROM auditoria WHERE tipo_accion = $1 ORDER BY fecha_hora DESC, id DESC",
            AUDIT_COLUMNS
        );
        let rows = sqlx::query_as::<_, AuditEntry>(&sql)
            .bind(action)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn audit_stats(&self) -> Result<Vec<AuditStat>, DbError> {
        let stats = sqlx::query_as::<_, AuditStat>(
            r#"
            SELECT
                tipo_accion AS action,
                tabla AS table_name,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE resultado <> 'SUCCESS') AS failures
            FROM auditoria
            GROUP BY tipo_accion, tabla
            ORDER BY total DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}
