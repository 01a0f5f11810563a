use super::DbRepository;
use super::audit::insert_audit;
use crate::DbError;
use core_types::{
    AuditAction, Client, ClientStatus, ClientUpdate, NewAuditEntry, NewClient, Page, PageRequest,
};
use serde::Serialize;
use sqlx::FromRow;

pub(crate) const CLIENT_COLUMNS: &str = "id, nombre AS first_name, apellido AS last_name, \
    telefono AS phone, email, fecha_nacimiento AS birth_date, estado AS status, \
    fecha_registro AS registered_at, fecha_actualizacion AS updated_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ClientStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub registered_this_month: i64,
}

impl DbRepository {
    /// Inserts a client and its audit row in one transaction.
    pub async fn create_client(&self, client: &NewClient, actor: &str) -> Result<Client, DbError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "INSERT INTO clientes (nombre, apellido, telefono, email, fecha_nacimiento) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CLIENT_COLUMNS
        );
        let created = sqlx::query_as::<_, Client>(&sql)
            .bind(&client.first_name)
            .bind(&client.last_name)
            .bind(client.phone.as_deref())
            .bind(&client.email)
            .bind(client.birth_date)
            .fetch_one(&mut *tx)
            .await?;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Insert, "clientes")
                .record(created.id)
                .details(format!("client {} created", created.full_name())),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(client_id = created.id, actor, "Client created.");
        Ok(created)
    }

    pub async fn get_client(&self, id: i32) -> Result<Client, DbError> {
        let sql = format!("SELECT {} FROM clientes WHERE id = $1", CLIENT_COLUMNS);
        sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("client", id))
    }

    pub async fn list_clients(&self, page: PageRequest) -> Result<Page<Client>, DbError> {
        let page = page.normalized();
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clientes")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {} FROM clientes ORDER BY apellido, nombre, id LIMIT $1 OFFSET $2",
            CLIENT_COLUMNS
        );
        let items = sqlx::query_as::<_, Client>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(Page::new(items, page, total))
    }

    /// Clients that can receive new bookings.
    pub async fn list_active_clients(&self) -> Result<Vec<Client>, DbError> {
        let sql = format!(
            "SELECT {} FROM clientes WHERE estado = $1 ORDER BY apellido, nombre",
            CLIENT_COLUMNS
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(ClientStatus::Active)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    /// Case-insensitive substring search over name, e-mail and phone.
    pub async fn search_clients(&self, term: &str) -> Result<Vec<Client>, DbError> {
        let pattern = format!("%{}%", term.trim());
        let sql = format!(
            "SELECT {} FROM clientes \
             WHERE nombre ILIKE $1 OR apellido ILIKE $1 OR email ILIKE $1 \
                OR COALESCE(telefono, '') ILIKE $1 \
                OR (nombre || ' ' || apellido) ILIKE $1 \
             ORDER BY apellido, nombre LIMIT 100",
            CLIENT_COLUMNS
        );
        let clients = sqlx::query_as::<_, Client>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(clients)
    }

    pub async fn update_client(
        &self,
        id: i32,
        update: &ClientUpdate,
        actor: &str,
    ) -> Result<Client, DbError> {
        let mut tx = self.pool.begin().await?;
        let sql = format!(
            "UPDATE clientes SET nombre = $1, apellido = $2, telefono = $3, email = $4, \
             fecha_nacimiento = $5, estado = $6, fecha_actualizacion = NOW() \
             WHERE id = $7 RETURNING {}",
            CLIENT_COLUMNS
        );
        let fields = &update.fields;
        let updated = sqlx::query_as::<_, Client>(&sql)
            .bind(&fields.first_name)
            .bind(&fields.last_name)
            .bind(fields.phone.as_deref())
            .bind(&fields.email)
            .bind(fields.birth_date)
            .bind(update.status)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("client", id))?;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Update, "clientes").record(id),
        )
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Deletes a client. Clients with bookings or payments are rejected with `Conflict`.
    pub async fn delete_client(&self, id: i32, actor: &str) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(DbError::not_found("client", id));
        }
        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Delete, "clientes").record(id),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn client_stats(&self) -> Result<ClientStats, DbError> {
        let stats = sqlx::query_as::<_, ClientStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE estado = 'activo') AS active,
                COUNT(*) FILTER (WHERE estado = 'inactivo') AS inactive,
                COUNT(*) FILTER (
                    WHERE fecha_registro >= date_trunc('month', NOW())
                ) AS registered_this_month
            FROM clientes
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
