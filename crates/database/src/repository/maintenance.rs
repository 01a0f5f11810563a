use super::DbRepository;
use super::audit::insert_audit;
use crate::DbError;
use chrono::{DateTime, Utc};
use core_types::{AuditAction, MaintainedTable, NewAuditEntry};
use serde::Serialize;

/// A data-quality rule: a name and the WHERE condition that selects violating rows.
type Rule = (&'static str, &'static str);

const EMAIL_PATTERN: &str = r"'^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$'";

/// Another client whose e-mail is the same once trimmed and lowercased. Lowering
/// such a row would break the unique e-mail constraint.
const EMAIL_CASE_TWIN: &str = "EXISTS (SELECT 1 FROM clientes twin WHERE twin.id <> clientes.id \
     AND LOWER(TRIM(twin.email)) = LOWER(TRIM(clientes.email)))";

fn validation_rules(table: MaintainedTable) -> Vec<Rule> {
    match table {
        MaintainedTable::Clients => vec![
            ("blank_name", "TRIM(nombre) = '' OR TRIM(apellido) = ''"),
            ("untrimmed_text", "nombre <> TRIM(nombre) OR apellido <> TRIM(apellido) OR email <> TRIM(email)"),
            ("invalid_email", "email !~ __EMAIL__"),
            ("uppercase_email", "email <> LOWER(email)"),
            ("email_case_duplicate", EMAIL_CASE_TWIN),
            ("future_birth_date", "fecha_nacimiento > CURRENT_DATE"),
        ],
        MaintainedTable::Courts => vec![
            ("blank_name", "TRIM(nombre) = ''"),
            ("untrimmed_text", "nombre <> TRIM(nombre) OR deporte <> TRIM(deporte)"),
            ("no_court_type", "tipo_cancha_id IS NULL"),
        ],
        MaintainedTable::Bookings => vec![
            ("stale_pending", "estado = 'pendiente' AND fecha_reserva < CURRENT_DATE"),
            (
                "duration_mismatch",
                "duracion <> ROUND(EXTRACT(EPOCH FROM (hora_fin - hora_inicio)) / 3600, 2)",
            ),
        ],
        MaintainedTable::Payments => vec![
            (
                "client_mismatch",
                "EXISTS (SELECT 1 FROM reservas r WHERE r.id = pagos.reserva_id AND r.cliente_id <> pagos.cliente_id)",
            ),
            (
                "paid_cancelled_booking",
                "estado = 'completado' AND EXISTS (SELECT 1 FROM reservas r WHERE r.id = pagos.reserva_id AND r.estado = 'cancelada')",
            ),
            ("blank_notes", "observaciones IS NOT NULL AND TRIM(observaciones) = ''"),
        ],
        MaintainedTable::Users => vec![
            ("blank_username", "TRIM(username) = ''"),
            ("never_logged_in", "ultimo_acceso IS NULL"),
        ],
    }
}

/// Idempotent fixes applied by the clean mode, as (step name, UPDATE statement).
fn cleanup_steps(table: MaintainedTable) -> Vec<Rule> {
    match table {
        MaintainedTable::Clients => vec![
            // Rows with a case twin are left alone and reported by validation.
            (
                "trim_text",
                "UPDATE clientes SET nombre = TRIM(nombre), apellido = TRIM(apellido), \
                 telefono = NULLIF(TRIM(telefono), ''), fecha_actualizacion = NOW() \
                 WHERE nombre <> TRIM(nombre) OR apellido <> TRIM(apellido) \
                    OR telefono <> TRIM(telefono) OR telefono = ''",
            ),
            (
                "normalise_email",
                "UPDATE clientes SET email = LOWER(TRIM(email)), fecha_actualizacion = NOW() \
                 WHERE email <> LOWER(TRIM(email)) AND NOT __EMAIL_TWIN__",
            ),
        ],
        MaintainedTable::Courts => vec![(
            "trim_text",
            "UPDATE canchas SET nombre = TRIM(nombre), deporte = TRIM(deporte), \
             descripcion = NULLIF(TRIM(descripcion), '') \
             WHERE nombre <> TRIM(nombre) OR deporte <> TRIM(deporte) OR descripcion <> TRIM(descripcion)",
        )],
        MaintainedTable::Bookings => vec![
            (
                "complete_stale_pending",
                "UPDATE reservas SET estado = 'completada', fecha_actualizacion = NOW() \
                 WHERE estado = 'pendiente' AND fecha_reserva < CURRENT_DATE",
            ),
            (
                "recompute_duration",
                "UPDATE reservas SET duracion = ROUND(EXTRACT(EPOCH FROM (hora_fin - hora_inicio)) / 3600, 2) \
                 WHERE duracion <> ROUND(EXTRACT(EPOCH FROM (hora_fin - hora_inicio)) / 3600, 2)",
            ),
        ],
        MaintainedTable::Payments => vec![(
            "blank_notes",
            "UPDATE pagos SET observaciones = NULL, fecha_actualizacion = NOW() \
             WHERE observaciones IS NOT NULL AND TRIM(observaciones) = ''",
        )],
        MaintainedTable::Users => vec![(
            "trim_username",
            "UPDATE usuarios SET username = TRIM(username) WHERE username <> TRIM(username)",
        )],
    }
}

/// Name of the snapshot table for `table` taken at `at`, e.g. `reservas_backup_20260314093000`.
pub(crate) fn backup_table_name(table: MaintainedTable, at: DateTime<Utc>) -> String {
    format!("{}_backup_{}", table.table_name(), at.format("%Y%m%d%H%M%S"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    pub rule: String,
    pub rows: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableValidation {
    pub table: MaintainedTable,
    pub rows: i64,
    pub violations: Vec<RuleResult>,
}

impl TableValidation {
    pub fn is_clean(&self) -> bool {
        self.violations.iter().all(|v| v.rows == 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCleanup {
    pub table: MaintainedTable,
    pub steps: Vec<RuleResult>,
}

impl TableCleanup {
    pub fn rows_changed(&self) -> i64 {
        self.steps.iter().map(|s| s.rows).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableBackup {
    pub table: MaintainedTable,
    pub backup_table: String,
    pub rows: i64,
}

impl DbRepository {
    /// Counts the rows breaking each data-quality rule of `table`. Read-only.
    pub async fn validate_table(&self, table: MaintainedTable, actor: &str) -> Result<TableValidation, DbError> {
        let name = table.table_name();
        let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", name))
            .fetch_one(&self.pool)
            .await?;

        let mut violations = Vec::new();
        for (rule, condition) in validation_rules(table) {
            let condition = condition.replace("__EMAIL__", EMAIL_PATTERN);
            let count: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE {}", name, condition))
                    .fetch_one(&self.pool)
                    .await?;
            violations.push(RuleResult { rule: rule.to_string(), rows: count });
        }
        let result = TableValidation { table, rows, violations };

        let summary: Vec<String> = result
            .violations
            .iter()
            .filter(|v| v.rows > 0)
            .map(|v| format!("{}={}", v.rule, v.rows))
            .collect();
        self.record_audit(
            &NewAuditEntry::success(actor, AuditAction::Validate, name).details(if summary.is_empty() {
                "no issues".to_string()
            } else {
                summary.join(", ")
            }),
        )
        .await?;

        tracing::info!(table = name, clean = result.is_clean(), "Table validated.");
        Ok(result)
    }

    /// Applies every cleanup step of `table` in one transaction.
    pub async fn clean_table(&self, table: MaintainedTable, actor: &str) -> Result<TableCleanup, DbError> {
        let name = table.table_name();
        let mut tx = self.pool.begin().await?;
        let mut steps = Vec::new();
        for (step, statement) in cleanup_steps(table) {
            let statement = statement.replace("__EMAIL_TWIN__", EMAIL_CASE_TWIN);
            let affected = sqlx::query(&statement).execute(&mut *tx).await?.rows_affected();
            steps.push(RuleResult { rule: step.to_string(), rows: affected as i64 });
        }
        let result = TableCleanup { table, steps };

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Clean, name)
                .details(format!("{} rows changed", result.rows_changed())),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(table = name, rows_changed = result.rows_changed(), "Table cleaned.");
        Ok(result)
    }

    /// Copies `table` into a new timestamped table in the same schema.
    pub async fn backup_table(&self, table: MaintainedTable, actor: &str) -> Result<TableBackup, DbError> {
        let name = table.table_name();
        let backup = backup_table_name(table, Utc::now());
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(&format!("CREATE TABLE {} AS TABLE {}", backup, name))
            .execute(&mut *tx)
            .await?
            .rows_affected() as i64;

        insert_audit(
            &mut tx,
            &NewAuditEntry::success(actor, AuditAction::Backup, name)
                .details(format!("{} rows copied to {}", rows, backup)),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(table = name, backup = %backup, rows, "Table backed up.");
        Ok(TableBackup { table, backup_table: backup, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_table_has_rules_and_cleanup_steps() {
        for table in MaintainedTable::ALL {
            assert!(!validation_rules(table).is_empty(), "{} has no rules", table);
            assert!(!cleanup_steps(table).is_empty(), "{} has no cleanup", table);
        }
    }

    #[test]
    fn cleanup_statements_only_touch_their_own_table() {
        for table in MaintainedTable::ALL {
            let prefix = format!("UPDATE {} ", table.table_name());
            for (step, statement) in cleanup_steps(table) {
                assert!(statement.starts_with(&prefix), "{} / {}", table, step);
            }
        }
    }

    #[test]
    fn email_normalisation_skips_rows_with_a_case_twin() {
        let (_, statement) = cleanup_steps(MaintainedTable::Clients)
            .into_iter()
            .find(|(step, _)| *step == "normalise_email")
            .unwrap();
        let statement = statement.replace("__EMAIL_TWIN__", EMAIL_CASE_TWIN);
        assert!(statement.contains("AND NOT EXISTS (SELECT 1 FROM clientes twin"));
        assert!(!statement.contains("__"));
        assert!(
            validation_rules(MaintainedTable::Clients)
                .iter()
                .any(|(rule, condition)| *rule == "email_case_duplicate" && *condition == EMAIL_CASE_TWIN)
        );
    }

    #[test]
    fn backup_name_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 5).unwrap();
        assert_eq!(
            backup_table_name(MaintainedTable::Bookings, at),
            "reservas_backup_20260314093005"
        );
    }

    #[test]
    fn cleanup_result_sums_steps() {
        let cleanup = TableCleanup {
            table: MaintainedTable::Clients,
            steps: vec![
                RuleResult { rule: "trim_text".into(), rows: 2 },
                RuleResult { rule: "normalise_email".into(), rows: 3 },
            ],
        };
        assert_eq!(cleanup.rows_changed(), 5);
    }
}
