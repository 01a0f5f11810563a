use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a booking. Stored as the `estado_reserva` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "estado_reserva")]
pub enum BookingStatus {
    #[sqlx(rename = "pendiente")]
    Pending,
    #[sqlx(rename = "confirmada")]
    Confirmed,
    #[sqlx(rename = "cancelada")]
    Cancelled,
    #[sqlx(rename = "completada")]
    Completed,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::Completed,
    ];

    /// Pending and confirmed bookings hold their slot; the others have released it.
    pub fn blocks_availability(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Cancelled and completed bookings cannot move to any other status.
    pub fn is_terminal(&self) -> bool {
        !self.blocks_availability()
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if *self == next {
            return true;
        }
        match self {
            BookingStatus::Pending => true,
            BookingStatus::Confirmed => next != BookingStatus::Pending,
            BookingStatus::Cancelled | BookingStatus::Completed => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "estado_cliente")]
pub enum ClientStatus {
    #[sqlx(rename = "activo")]
    Active,
    #[sqlx(rename = "inactivo")]
    Inactive,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "estado_cancha")]
pub enum CourtStatus {
    #[sqlx(rename = "activa")]
    Active,
    #[sqlx(rename = "inactiva")]
    Inactive,
    #[sqlx(rename = "mantenimiento")]
    Maintenance,
}

impl CourtStatus {
    /// Only active courts can take new bookings.
    pub fn accepts_bookings(&self) -> bool {
        matches!(self, CourtStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CourtStatus::Active => "active",
            CourtStatus::Inactive => "inactive",
            CourtStatus::Maintenance => "maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "metodo_pago")]
pub enum PaymentMethod {
    #[sqlx(rename = "efectivo")]
    Cash,
    #[sqlx(rename = "tarjeta_credito")]
    CreditCard,
    #[sqlx(rename = "tarjeta_debito")]
    DebitCard,
    #[sqlx(rename = "transferencia")]
    Transfer,
    #[sqlx(rename = "cheque")]
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Cheque => "cheque",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "estado_pago")]
pub enum PaymentStatus {
    #[sqlx(rename = "pendiente")]
    Pending,
    #[sqlx(rename = "completado")]
    Completed,
    #[sqlx(rename = "cancelado")]
    Cancelled,
    #[sqlx(rename = "reembolsado")]
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// The kind of administrative action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "tipo_accion", rename_all = "UPPERCASE")]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
    Cancel,
    Login,
    Logout,
    Validate,
    Clean,
    Backup,
    Purge,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Insert => "INSERT",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Cancel => "CANCEL",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::Validate => "VALIDATE",
            AuditAction::Clean => "CLEAN",
            AuditAction::Backup => "BACKUP",
            AuditAction::Purge => "PURGE",
        }
    }
}

/// Application roles. Each maps one-to-one to a PostgreSQL login role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Operator, Role::Viewer];

    /// The PostgreSQL role name backing this application role.
    pub fn pg_role(&self) -> &'static str {
        match self {
            Role::Admin => "admin_reservas",
            Role::Operator => "operador_reservas",
            Role::Viewer => "consultor_reservas",
        }
    }

    pub fn from_pg_role(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.pg_role() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Viewer => "viewer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Areas of the application guarded by the permission map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Clients,
    Bookings,
    Courts,
    Payments,
    Reports,
    Users,
    Audit,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Clients,
        Resource::Bookings,
        Resource::Courts,
        Resource::Payments,
        Resource::Reports,
        Resource::Users,
        Resource::Audit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Clients => "clients",
            Resource::Bookings => "bookings",
            Resource::Courts => "courts",
            Resource::Payments => "payments",
            Resource::Reports => "reports",
            Resource::Users => "users",
            Resource::Audit => "audit",
        }
    }
}

/// Tables covered by validation, cleanup and backup runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintainedTable {
    Clients,
    Courts,
    Bookings,
    Payments,
    Users,
}

impl MaintainedTable {
    pub const ALL: [MaintainedTable; 5] = [
        MaintainedTable::Clients,
        MaintainedTable::Courts,
        MaintainedTable::Bookings,
        MaintainedTable::Payments,
        MaintainedTable::Users,
    ];

    /// The physical table name. Only these literals are ever interpolated into SQL.
    pub fn table_name(&self) -> &'static str {
        match self {
            MaintainedTable::Clients => "clientes",
            MaintainedTable::Courts => "canchas",
            MaintainedTable::Bookings => "reservas",
            MaintainedTable::Payments => "pagos",
            MaintainedTable::Users => "usuarios",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintainedTable::Clients => "clients",
            MaintainedTable::Courts => "courts",
            MaintainedTable::Bookings => "bookings",
            MaintainedTable::Payments => "payments",
            MaintainedTable::Users => "users",
        }
    }

    /// The permission area that guards maintenance on this table.
    pub fn resource(&self) -> Resource {
        match self {
            MaintainedTable::Clients => Resource::Clients,
            MaintainedTable::Courts => Resource::Courts,
            MaintainedTable::Bookings => Resource::Bookings,
            MaintainedTable::Payments => Resource::Payments,
            MaintainedTable::Users => Resource::Users,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceMode {
    Validate,
    Clean,
    Backup,
}

impl MaintenanceMode {
    /// Validation only reads, cleanup rewrites rows, backup creates a table.
    pub fn operation(&self) -> Operation {
        match self {
            MaintenanceMode::Validate => Operation::Read,
            MaintenanceMode::Clean => Operation::Update,
            MaintenanceMode::Backup => Operation::Create,
        }
    }

    pub fn audit_action(&self) -> AuditAction {
        match self {
            MaintenanceMode::Validate => AuditAction::Validate,
            MaintenanceMode::Clean => AuditAction::Clean,
            MaintenanceMode::Backup => AuditAction::Backup,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceMode::Validate => "validate",
            MaintenanceMode::Clean => "clean",
            MaintenanceMode::Backup => "backup",
        }
    }
}

// --- Display / FromStr ---
// The textual forms match the serde representation so that CLI arguments,
// query strings and JSON bodies all accept the same spelling.

macro_rules! text_enum {
    ($ty:ident, $what:literal, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                [$($ty::$variant),+]
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| CoreError::UnknownVariant($what, s.to_string()))
            }
        }
    };
}

text_enum!(BookingStatus, "booking status", [Pending, Confirmed, Cancelled, Completed]);
text_enum!(ClientStatus, "client status", [Active, Inactive]);
text_enum!(CourtStatus, "court status", [Active, Inactive, Maintenance]);
text_enum!(PaymentMethod, "payment method", [Cash, CreditCard, DebitCard, Transfer, Cheque]);
text_enum!(PaymentStatus, "payment status", [Pending, Completed, Cancelled, Refunded]);
text_enum!(AuditAction, "audit action", [Insert, Update, Delete, Cancel, Login, Logout, Validate, Clean, Backup, Purge]);
text_enum!(Role, "role", [Admin, Operator, Viewer]);
text_enum!(Operation, "operation", [Create, Read, Update, Delete]);
text_enum!(Resource, "resource", [Clients, Bookings, Courts, Payments, Reports, Users, Audit]);
text_enum!(MaintainedTable, "table", [Clients, Courts, Bookings, Payments, Users]);
text_enum!(MaintenanceMode, "maintenance mode", [Validate, Clean, Backup]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_and_confirmed_block_a_slot() {
        assert!(BookingStatus::Pending.blocks_availability());
        assert!(BookingStatus::Confirmed.blocks_availability());
        assert!(!BookingStatus::Cancelled.blocks_availability());
        assert!(!BookingStatus::Completed.blocks_availability());
    }

    #[test]
    fn terminal_statuses_do_not_transition() {
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Completed.can_transition_to(BookingStatus::Cancelled));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Pending));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Completed));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert_eq!("credit_card".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
        assert!("bogus".parse::<MaintenanceMode>().is_err());
    }

    #[test]
    fn roles_round_trip_through_pg_names() {
        for role in Role::ALL {
            assert_eq!(Role::from_pg_role(role.pg_role()), Some(role));
        }
        assert_eq!(Role::from_pg_role("postgres"), None);
    }

    #[test]
    fn maintenance_needs_the_permission_matching_its_mode() {
        assert_eq!(MaintenanceMode::Validate.operation(), Operation::Read);
        assert_eq!(MaintenanceMode::Clean.operation(), Operation::Update);
        assert_eq!(MaintenanceMode::Backup.operation(), Operation::Create);
        assert_eq!(MaintainedTable::Users.resource(), Resource::Users);
    }
}
