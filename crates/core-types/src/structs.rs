use crate::enums::{AuditAction, BookingStatus, ClientStatus, CourtStatus, PaymentMethod, PaymentStatus};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==============================================================================
// Clients
// ==============================================================================

/// Represents a row from the `clientes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: String,
    pub birth_date: Option<NaiveDate>,
    pub status: ClientStatus,
    pub registered_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub email: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientUpdate {
    #[serde(flatten)]
    pub fields: NewClient,
    pub status: ClientStatus,
}

// ==============================================================================
// Courts and court types
// ==============================================================================

/// Represents a row from the `tipos_cancha` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CourtType {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price_per_hour: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCourtType {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_per_hour: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// A court joined with the name of its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Court {
    pub id: i32,
    pub name: String,
    pub court_type_id: Option<i32>,
    pub court_type_name: Option<String>,
    pub sport: String,
    pub capacity: i32,
    pub price_per_hour: Decimal,
    pub status: CourtStatus,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or fully updating a court.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCourt {
    pub name: String,
    #[serde(default)]
    pub court_type_id: Option<i32>,
    pub sport: String,
    pub capacity: i32,
    pub price_per_hour: Decimal,
    #[serde(default = "default_court_status")]
    pub status: CourtStatus,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_court_status() -> CourtStatus {
    CourtStatus::Active
}

// ==============================================================================
// Bookings
// ==============================================================================

/// A booking joined with its client, court and court type, as listed to operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: i32,
    pub client_id: i32,
    pub client_first_name: String,
    pub client_last_name: String,
    pub court_id: i32,
    pub court_name: String,
    pub court_type: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Length of the booking in hours.
    pub duration_hours: Decimal,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub price_per_hour: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// The minimal projection of a booking that the availability engine works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BookingSlot {
    pub id: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub client_id: i32,
    pub court_id: i32,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A full edit of an existing booking. The slot is re-checked excluding the booking itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(flatten)]
    pub fields: NewBooking,
    pub status: BookingStatus,
}

// ==============================================================================
// Payments
// ==============================================================================

/// A payment joined with the name of the paying client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i32,
    pub booking_id: i32,
    pub client_id: i32,
    pub client_first_name: String,
    pub client_last_name: String,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub booking_id: i32,
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(default = "default_payment_status")]
    pub status: PaymentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Completed
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

// ==============================================================================
// Audit
// ==============================================================================

/// Represents a row from the append-only `auditoria` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id: i64,
    pub actor: String,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Option<i32>,
    pub details: Option<String>,
    pub outcome: String,
    pub ip_address: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub actor: String,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Option<i32>,
    pub details: Option<String>,
    pub outcome: String,
    pub ip_address: Option<String>,
}

impl NewAuditEntry {
    /// A successful action by `actor` on `table_name`.
    pub fn success(actor: &str, action: AuditAction, table_name: &str) -> Self {
        Self {
            actor: actor.to_string(),
            action,
            table_name: table_name.to_string(),
            record_id: None,
            details: None,
            outcome: "SUCCESS".to_string(),
            ip_address: None,
        }
    }

    pub fn record(mut self, record_id: i32) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.outcome = "ERROR".to_string();
        self
    }
}
