//! # Courtbook Core Types
//!
//! The shared vocabulary of the workspace: statuses, roles and the row types for
//! clients, courts, bookings, payments and audit entries. Every other crate
//! depends on this one and it depends on nothing of ours.

pub mod enums;
pub mod error;
pub mod pagination;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{
    AuditAction, BookingStatus, ClientStatus, CourtStatus, MaintainedTable, MaintenanceMode,
    Operation, PaymentMethod, PaymentStatus, Resource, Role,
};
pub use error::CoreError;
pub use pagination::{Page, PageRequest};
pub use structs::{
    AuditEntry, Booking, BookingSlot, BookingUpdate, Client, ClientUpdate, Court, CourtType,
    NewAuditEntry, NewBooking, NewClient, NewCourt, NewCourtType, NewPayment, Payment,
    PaymentUpdate,
};
