//! # Courtbook Database Crate
//!
//! This crate is the single gateway to PostgreSQL. Every other crate talks to the
//! database through `DbRepository`, never through raw SQL.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** all SQL, table names and column names live here. The Spanish
//!   schema is aliased to the English field names of the `core-types` structs.
//! - **Transactional writes:** every write commits together with its audit row.
//!   Booking writes lock the court row and re-run the availability check inside
//!   the transaction; an exclusion constraint in the schema backs this up.
//! - **Asynchronous & Pooled:** all operations are async and share a `PgPool`.
//!
//! ## Public API
//!
//! - `connect` / `connect_as`: the service pool, and a one-off connection with a
//!   user's own credentials (used for login).
//! - `run_migrations`: applies the embedded schema migrations.
//! - `DbRepository`: the data access methods, grouped per table.
//! - `DbError`: the error type returned by every function in this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_as, connect_lazy, disconnect, ping, run_migrations};
pub use error::DbError;
pub use repository::{
    AuditStat, BookingFilter, ClientRanking, ClientStats, CourtRanking, CourtStats, DateRange,
    DbIdentity, DbRepository, identity_on, GeneralStats, HourlyStat, MonthlyStat, PaymentStats, RoleMembership,
    RoleStat, RuleResult, StatusCount, TableBackup, TableCleanup, TableValidation, UserProfile, WeekdayStat,
};
