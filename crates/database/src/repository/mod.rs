//! Data access for every table of the court rental schema.
//!
//! `DbRepository` is split across one file per aggregate; each file adds an
//! `impl DbRepository` block. All SQL uses runtime-checked queries with the
//! Spanish column names aliased to the field names of the `core-types` structs.

mod audit;
mod bookings;
mod clients;
mod courts;
mod maintenance;
mod payments;
mod reports;
mod users;

pub use bookings::BookingFilter;
pub use clients::ClientStats;
pub use courts::CourtStats;
pub use maintenance::{RuleResult, TableBackup, TableCleanup, TableValidation};
pub use payments::PaymentStats;
pub use reports::{
    ClientRanking, CourtRanking, GeneralStats, HourlyStat, MonthlyStat, StatusCount, WeekdayStat,
};
pub use audit::AuditStat;
pub use users::{DbIdentity, RoleMembership, RoleStat, UserProfile, identity_on};

use chrono::NaiveDate;
use sqlx::postgres::PgPool;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// An inclusive date range used by the statistics and report queries.
/// `None` on either side leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self::default()
    }
}
