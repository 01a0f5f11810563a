//! # Courtbook Services
//!
//! Business rules on top of the repository: input validation and normalisation,
//! booking policy, payment checks, login and permissions, maintenance runs and
//! reports. Handlers and the CLI call these services; they never talk to the
//! repository for writes directly.

pub mod auth;
pub mod bookings;
pub mod clients;
pub mod courts;
pub mod error;
pub mod maintenance;
pub mod payments;
pub mod reports;

pub use auth::{AuthManager, Session, permits};
pub use bookings::{AvailabilityReport, BookingService, BookingStats};
pub use clients::ClientService;
pub use courts::CourtService;
pub use error::ServiceError;
pub use maintenance::{MaintenanceOutcome, MaintenanceService, TableOutcome};
pub use payments::PaymentService;
pub use reports::{Dashboard, ReportService};

use chrono::NaiveDate;
use configuration::settings::Config;
use database::DbRepository;

/// Today's date on the server's local clock. Every "not in the past" rule uses
/// this, matching `CURRENT_DATE` in the database session.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// All services, wired to one repository and one configuration.
#[derive(Debug, Clone)]
pub struct Services {
    pub clients: ClientService,
    pub courts: CourtService,
    pub bookings: BookingService,
    pub payments: PaymentService,
    pub auth: AuthManager,
    pub maintenance: MaintenanceService,
    pub reports: ReportService,
}

impl Services {
    pub fn new(repo: DbRepository, config: &Config) -> Self {
        Self {
            clients: ClientService::new(repo.clone()),
            courts: CourtService::new(repo.clone()),
            bookings: BookingService::new(repo.clone(), config.booking.clone()),
            payments: PaymentService::new(repo.clone(), config.payments.clone()),
            auth: AuthManager::new(
                repo.clone(),
                config.database.clone(),
                config.server.session_ttl_minutes,
            ),
            maintenance: MaintenanceService::new(repo.clone()),
            reports: ReportService::new(repo),
        }
    }
}
