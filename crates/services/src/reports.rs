use crate::error::ServiceError;
use chrono::{DateTime, Utc};
use core_types::Booking;
use database::{
    ClientRanking, CourtRanking, DateRange, DbRepository, GeneralStats, HourlyStat, MonthlyStat,
    PaymentStats, StatusCount, WeekdayStat,
};
use serde::Serialize;

const DASHBOARD_UPCOMING: usize = 10;

/// Everything the landing page shows, gathered in one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub general: GeneralStats,
    pub bookings_by_status: Vec<StatusCount>,
    pub upcoming: Vec<Booking>,
    pub payments: PaymentStats,
    pub generated_at: DateTime<Utc>,
}

fn check_range(range: &DateRange) -> Result<(), ServiceError> {
    match (range.from, range.to) {
        (Some(from), Some(to)) if from > to => {
            Err(ServiceError::validation("'from' must not be after 'to'"))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct ReportService {
    repo: DbRepository,
}

impl ReportService {
    pub fn new(repo: DbRepository) -> Self {
        Self { repo }
    }

    pub async fn dashboard(&self, range: DateRange) -> Result<Dashboard, ServiceError> {
        check_range(&range)?;
        let (general, bookings_by_status, mut upcoming, payments) = tokio::try_join!(
            self.repo.general_stats(range),
            self.repo.bookings_by_status(range),
            self.repo.list_active_bookings(),
            self.repo.payment_stats(range),
        )?;
        upcoming.truncate(DASHBOARD_UPCOMING);
        Ok(Dashboard {
            general,
            bookings_by_status,
            upcoming,
            payments,
            generated_at: Utc::now(),
        })
    }

    pub async fn general(&self, range: DateRange) -> Result<GeneralStats, ServiceError> {
        check_range(&range)?;
        Ok(self.repo.general_stats(range).await?)
    }

    pub async fn by_status(&self, range: DateRange) -> Result<Vec<StatusCount>, ServiceError> {
        check_range(&range)?;
        Ok(self.repo.bookings_by_status(range).await?)
    }

    pub async fn monthly(&self, year: Option<i32>) -> Result<Vec<MonthlyStat>, ServiceError> {
        Ok(self.repo.monthly_stats(year).await?)
    }

    pub async fn top_clients(&self, range: DateRange, limit: i64) -> Result<Vec<ClientRanking>, ServiceError> {
        check_range(&range)?;
        Ok(self.repo.top_clients(range, limit).await?)
    }

    pub async fn top_courts(&self, range: DateRange, limit: i64) -> Result<Vec<CourtRanking>, ServiceError> {
        check_range(&range)?;
        Ok(self.repo.top_courts(range, limit).await?)
    }

    pub async fn hourly(&self, range: DateRange) -> Result<Vec<HourlyStat>, ServiceError> {
        check_range(&range)?;
        Ok(self.repo.hourly_stats(range).await?)
    }

    pub async fn weekday(&self, range: DateRange) -> Result<Vec<WeekdayStat>, ServiceError> {
        check_range(&range)?;
        Ok(self.repo.weekday_stats(range).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn inverted_ranges_are_rejected() {
        let a = NaiveDate::from_ymd_opt(2026, 1, 1);
        let b = NaiveDate::from_ymd_opt(2026, 2, 1);
        assert!(check_range(&DateRange::new(a, b)).is_ok());
        assert!(check_range(&DateRange::new(a, a)).is_ok());
        assert!(check_range(&DateRange::new(None, b)).is_ok());
        assert!(check_range(&DateRange::new(b, a)).is_err());
    }
}
