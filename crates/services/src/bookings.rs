use crate::error::ServiceError;
use crate::local_today;
use availability::{TimeRange, fits_within, free_slots};
use chrono::{Duration, NaiveDate};
use configuration::BookingRules;
use core_types::{
    Booking, BookingSlot, BookingStatus, BookingUpdate, Client, ClientStatus, Court, NewBooking,
    Page, PageRequest,
};
use database::{BookingFilter, DateRange, DbRepository};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

const DEFAULT_CANCEL_REASON: &str = "no reason given";

/// A purge may remove bookings up to, not including, `today`.
pub fn check_purge_cutoff(cutoff: NaiveDate, today: NaiveDate) -> Result<(), ServiceError> {
    if cutoff > today {
        return Err(ServiceError::validation("purge cutoff cannot be in the future"));
    }
    Ok(())
}

/// Checks a requested booking against the configured business rules.
/// Returns the validated time range.
pub fn check_request(
    rules: &BookingRules,
    booking: &NewBooking,
    today: NaiveDate,
) -> Result<TimeRange, ServiceError> {
    let range = TimeRange::new(booking.start_time, booking.end_time)
        .map_err(|_| ServiceError::validation("end time must be after start time"))?;

    if booking.date < today {
        return Err(ServiceError::validation("cannot book a date in the past"));
    }
    if booking.date > today + Duration::days(rules.max_days_ahead) {
        return Err(ServiceError::validation(format!(
            "bookings can be made at most {} days ahead",
            rules.max_days_ahead
        )));
    }
    if booking.start_time < rules.earliest_start || booking.end_time > rules.latest_end {
        return Err(ServiceError::validation(format!(
            "bookings must fall between {} and {}",
            rules.earliest_start.format("%H:%M"),
            rules.latest_end.format("%H:%M")
        )));
    }
    let minutes = range.duration_minutes();
    if minutes < rules.min_duration_minutes || minutes > rules.max_duration_minutes {
        return Err(ServiceError::validation(format!(
            "duration must be between {} and {} minutes",
            rules.min_duration_minutes, rules.max_duration_minutes
        )));
    }
    Ok(range)
}

pub fn check_client(client: &Client) -> Result<(), ServiceError> {
    if client.status != ClientStatus::Active {
        return Err(ServiceError::validation(format!(
            "client {} is inactive",
            client.full_name()
        )));
    }
    Ok(())
}

pub fn check_court(court: &Court, requested: &TimeRange) -> Result<(), ServiceError> {
    if !court.status.accepts_bookings() {
        return Err(ServiceError::validation(format!(
            "court '{}' is {} and does not accept bookings",
            court.name, court.status
        )));
    }
    let open = TimeRange::new(court.opens_at, court.closes_at)?;
    if !fits_within(&open, requested) {
        return Err(ServiceError::validation(format!(
            "court '{}' is only open from {} to {}",
            court.name,
            court.opens_at.format("%H:%M"),
            court.closes_at.format("%H:%M")
        )));
    }
    Ok(())
}

/// The part of the day a court can actually be booked: its opening hours,
/// narrowed to the global booking window. `None` when they do not intersect.
pub fn bookable_window(court: &Court, rules: &BookingRules) -> Option<TimeRange> {
    let start = court.opens_at.max(rules.earliest_start);
    let end = court.closes_at.min(rules.latest_end);
    TimeRange::new(start, end).ok()
}

/// Whether a slot is free, and if not, what is in the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityReport {
    pub available: bool,
    pub conflicts: Vec<BookingSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookingStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Sum of the price of every booking that was not cancelled.
    pub revenue: Decimal,
    pub average_price: Decimal,
    pub total_hours: Decimal,
}

pub fn summarize(bookings: &[Booking]) -> BookingStats {
    let mut stats = BookingStats {
        total: bookings.len(),
        ..BookingStats::default()
    };
    for status in BookingStatus::ALL {
        stats.by_status.insert(status.to_string(), 0);
    }

    let mut billable = 0usize;
    for booking in bookings {
        *stats.by_status.entry(booking.status.to_string()).or_default() += 1;
        if booking.status != BookingStatus::Cancelled {
            billable += 1;
            stats.revenue += booking.total_price;
            stats.total_hours += booking.duration_hours;
        }
    }
    if billable > 0 {
        stats.average_price = (stats.revenue / Decimal::from(billable)).round_dp(2);
    }
    stats
}

#[derive(Debug, Clone)]
pub struct BookingService {
    repo: DbRepository,
    rules: BookingRules,
}

impl BookingService {
    pub fn new(repo: DbRepository, rules: BookingRules) -> Self {
        Self { repo, rules }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    // Business checks that need the client and court rows.
    async fn check_parties(&self, booking: &NewBooking, range: &TimeRange) -> Result<(), ServiceError> {
        let client = self.repo.get_client(booking.client_id).await?;
        check_client(&client)?;
        let court = self.repo.get_court(booking.court_id).await?;
        check_court(&court, range)
    }

    /// Validates and stores a new pending booking.
    pub async fn create(&self, booking: &NewBooking, actor: &str) -> Result<Booking, ServiceError> {
        let range = check_request(&self.rules, booking, local_today())?;
        self.check_parties(booking, &range).await?;
        Ok(self.repo.create_booking(booking, actor).await?)
    }

    /// Full edit. Bookings that keep holding their slot are re-validated as if new;
    /// closing a booking (cancelled or completed) only needs a well-formed range.
    pub async fn update(&self, id: i32, update: &BookingUpdate, actor: &str) -> Result<Booking, ServiceError> {
        if update.status.blocks_availability() {
            let range = check_request(&self.rules, &update.fields, local_today())?;
            self.check_parties(&update.fields, &range).await?;
        } else {
            TimeRange::new(update.fields.start_time, update.fields.end_time)
                .map_err(|_| ServiceError::validation("end time must be after start time"))?;
        }
        Ok(self.repo.update_booking(id, update, actor).await?)
    }

    pub async fn change_status(
        &self,
        id: i32,
        status: BookingStatus,
        actor: &str,
    ) -> Result<Booking, ServiceError> {
        let current = self.repo.get_booking(id).await?;
        if !current.status.can_transition_to(status) {
            return Err(ServiceError::validation(format!(
                "booking {} cannot move from {} to {}",
                id, current.status, status
            )));
        }
        Ok(self.repo.set_booking_status(id, status, actor).await?)
    }

    /// Cancels a booking. Already cancelled or completed bookings are rejected.
    pub async fn cancel(&self, id: i32, reason: Option<&str>, actor: &str) -> Result<Booking, ServiceError> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_CANCEL_REASON);
        Ok(self.repo.cancel_booking(id, reason, actor).await?)
    }

    pub async fn get(&self, id: i32) -> Result<Booking, ServiceError> {
        Ok(self.repo.get_booking(id).await?)
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Booking>, ServiceError> {
        Ok(self.repo.list_bookings(page).await?)
    }

    pub async fn active(&self) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.repo.list_active_bookings().await?)
    }

    pub async fn on(&self, date: NaiveDate) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.repo.bookings_on(date).await?)
    }

    pub async fn for_client(&self, client_id: i32) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.repo.bookings_for_client(client_id).await?)
    }

    pub async fn for_court(&self, court_id: i32) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.repo.bookings_for_court(court_id).await?)
    }

    pub async fn filter(&self, filter: &BookingFilter) -> Result<Vec<Booking>, ServiceError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(ServiceError::validation("'from' must not be after 'to'"));
            }
        }
        Ok(self.repo.filter_bookings(filter).await?)
    }

    pub async fn check_availability(
        &self,
        court_id: i32,
        date: NaiveDate,
        requested: TimeRange,
        exclude_id: Option<i32>,
    ) -> Result<AvailabilityReport, ServiceError> {
        let conflicts = self
            .repo
            .booking_conflicts(court_id, date, requested, exclude_id)
            .await?;
        Ok(AvailabilityReport {
            available: conflicts.is_empty(),
            conflicts,
        })
    }

    /// Free fixed-size slots of a court on `date`. Courts that do not accept
    /// bookings have none.
    pub async fn free_slots(&self, court_id: i32, date: NaiveDate) -> Result<Vec<TimeRange>, ServiceError> {
        let court = self.repo.get_court(court_id).await?;
        if !court.status.accepts_bookings() {
            return Ok(Vec::new());
        }
        let Some(window) = bookable_window(&court, &self.rules) else {
            return Ok(Vec::new());
        };
        let existing = self.repo.booking_slots(court_id, date).await?;
        Ok(free_slots(&existing, window, self.rules.slot_minutes)?)
    }

    pub async fn stats(&self, range: DateRange) -> Result<BookingStats, ServiceError> {
        let bookings = self
            .filter(&BookingFilter {
                from: range.from,
                to: range.to,
                ..BookingFilter::default()
            })
            .await?;
        Ok(summarize(&bookings))
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.repo.list_bookings(PageRequest::new(1, limit)).await?.items)
    }

    /// Deletes bookings dated before `cutoff`. The cutoff cannot be in the future.
    pub async fn purge_before(&self, cutoff: NaiveDate, actor: &str) -> Result<u64, ServiceError> {
        check_purge_cutoff(cutoff, local_today())?;
        Ok(self.repo.purge_bookings_before(cutoff, actor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Utc};
    use core_types::CourtStatus;
    use rust_decimal_macros::dec;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn request(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> NewBooking {
        NewBooking {
            client_id: 1,
            court_id: 1,
            date,
            start_time: start,
            end_time: end,
            notes: None,
        }
    }

    fn court(status: CourtStatus) -> Court {
        Court {
            id: 1,
            name: "Central".into(),
            court_type_id: None,
            court_type_name: None,
            sport: "tenis".into(),
            capacity: 4,
            price_per_hour: dec!(20),
            status,
            opens_at: t(8, 0),
            closes_at: t(21, 0),
            description: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn booking(status: BookingStatus, total: Decimal, hours: Decimal) -> Booking {
        Booking {
            id: 1,
            client_id: 1,
            client_first_name: "Ana".into(),
            client_last_name: "Pérez".into(),
            court_id: 1,
            court_name: "Central".into(),
            court_type: None,
            date: today(),
            start_time: t(10, 0),
            end_time: t(11, 0),
            duration_hours: hours,
            status,
            notes: None,
            price_per_hour: dec!(20),
            total_price: total,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn accepts_a_regular_request() {
        let rules = BookingRules::default();
        let range = check_request(&rules, &request(today(), t(14, 0), t(15, 30)), today()).unwrap();
        assert_eq!(range.duration_minutes(), 90);
    }

    #[test]
    fn rejects_past_and_far_future_dates() {
        let rules = BookingRules::default();
        let yesterday = today().pred_opt().unwrap();
        assert!(check_request(&rules, &request(yesterday, t(10, 0), t(11, 0)), today()).is_err());

        let limit = today() + Duration::days(rules.max_days_ahead);
        assert!(check_request(&rules, &request(limit, t(10, 0), t(11, 0)), today()).is_ok());
        let beyond = limit.succ_opt().unwrap();
        assert!(check_request(&rules, &request(beyond, t(10, 0), t(11, 0)), today()).is_err());
    }

    #[test]
    fn enforces_the_daily_window_and_duration() {
        let rules = BookingRules::default();
        // Before 06:00.
        assert!(check_request(&rules, &request(today(), t(5, 30), t(7, 0)), today()).is_err());
        // Past 23:00.
        assert!(check_request(&rules, &request(today(), t(22, 30), t(23, 30)), today()).is_err());
        // Ends exactly at the limit.
        assert!(check_request(&rules, &request(today(), t(22, 0), t(23, 0)), today()).is_ok());
        // Too short and too long.
        assert!(check_request(&rules, &request(today(), t(10, 0), t(10, 15)), today()).is_err());
        assert!(check_request(&rules, &request(today(), t(8, 0), t(12, 30)), today()).is_err());
        // Inverted.
        assert!(check_request(&rules, &request(today(), t(11, 0), t(10, 0)), today()).is_err());
    }

    #[test]
    fn court_must_be_active_and_open() {
        let inside = TimeRange::new(t(9, 0), t(10, 0)).unwrap();
        assert!(check_court(&court(CourtStatus::Active), &inside).is_ok());
        assert!(check_court(&court(CourtStatus::Maintenance), &inside).is_err());
        assert!(check_court(&court(CourtStatus::Inactive), &inside).is_err());

        let late = TimeRange::new(t(20, 30), t(21, 30)).unwrap();
        assert!(check_court(&court(CourtStatus::Active), &late).is_err());
    }

    #[test]
    fn bookable_window_intersects_court_hours_with_rules() {
        let rules = BookingRules {
            earliest_start: t(9, 0),
            ..BookingRules::default()
        };
        let window = bookable_window(&court(CourtStatus::Active), &rules).unwrap();
        assert_eq!(window.start(), t(9, 0));
        assert_eq!(window.end(), t(21, 0));

        let rules = BookingRules {
            earliest_start: t(21, 0),
            latest_end: t(23, 0),
            ..BookingRules::default()
        };
        assert!(bookable_window(&court(CourtStatus::Active), &rules).is_none());
    }

    #[test]
    fn summary_ignores_cancelled_revenue() {
        let bookings = vec![
            booking(BookingStatus::Confirmed, dec!(20), dec!(1)),
            booking(BookingStatus::Completed, dec!(30), dec!(1.5)),
            booking(BookingStatus::Cancelled, dec!(40), dec!(2)),
        ];
        let stats = summarize(&bookings);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.revenue, dec!(50));
        assert_eq!(stats.average_price, dec!(25));
        assert_eq!(stats.total_hours, dec!(2.5));
        assert_eq!(stats.by_status["cancelled"], 1);
        assert_eq!(stats.by_status["pending"], 0);
    }

    #[test]
    fn empty_summary_has_zero_average() {
        let stats = summarize(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_price, Decimal::ZERO);
    }

    #[test]
    fn yesterday_on_the_local_clock_is_in_the_past() {
        let rules = BookingRules::default();
        let today = local_today();
        let yesterday = today.pred_opt().unwrap();
        assert!(check_request(&rules, &request(yesterday, t(10, 0), t(11, 0)), today).is_err());
        assert!(check_request(&rules, &request(today, t(10, 0), t(11, 0)), today).is_ok());
    }

    #[test]
    fn purge_accepts_today_but_not_tomorrow() {
        let today = local_today();
        assert!(check_purge_cutoff(today, today).is_ok());
        assert!(check_purge_cutoff(today.pred_opt().unwrap(), today).is_ok());
        assert!(matches!(
            check_purge_cutoff(today.succ_opt().unwrap(), today),
            Err(ServiceError::Validation(_))
        ));
    }
}
