use crate::error::ServiceError;
use availability::TimeRange;
use chrono::NaiveDate;
use core_types::{Court, CourtStatus, CourtType, NewCourt, NewCourtType};
use database::{CourtStats, DbRepository};
use rust_decimal::Decimal;

pub fn normalize_court(court: &NewCourt) -> Result<NewCourt, ServiceError> {
    let name = court.name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("court name is required"));
    }
    let sport = court.sport.trim();
    if sport.is_empty() {
        return Err(ServiceError::validation("sport is required"));
    }
    if court.capacity <= 0 {
        return Err(ServiceError::validation("capacity must be greater than zero"));
    }
    if court.price_per_hour < Decimal::ZERO {
        return Err(ServiceError::validation("price per hour cannot be negative"));
    }
    if court.opens_at >= court.closes_at {
        return Err(ServiceError::validation("opening time must be before closing time"));
    }
    Ok(NewCourt {
        name: name.to_string(),
        sport: sport.to_string(),
        description: court
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        ..court.clone()
    })
}

pub fn normalize_court_type(court_type: &NewCourtType) -> Result<NewCourtType, ServiceError> {
    let name = court_type.name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("court type name is required"));
    }
    if court_type.price_per_hour < Decimal::ZERO {
        return Err(ServiceError::validation("price per hour cannot be negative"));
    }
    Ok(NewCourtType {
        name: name.to_string(),
        ..court_type.clone()
    })
}

#[derive(Debug, Clone)]
pub struct CourtService {
    repo: DbRepository,
}

impl CourtService {
    pub fn new(repo: DbRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, court: &NewCourt, actor: &str) -> Result<Court, ServiceError> {
        let court = normalize_court(court)?;
        Ok(self.repo.create_court(&court, actor).await?)
    }

    pub async fn get(&self, id: i32) -> Result<Court, ServiceError> {
        Ok(self.repo.get_court(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<Court>, ServiceError> {
        Ok(self.repo.list_courts().await?)
    }

    pub async fn list_active(&self) -> Result<Vec<Court>, ServiceError> {
        Ok(self.repo.list_active_courts().await?)
    }

    pub async fn by_sport(&self, sport: &str) -> Result<Vec<Court>, ServiceError> {
        Ok(self.repo.list_courts_by_sport(sport).await?)
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Court>, ServiceError> {
        if term.trim().is_empty() {
            return Err(ServiceError::validation("search term cannot be empty"));
        }
        Ok(self.repo.search_courts(term).await?)
    }

    pub async fn update(&self, id: i32, court: &NewCourt, actor: &str) -> Result<Court, ServiceError> {
        let court = normalize_court(court)?;
        Ok(self.repo.update_court(id, &court, actor).await?)
    }

    /// Existing bookings are kept when a court goes inactive or into maintenance;
    /// only new bookings are refused.
    pub async fn set_status(&self, id: i32, status: CourtStatus, actor: &str) -> Result<Court, ServiceError> {
        Ok(self.repo.set_court_status(id, status, actor).await?)
    }

    pub async fn delete(&self, id: i32, actor: &str) -> Result<(), ServiceError> {
        Ok(self.repo.delete_court(id, actor).await?)
    }

    pub async fn stats(&self) -> Result<CourtStats, ServiceError> {
        Ok(self.repo.court_stats().await?)
    }

    /// Active courts open for the whole range and free on `date`.
    pub async fn available(&self, date: NaiveDate, requested: TimeRange) -> Result<Vec<Court>, ServiceError> {
        Ok(self.repo.available_courts(date, requested).await?)
    }

    pub async fn create_type(&self, court_type: &NewCourtType, actor: &str) -> Result<CourtType, ServiceError> {
        let court_type = normalize_court_type(court_type)?;
        Ok(self.repo.create_court_type(&court_type, actor).await?)
    }

    pub async fn list_types(&self) -> Result<Vec<CourtType>, ServiceError> {
        Ok(self.repo.list_court_types().await?)
    }

    pub async fn get_type(&self, id: i32) -> Result<CourtType, ServiceError> {
        Ok(self.repo.get_court_type(id).await?)
    }

    pub async fn update_type(
        &self,
        id: i32,
        court_type: &NewCourtType,
        actor: &str,
    ) -> Result<CourtType, ServiceError> {
        let court_type = normalize_court_type(court_type)?;
        Ok(self.repo.update_court_type(id, &court_type, actor).await?)
    }

    pub async fn delete_type(&self, id: i32, actor: &str) -> Result<(), ServiceError> {
        Ok(self.repo.delete_court_type(id, actor).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use rust_decimal_macros::dec;

    fn court() -> NewCourt {
        NewCourt {
            name: " Cancha 1 ".into(),
            court_type_id: Some(1),
            sport: "padel".into(),
            capacity: 4,
            price_per_hour: dec!(25.00),
            status: CourtStatus::Active,
            opens_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            description: Some("   ".into()),
        }
    }

    #[test]
    fn trims_and_accepts_a_valid_court() {
        let normalized = normalize_court(&court()).unwrap();
        assert_eq!(normalized.name, "Cancha 1");
        assert_eq!(normalized.description, None);
        assert_eq!(normalized.capacity, 4);
    }

    #[test]
    fn rejects_bad_courts() {
        let mut c = court();
        c.capacity = 0;
        assert!(normalize_court(&c).is_err());

        let mut c = court();
        c.price_per_hour = dec!(-1);
        assert!(normalize_court(&c).is_err());

        let mut c = court();
        c.closes_at = c.opens_at;
        assert!(normalize_court(&c).is_err());
    }

    #[test]
    fn free_court_types_are_allowed() {
        let t = NewCourtType {
            name: "Community".into(),
            description: None,
            price_per_hour: Decimal::ZERO,
            active: true,
        };
        assert!(normalize_court_type(&t).is_ok());
    }
}
