use crate::error::ServiceError;
use crate::local_today;
use chrono::{Datelike, NaiveDate};
use core_types::{Client, ClientUpdate, NewClient, Page, PageRequest};
use database::{ClientStats, DbRepository};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid e-mail regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d+$").expect("valid phone regex"));

const MIN_PHONE_DIGITS: usize = 7;
const MAX_AGE_YEARS: i32 = 120;

pub fn validate_email(email: &str) -> Result<String, ServiceError> {
    let email = email.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(ServiceError::validation(format!("invalid e-mail address '{}'", email)))
    }
}

/// Strips spaces, dashes and parentheses, then requires an optional leading `+`
/// followed by at least seven digits. Blank input means "no phone".
pub fn normalize_phone(phone: Option<&str>) -> Result<Option<String>, ServiceError> {
    let Some(raw) = phone else {
        return Ok(None);
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    let digits = cleaned.chars().filter(|c| c.is_ascii_digit()).count();
    if !PHONE_RE.is_match(&cleaned) || digits < MIN_PHONE_DIGITS {
        return Err(ServiceError::validation(format!("invalid phone number '{}'", raw)));
    }
    Ok(Some(cleaned))
}

pub fn validate_birth_date(birth_date: Option<NaiveDate>, today: NaiveDate) -> Result<(), ServiceError> {
    let Some(date) = birth_date else {
        return Ok(());
    };
    if date > today {
        return Err(ServiceError::validation("birth date cannot be in the future"));
    }
    let oldest = today
        .with_year(today.year() - MAX_AGE_YEARS)
        // 29 February has no counterpart in most years.
        .or_else(|| today.pred_opt()?.with_year(today.year() - MAX_AGE_YEARS))
        .unwrap_or(NaiveDate::MIN);
    if date < oldest {
        return Err(ServiceError::validation(format!(
            "birth date cannot be more than {} years ago",
            MAX_AGE_YEARS
        )));
    }
    Ok(())
}

/// Validates a client and returns it with trimmed names, a lowercased e-mail and
/// a cleaned phone number.
pub fn normalize_client(client: &NewClient, today: NaiveDate) -> Result<NewClient, ServiceError> {
    let first_name = client.first_name.trim();
    let last_name = client.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(ServiceError::validation("first and last name are required"));
    }
    validate_birth_date(client.birth_date, today)?;
    Ok(NewClient {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        phone: normalize_phone(client.phone.as_deref())?,
        email: validate_email(&client.email)?,
        birth_date: client.birth_date,
    })
}

#[derive(Debug, Clone)]
pub struct ClientService {
    repo: DbRepository,
}

impl ClientService {
    pub fn new(repo: DbRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, client: &NewClient, actor: &str) -> Result<Client, ServiceError> {
        let client = normalize_client(client, local_today())?;
        Ok(self.repo.create_client(&client, actor).await?)
    }

    pub async fn get(&self, id: i32) -> Result<Client, ServiceError> {
        Ok(self.repo.get_client(id).await?)
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Client>, ServiceError> {
        Ok(self.repo.list_clients(page).await?)
    }

    pub async fn list_active(&self) -> Result<Vec<Client>, ServiceError> {
        Ok(self.repo.list_active_clients().await?)
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Client>, ServiceError> {
        if term.trim().is_empty() {
            return Err(ServiceError::validation("search term cannot be empty"));
        }
        Ok(self.repo.search_clients(term).await?)
    }

    pub async fn update(&self, id: i32, update: &ClientUpdate, actor: &str) -> Result<Client, ServiceError> {
        let fields = normalize_client(&update.fields, local_today())?;
        let update = ClientUpdate { fields, status: update.status };
        Ok(self.repo.update_client(id, &update, actor).await?)
    }

    pub async fn delete(&self, id: i32, actor: &str) -> Result<(), ServiceError> {
        Ok(self.repo.delete_client(id, actor).await?)
    }

    pub async fn stats(&self) -> Result<ClientStats, ServiceError> {
        Ok(self.repo.client_stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn client() -> NewClient {
        NewClient {
            first_name: "  Ana ".into(),
            last_name: "Pérez".into(),
            phone: Some("(0991) 234-567".into()),
            email: " Ana.Perez@Example.COM ".into(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 2),
        }
    }

    #[test]
    fn normalizes_a_valid_client() {
        let normalized = normalize_client(&client(), today()).unwrap();
        assert_eq!(normalized.first_name, "Ana");
        assert_eq!(normalized.email, "ana.perez@example.com");
        assert_eq!(normalized.phone.as_deref(), Some("0991234567"));
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["", "ana", "ana@", "ana@example", "ana@example.c", "a b@example.com"] {
            assert!(validate_email(email).is_err(), "{email} should be rejected");
        }
        assert!(validate_email("a+b_c%d@sub.example.org").is_ok());
    }

    #[test]
    fn phone_rules() {
        assert_eq!(normalize_phone(None).unwrap(), None);
        assert_eq!(normalize_phone(Some("   ")).unwrap(), None);
        assert_eq!(normalize_phone(Some("+593 99-123-4567")).unwrap().as_deref(), Some("+593991234567"));
        assert!(normalize_phone(Some("12345")).is_err());
        assert!(normalize_phone(Some("099x123456")).is_err());
        assert!(normalize_phone(Some("09+9123456")).is_err());
    }

    #[test]
    fn birth_date_bounds() {
        assert!(validate_birth_date(None, today()).is_ok());
        assert!(validate_birth_date(NaiveDate::from_ymd_opt(2026, 3, 15), today()).is_err());
        assert!(validate_birth_date(NaiveDate::from_ymd_opt(1906, 3, 14), today()).is_ok());
        assert!(validate_birth_date(NaiveDate::from_ymd_opt(1906, 3, 13), today()).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut c = client();
        c.last_name = "   ".into();
        assert!(matches!(normalize_client(&c, today()), Err(ServiceError::Validation(_))));
    }
}
