use crate::error::ConfigError;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Upper bound for `booking.max_days_ahead` (ten years).
pub const MAX_DAYS_AHEAD_LIMIT: i64 = 3650;
/// Upper bound for `server.session_ttl_minutes` (one week).
pub const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub booking: BookingRules,
    #[serde(default)]
    pub payments: PaymentRules,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Rejects settings that would make the application misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url (or DATABASE_URL) must be set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        self.server.validate()?;
        self.booking.validate()?;
        if self.payments.overcharge_tolerance_pct < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "payments.overcharge_tolerance_pct cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Connection settings for PostgreSQL.
///
/// `url` is the service account used for data access. `host`, `port` and `name`
/// are used to open short-lived connections with the credentials an operator
/// types at login, since application users are database roles.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_name() -> String {
    "sportcourt_reservations".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout() -> u64 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_application_name() -> String {
    "courtbook".to_string()
}

/// Where the HTTP API listens and how long a login stays valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub session_ttl_minutes: i64,
}

impl ServerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl_minutes <= 0 || self.session_ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(ConfigError::ValidationError(format!(
                "server.session_ttl_minutes must be between 1 and {}",
                MAX_SESSION_TTL_MINUTES
            )));
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            session_ttl_minutes: 480,
        }
    }
}

/// Business rules applied to every booking before it reaches the database.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BookingRules {
    /// No booking may start before this time of day.
    #[serde(deserialize_with = "time_of_day::deserialize")]
    pub earliest_start: NaiveTime,
    /// No booking may end after this time of day.
    #[serde(deserialize_with = "time_of_day::deserialize")]
    pub latest_end: NaiveTime,
    pub min_duration_minutes: i64,
    pub max_duration_minutes: i64,
    /// How far into the future a booking can be made.
    pub max_days_ahead: i64,
    /// Granularity of the free-slot listing.
    pub slot_minutes: u32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            earliest_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            latest_end: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
            min_duration_minutes: 30,
            max_duration_minutes: 240,
            max_days_ahead: 90,
            slot_minutes: 30,
        }
    }
}

impl BookingRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.earliest_start >= self.latest_end {
            return Err(ConfigError::ValidationError(
                "booking.earliest_start must be before booking.latest_end".to_string(),
            ));
        }
        if self.min_duration_minutes <= 0 || self.min_duration_minutes > self.max_duration_minutes {
            return Err(ConfigError::ValidationError(
                "booking durations must satisfy 0 < min_duration_minutes <= max_duration_minutes"
                    .to_string(),
            ));
        }
        if self.slot_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "booking.slot_minutes must be greater than 0".to_string(),
            ));
        }
        if !(0..=MAX_DAYS_AHEAD_LIMIT).contains(&self.max_days_ahead) {
            return Err(ConfigError::ValidationError(format!(
                "booking.max_days_ahead must be between 0 and {}",
                MAX_DAYS_AHEAD_LIMIT
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaymentRules {
    /// How far above the booking price a payment may go before a warning is logged.
    /// 10 means 10%.
    pub overcharge_tolerance_pct: Decimal,
}

impl Default for PaymentRules {
    fn default() -> Self {
        Self { overcharge_tolerance_pct: dec!(10) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            directory: None,
            file_prefix: "courtbook.log".to_string(),
        }
    }
}

/// Accepts `HH:MM` as well as `HH:MM:SS`.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time of day '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_booking_rules_are_valid() {
        assert!(BookingRules::default().validate().is_ok());
    }

    #[test]
    fn min_duration_above_max_is_rejected() {
        let rules = BookingRules {
            min_duration_minutes: 300,
            ..BookingRules::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn max_days_ahead_is_bounded() {
        let too_far = BookingRules { max_days_ahead: i64::MAX, ..BookingRules::default() };
        assert!(too_far.validate().is_err());
        let negative = BookingRules { max_days_ahead: -1, ..BookingRules::default() };
        assert!(negative.validate().is_err());
        let limit = BookingRules { max_days_ahead: MAX_DAYS_AHEAD_LIMIT, ..BookingRules::default() };
        assert!(limit.validate().is_ok());
    }

    #[test]
    fn session_ttl_must_be_positive_and_bounded() {
        assert!(ServerSettings::default().validate().is_ok());
        for ttl in [0, -5, MAX_SESSION_TTL_MINUTES + 1, i64::MAX] {
            let server = ServerSettings { session_ttl_minutes: ttl, ..ServerSettings::default() };
            assert!(server.validate().is_err(), "ttl {} accepted", ttl);
        }
    }

    #[test]
    fn zero_slot_size_is_rejected() {
        let rules = BookingRules { slot_minutes: 0, ..BookingRules::default() };
        assert!(rules.validate().is_err());
    }
}
