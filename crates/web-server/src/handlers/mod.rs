//! HTTP handlers, one module per area. Every handler except login and health
//! takes a [`CurrentSession`](crate::auth::CurrentSession) and checks the
//! permission map before calling into the services.

pub mod admin;
pub mod bookings;
pub mod clients;
pub mod courts;
pub mod payments;
pub mod reports;
pub mod session;

use chrono::NaiveDate;
use database::DateRange;
use serde::Deserialize;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl From<RangeQuery> for DateRange {
    fn from(q: RangeQuery) -> Self {
        DateRange::new(q.from, q.to)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}
