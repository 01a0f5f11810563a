use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("End time {end} must be after start time {start}")]
    EmptyRange { start: NaiveTime, end: NaiveTime },

    #[error("Slot length must be at least one minute")]
    ZeroSlot,
}
