use crate::error::AvailabilityError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` range of clock time within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, AvailabilityError> {
        if end <= start {
            return Err(AvailabilityError::EmptyRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from minutes since midnight.
    pub fn from_minutes(start: u32, end: u32) -> Result<Self, AvailabilityError> {
        let to_time = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0);
        match (to_time(start), to_time(end)) {
            (Some(s), Some(e)) => Self::new(s, e),
            _ => Err(AvailabilityError::EmptyRange {
                start: NaiveTime::MIN,
                end: NaiveTime::MIN,
            }),
        }
    }

    pub(crate) fn from_parts_unchecked(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn start_minute(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    pub fn end_minute(&self) -> u32 {
        self.end.hour() * 60 + self.end.minute()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open intersection: touching boundaries do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// `true` when `inner` lies entirely inside `self` (boundaries included).
    pub fn contains(&self, inner: &TimeRange) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }
}

/// `true` when the requested range lies inside the court's opening hours.
pub fn fits_within(window: &TimeRange, requested: &TimeRange) -> bool {
    window.contains(requested)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(TimeRange::new(t(10, 0), t(10, 0)).is_err());
        assert!(TimeRange::new(t(11, 0), t(10, 0)).is_err());
    }

    #[test]
    fn touching_ranges_do_not_overlap() {
        let a = TimeRange::new(t(14, 0), t(15, 0)).unwrap();
        let b = TimeRange::new(t(15, 0), t(16, 0)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn one_shared_minute_overlaps() {
        let a = TimeRange::new(t(14, 0), t(15, 0)).unwrap();
        let b = TimeRange::new(t(14, 59), t(16, 0)).unwrap();
        assert!(a.overlaps(&b));
    }

    #[test]
    fn duration_and_minutes() {
        let r = TimeRange::from_minutes(6 * 60, 7 * 60 + 30).unwrap();
        assert_eq!(r.duration_minutes(), 90);
        assert_eq!(r.start(), t(6, 0));
        assert_eq!(r.end_minute(), 450);
    }

    #[test]
    fn opening_hours_containment() {
        let window = TimeRange::new(t(8, 0), t(22, 0)).unwrap();
        assert!(fits_within(&window, &TimeRange::new(t(8, 0), t(9, 0)).unwrap()));
        assert!(fits_within(&window, &TimeRange::new(t(21, 0), t(22, 0)).unwrap()));
        assert!(!fits_within(&window, &TimeRange::new(t(7, 30), t(8, 30)).unwrap()));
        assert!(!fits_within(&window, &TimeRange::new(t(21, 30), t(22, 30)).unwrap()));
    }
}
