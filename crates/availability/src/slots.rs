use crate::error::AvailabilityError;
use crate::range::TimeRange;
use core_types::BookingSlot;

/// Splits `window` into consecutive slots of `slot_minutes` and returns the ones
/// no blocking booking overlaps.
///
/// A trailing piece shorter than `slot_minutes` is not offered.
pub fn free_slots(
    existing: &[BookingSlot],
    window: TimeRange,
    slot_minutes: u32,
) -> Result<Vec<TimeRange>, AvailabilityError> {
    if slot_minutes == 0 {
        return Err(AvailabilityError::ZeroSlot);
    }

    let mut slots = Vec::new();
    let mut cursor = window.start_minute();
    while cursor + slot_minutes <= window.end_minute() {
        let candidate = TimeRange::from_minutes(cursor, cursor + slot_minutes)?;
        if crate::is_available(existing, candidate, None) {
            slots.push(candidate);
        }
        cursor += slot_minutes;
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use core_types::BookingStatus;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn empty_day_is_fully_free() {
        let window = TimeRange::new(t(6, 0), t(8, 0)).unwrap();
        let slots = free_slots(&[], window, 30).unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].start(), t(6, 0));
        assert_eq!(slots[3].end(), t(8, 0));
    }

    #[test]
    fn booked_time_is_skipped() {
        let window = TimeRange::new(t(14, 0), t(16, 0)).unwrap();
        let existing = [BookingSlot {
            id: 1,
            start_time: t(14, 30),
            end_time: t(15, 30),
            status: BookingStatus::Confirmed,
        }];
        let starts: Vec<NaiveTime> = free_slots(&existing, window, 30)
            .unwrap()
            .iter()
            .map(|r| r.start())
            .collect();
        assert_eq!(starts, vec![t(14, 0), t(15, 30)]);
    }

    #[test]
    fn partial_trailing_slot_is_dropped() {
        let window = TimeRange::new(t(9, 0), t(10, 45)).unwrap();
        let slots = free_slots(&[], window, 30).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.last().unwrap().end(), t(10, 30));
    }

    #[test]
    fn zero_length_slots_are_rejected() {
        let window = TimeRange::new(t(9, 0), t(10, 0)).unwrap();
        assert_eq!(free_slots(&[], window, 0), Err(AvailabilityError::ZeroSlot));
    }
}
