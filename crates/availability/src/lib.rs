//! # Courtbook Availability
//!
//! The conflict rules for court bookings, free of any I/O. The database crate
//! loads the bookings of one court on one date and asks this crate whether a
//! requested time range can be taken.
//!
//! Two ranges conflict when they share at least one minute. Ranges are
//! half-open, `[start, end)`, so a booking ending at 15:00 and another starting
//! at 15:00 do not conflict. Only bookings whose status still holds the slot
//! (pending or confirmed) are considered.

pub mod error;
pub mod range;
pub mod slots;

pub use error::AvailabilityError;
pub use range::{fits_within, TimeRange};
pub use slots::free_slots;

use core_types::BookingSlot;

/// Returns `true` when no blocking booking in `existing` overlaps `requested`.
///
/// `exclude_id` skips one booking, which is how an edit re-checks its own slot.
pub fn is_available(existing: &[BookingSlot], requested: TimeRange, exclude_id: Option<i32>) -> bool {
    blocking(existing, exclude_id).all(|slot| !slot_range(slot).overlaps(&requested))
}

/// All blocking bookings that overlap `requested`, in input order.
pub fn find_conflicts(
    existing: &[BookingSlot],
    requested: TimeRange,
    exclude_id: Option<i32>,
) -> Vec<BookingSlot> {
    blocking(existing, exclude_id)
        .filter(|slot| slot_range(slot).overlaps(&requested))
        .copied()
        .collect()
}

fn blocking(
    existing: &[BookingSlot],
    exclude_id: Option<i32>,
) -> impl Iterator<Item = &BookingSlot> {
    existing
        .iter()
        .filter(|slot| slot.status.blocks_availability())
        .filter(move |slot| Some(slot.id) != exclude_id)
}

// Stored bookings always satisfy end > start (a CHECK constraint); the raw
// constructor avoids re-validating rows that came out of the database.
fn slot_range(slot: &BookingSlot) -> TimeRange {
    TimeRange::from_parts_unchecked(slot.start_time, slot.end_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use core_types::BookingStatus;
    use proptest::prelude::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn range(sh: u32, sm: u32, eh: u32, em: u32) -> TimeRange {
        TimeRange::new(t(sh, sm), t(eh, em)).unwrap()
    }

    fn booking(id: i32, sh: u32, eh: u32, status: BookingStatus) -> BookingSlot {
        BookingSlot { id, start_time: t(sh, 0), end_time: t(eh, 0), status }
    }

    #[test]
    fn confirmed_two_pm_booking_example() {
        let existing = [booking(1, 14, 15, BookingStatus::Confirmed)];

        assert!(!is_available(&existing, range(14, 30, 15, 30), None));
        assert!(is_available(&existing, range(15, 0, 16, 0), None));
        assert!(is_available(&existing, range(13, 0, 14, 0), None));
    }

    #[test]
    fn containment_in_either_direction_conflicts() {
        let existing = [booking(1, 14, 17, BookingStatus::Pending)];
        assert!(!is_available(&existing, range(15, 0, 16, 0), None));

        let existing = [booking(1, 15, 16, BookingStatus::Pending)];
        assert!(!is_available(&existing, range(14, 0, 17, 0), None));
    }

    #[test]
    fn identical_range_conflicts() {
        let existing = [booking(7, 10, 11, BookingStatus::Confirmed)];
        assert!(!is_available(&existing, range(10, 0, 11, 0), None));
    }

    #[test]
    fn cancelled_and_completed_bookings_never_block() {
        let existing = [
            booking(1, 10, 12, BookingStatus::Cancelled),
            booking(2, 10, 12, BookingStatus::Completed),
        ];
        assert!(is_available(&existing, range(10, 0, 12, 0), None));
        assert!(find_conflicts(&existing, range(10, 0, 12, 0), None).is_empty());
    }

    #[test]
    fn excluded_booking_is_ignored() {
        let existing = [booking(3, 18, 19, BookingStatus::Confirmed)];
        assert!(!is_available(&existing, range(18, 30, 19, 30), None));
        assert!(is_available(&existing, range(18, 30, 19, 30), Some(3)));
        assert!(!is_available(&existing, range(18, 30, 19, 30), Some(4)));
    }

    #[test]
    fn conflicts_lists_every_offender() {
        let existing = [
            booking(1, 8, 9, BookingStatus::Confirmed),
            booking(2, 9, 10, BookingStatus::Pending),
            booking(3, 10, 11, BookingStatus::Confirmed),
            booking(4, 9, 10, BookingStatus::Cancelled),
        ];
        let ids: Vec<i32> = find_conflicts(&existing, range(8, 30, 10, 0), None)
            .iter()
            .map(|slot| slot.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    fn minutes() -> impl Strategy<Value = u32> {
        0u32..(24 * 60 - 1)
    }

    fn arb_range() -> impl Strategy<Value = TimeRange> {
        (minutes(), 1u32..240).prop_map(|(start, len)| {
            let end = (start + len).min(24 * 60 - 1).max(start + 1);
            TimeRange::from_minutes(start, end).unwrap()
        })
    }

    fn arb_blocking_status() -> impl Strategy<Value = BookingStatus> {
        prop_oneof![Just(BookingStatus::Pending), Just(BookingStatus::Confirmed)]
    }

    fn slot_of(id: i32, range: TimeRange, status: BookingStatus) -> BookingSlot {
        BookingSlot { id, start_time: range.start(), end_time: range.end(), status }
    }

    proptest! {
        #[test]
        fn disjoint_bookings_leave_each_other_free(
            a in arb_range(),
            gap in 0u32..60,
            len in 1u32..120,
            status in arb_blocking_status(),
        ) {
            let b_start = a.end_minute() + gap;
            prop_assume!(b_start + len < 24 * 60);
            let b = TimeRange::from_minutes(b_start, b_start + len).unwrap();
            let existing = [slot_of(1, a, status), slot_of(2, b, status)];

            prop_assert!(is_available(&existing, a, Some(1)));
            prop_assert!(is_available(&existing, b, Some(2)));
        }

        #[test]
        fn any_shared_minute_blocks(
            a in arb_range(),
            b in arb_range(),
            status in arb_blocking_status(),
        ) {
            let share = a.start_minute() < b.end_minute() && b.start_minute() < a.end_minute();
            let existing = [slot_of(1, a, status)];
            prop_assert_eq!(is_available(&existing, b, None), !share);
        }

        #[test]
        fn released_statuses_never_block(
            a in arb_range(),
            b in arb_range(),
            status in prop_oneof![Just(BookingStatus::Cancelled), Just(BookingStatus::Completed)],
        ) {
            let existing = [slot_of(1, a, status)];
            prop_assert!(is_available(&existing, b, None));
        }

        #[test]
        fn excluding_the_only_conflict_frees_the_slot(
            a in arb_range(),
            status in arb_blocking_status(),
        ) {
            let existing = [slot_of(9, a, status)];
            prop_assert!(!is_available(&existing, a, None));
            prop_assert!(is_available(&existing, a, Some(9)));
        }
    }
}
