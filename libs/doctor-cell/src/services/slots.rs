use tracing::debug;

use crate::models::Interval;

/// A booked time range as the interval arithmetic sees it.
pub trait Booking {
    fn booking_id(&self) -> &str;

    fn interval(&self) -> Interval;

    /// Whether the booking holds time that has not yet been carved out of
    /// the doctor's availability.
    fn holds_uncommitted_time(&self) -> bool;
}

impl<B: Booking + ?Sized> Booking for &B {
    fn booking_id(&self) -> &str {
        (**self).booking_id()
    }

    fn interval(&self) -> Interval {
        (**self).interval()
    }

    fn holds_uncommitted_time(&self) -> bool {
        (**self).holds_uncommitted_time()
    }
}

/// Derives bookable free sub-intervals from availability and bookings.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotCalculator;

impl SlotCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Subtract uncommitted bookings from each availability interval.
    ///
    /// `bookings` must be sorted by start ascending. Availability intervals are
    /// processed in the order given and their emissions concatenated.
    pub fn compute_free_slots<B: Booking>(
        &self,
        availability: &[Interval],
        bookings: &[B],
        exclude_id: Option<&str>,
    ) -> Vec<Interval> {
        let mut slots = Vec::new();

        for interval in availability {
            let mut cursor = interval.start();

            for booking in bookings {
                if !booking.holds_uncommitted_time() || exclude_id == Some(booking.booking_id()) {
                    continue;
                }
                let booked = booking.interval();
                if !booked.overlaps(interval) {
                    continue;
                }
                if booked.start() > cursor {
                    slots.push(Interval::from_ordered(cursor, booked.start()));
                }
                cursor = cursor.max(booked.end());
            }

            if cursor < interval.end() {
                slots.push(Interval::from_ordered(cursor, interval.end()));
            }
        }

        debug!(
            "Computed {} free slots from {} availability intervals and {} bookings",
            slots.len(),
            availability.len(),
            bookings.len()
        );
        slots
    }
}
