use tracing::{debug, warn};

use crate::models::Interval;

/// Replaces the availability interval that hosts a confirmed booking with
/// whatever is left on either side of it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AvailabilitySplitter;

impl AvailabilitySplitter {
    pub fn new() -> Self {
        Self
    }

    /// New availability with `booking` removed, or `None` when no single
    /// interval fully contains it.
    pub fn apply_booking(&self, availability: &[Interval], booking: &Interval) -> Option<Vec<Interval>> {
        let Some(position) = availability.iter().position(|interval| interval.contains(booking)) else {
            warn!("No availability interval contains booking {}", booking);
            return None;
        };

        let host = availability[position];
        let mut updated = Vec::with_capacity(availability.len() + 1);
        updated.extend_from_slice(&availability[..position]);
        updated.extend(self.remainders(&host, booking));
        updated.extend_from_slice(&availability[position + 1..]);

        debug!("Split {} around booking {}", host, booking);
        Some(updated)
    }

    /// Non-empty pieces of `host` before and after `booking`.
    fn remainders(&self, host: &Interval, booking: &Interval) -> Vec<Interval> {
        let mut pieces = Vec::with_capacity(2);
        if host.start() < booking.start() {
            pieces.push(Interval::from_ordered(host.start(), booking.start()));
        }
        if booking.end() < host.end() {
            pieces.push(Interval::from_ordered(booking.end(), host.end()));
        }
        pieces
    }
}
