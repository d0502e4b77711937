use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{DoctorError, Interval};
use crate::services::splitter::AvailabilitySplitter;

/// A doctor's free availability, kept ordered by start and pairwise disjoint.
///
/// Intervals may touch (`[9,10)` then `[10,11)`); they are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Interval>", into = "Vec<Interval>")]
pub struct ScheduleStore {
    intervals: Vec<Interval>,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_intervals(mut intervals: Vec<Interval>) -> Result<Self, DoctorError> {
        intervals.sort();
        if let Some(pair) = intervals.windows(2).find(|pair| pair[0].overlaps(&pair[1])) {
            return Err(DoctorError::OverlappingAvailability {
                requested: pair[1],
                existing: pair[0],
            });
        }
        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn add(&mut self, interval: Interval) -> Result<(), DoctorError> {
        if let Some(existing) = self.intervals.iter().find(|existing| existing.overlaps(&interval)) {
            return Err(DoctorError::OverlappingAvailability {
                requested: interval,
                existing: *existing,
            });
        }
        let position = self.intervals.partition_point(|existing| existing.start() < interval.start());
        self.intervals.insert(position, interval);
        debug!("Added availability {} at position {}", interval, position);
        Ok(())
    }

    pub fn remove(&mut self, interval: &Interval) -> Result<(), DoctorError> {
        let position = self
            .intervals
            .iter()
            .position(|existing| existing == interval)
            .ok_or(DoctorError::AvailabilityNotFound(*interval))?;
        self.intervals.remove(position);
        Ok(())
    }

    pub fn replace(&mut self, intervals: Vec<Interval>) -> Result<(), DoctorError> {
        *self = Self::from_intervals(intervals)?;
        Ok(())
    }

    /// The single interval fully containing `range`, if any.
    pub fn containing(&self, range: &Interval) -> Option<&Interval> {
        self.intervals.iter().find(|interval| interval.contains(range))
    }

    /// Carve `booking` out of the interval containing it.
    ///
    /// Returns `false` and leaves the store untouched when no single interval
    /// contains the booking.
    pub fn commit_booking(&mut self, booking: &Interval) -> bool {
        match AvailabilitySplitter::new().apply_booking(&self.intervals, booking) {
            Some(intervals) => {
                self.intervals = intervals;
                true
            }
            None => false,
        }
    }
}

impl TryFrom<Vec<Interval>> for ScheduleStore {
    type Error = DoctorError;

    fn try_from(intervals: Vec<Interval>) -> Result<Self, Self::Error> {
        Self::from_intervals(intervals)
    }
}

impl From<ScheduleStore> for Vec<Interval> {
    fn from(store: ScheduleStore) -> Self {
        store.intervals
    }
}
