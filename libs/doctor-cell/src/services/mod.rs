pub mod schedule;
pub mod slots;
pub mod splitter;

pub use schedule::ScheduleStore;
pub use slots::{Booking, SlotCalculator};
pub use splitter::AvailabilitySplitter;
