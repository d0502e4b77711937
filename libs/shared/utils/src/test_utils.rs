//! Fixtures shared by the cell test suites.

use chrono::{NaiveDate, NaiveDateTime};

use shared_config::AppConfig;

/// Calendar day every fixture timestamp falls on unless a day is given.
pub const FIXTURE_DAY: (i32, u32, u32) = (2030, 1, 15);

/// Timestamp on the fixture day.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    on_day(0, hour, minute)
}

/// Timestamp `day_offset` days after the fixture day.
pub fn on_day(day_offset: u32, hour: u32, minute: u32) -> NaiveDateTime {
    let (year, month, day) = FIXTURE_DAY;
    NaiveDate::from_ymd_opt(year, month, day + day_offset)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .unwrap_or_else(|| panic!("invalid fixture time {}+{} {}:{}", day, day_offset, hour, minute))
}

pub struct TestConfig;

impl TestConfig {
    pub fn in_memory() -> AppConfig {
        AppConfig::default()
    }

    pub fn with_data_dir(dir: &std::path::Path) -> AppConfig {
        AppConfig::default().with_data_dir(dir)
    }
}
