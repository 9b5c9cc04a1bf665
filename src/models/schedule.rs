use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

/// Half-hour slots offered each open day, 08:00 through 17:30.
pub const SLOT_TIMES: [&str; 20] = [
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30",
    "13:00", "13:30", "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
];

pub const OPENING_HOURS: &str = "Mon-Sat: 08:00-18:00";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlotAvailability {
    pub time: &'static str,
    pub available: bool,
}

/// Monday through Saturday. Sunday is always closed.
pub fn is_open_day(date: NaiveDate) -> bool {
    date.weekday() != Weekday::Sun
}

pub fn is_valid_slot(time: &str) -> bool {
    SLOT_TIMES.contains(&time)
}
