//! Local-time formatting shared by every report and output file name.

use std::time::SystemTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// `2024.03.05 14:22:33`, used inside CSV rows.
const DISPLAY: &[BorrowedFormatItem<'static>] =
    format_description!("[year].[month].[day] [hour]:[minute]:[second]");
/// `2024Mar05_142233`, used in generated file names.
const FILE: &[BorrowedFormatItem<'static>] =
    format_description!("[year][month repr:short][day]_[hour][minute][second]");

/// Current time in the local offset, falling back to UTC when the platform
/// cannot report one safely (e.g. a multi-threaded process on Unix).
#[must_use]
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn local(time: OffsetDateTime) -> OffsetDateTime {
    match UtcOffset::local_offset_at(time) {
        Ok(offset) => time.to_offset(offset),
        Err(_) => time,
    }
}

#[must_use]
pub fn display(time: OffsetDateTime) -> String {
    time.format(DISPLAY).unwrap_or_default()
}

#[must_use]
pub fn display_system(time: SystemTime) -> String {
    display(local(OffsetDateTime::from(time)))
}

#[must_use]
pub fn file_stamp(time: OffsetDateTime) -> String {
    time.format(FILE).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn display_format() {
        assert_eq!(display(datetime!(2024-03-05 14:22:33 UTC)), "2024.03.05 14:22:33");
    }

    #[test]
    fn file_stamp_format() {
        assert_eq!(file_stamp(datetime!(2024-03-05 04:02:03 UTC)), "2024Mar05_040203");
    }
}
