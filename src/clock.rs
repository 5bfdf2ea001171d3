use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[weekday], [month repr:long] [day padding:none], [year]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12]:[minute]:[second] [period]");
const ISO_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Snapshot of the wall clock shown in the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    now: OffsetDateTime,
}

impl Clock {
    pub fn now() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self {
            now: OffsetDateTime::now_utc().to_offset(offset),
        }
    }

    #[cfg(test)]
    pub fn at(now: OffsetDateTime) -> Self {
        Self { now }
    }

    /// e.g. "Monday, October 19, 2026"
    pub fn date_line(&self) -> String {
        self.now.format(DATE_FORMAT).unwrap_or_default()
    }

    /// e.g. "03:04:05 PM"
    pub fn time_line(&self) -> String {
        self.now.format(TIME_FORMAT).unwrap_or_default()
    }

    pub fn iso_date(&self) -> String {
        self.now.format(ISO_DATE_FORMAT).unwrap_or_default()
    }

    pub fn timestamp(&self) -> String {
        self.now
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default()
    }

    /// True once the displayed second differs.
    pub fn is_stale(&self, other: &Clock) -> bool {
        self.now.unix_timestamp() != other.now.unix_timestamp()
    }
}

/// Accepts a `YYYY-MM-DD` date, as used for the date window on the command line.
pub fn parse_iso_date(s: &str) -> Result<String, String> {
    let s = s.trim();
    Date::parse(s, ISO_DATE_FORMAT)
        .map(|_| s.to_string())
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
