use chrono::{TimeZone, Utc};

// Comments use Javascript style timestamps, so
// milliseconds everywhere.

// Format used in emails: dd/MM/yyyy HH:mm
// chrono formatting reference:
// https://docs.rs/chrono/latest/chrono/format/strftime/index.html
const DATE_FORMAT_EMAIL: &'static str = "%d/%m/%Y %H:%M UTC";

pub fn current_timestamp_millis() -> i64 {
  Utc::now().timestamp_millis()
}

// Out of range timestamps give an empty string, it's
// only for display anyway.
pub fn timestamp_millis_to_date_string(timestamp: i64) -> String {
  Utc.timestamp_millis_opt(timestamp)
    .single()
    .map(|d| d.format(DATE_FORMAT_EMAIL).to_string())
    .unwrap_or_default()
}
