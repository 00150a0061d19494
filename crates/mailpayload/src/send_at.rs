//! Scheduling timestamp normalization.

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use mailpayload_mime::FieldValue;
use serde_json::Value;

/// Provider timestamp format, always in UTC.
const SEND_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a `send_at` value as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Strings pass through untouched. Date-only values are widened with the
/// configured time of day and offset.
///
/// # Errors
///
/// Returns [`Error::InvalidSendAtType`] for any other structured value.
pub fn format(value: &FieldValue, config: &Config) -> Result<String> {
    match value {
        FieldValue::Text(text) | FieldValue::Structured(Value::String(text)) => Ok(text.clone()),
        FieldValue::DateTime(at) => Ok(format_utc(at.with_timezone(&Utc))),
        FieldValue::Date(date) => {
            let naive = date.and_time(config.date_only_time);
            let at = config
                .date_only_offset()
                .from_local_datetime(&naive)
                .single()
                .map_or_else(|| naive.and_utc(), |at| at.with_timezone(&Utc));
            Ok(format_utc(at))
        }
        FieldValue::Structured(other) => Err(Error::InvalidSendAtType(json_kind(other).to_string())),
    }
}

fn format_utc(at: DateTime<Utc>) -> String {
    at.format(SEND_AT_FORMAT).to_string()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, NaiveTime};
    use serde_json::json;

    #[test]
    fn test_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 13, 5, 9).unwrap();
        let formatted = format(&FieldValue::from(at), &Config::default()).unwrap();
        assert_eq!(formatted, "2024-03-01 13:05:09");
    }

    #[test]
    fn test_offset_timestamp_converts_to_utc() {
        let at = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 29, 22, 30, 0)
            .unwrap();
        let formatted = format(&FieldValue::from(at), &Config::default()).unwrap();
        assert_eq!(formatted, "2024-03-01 03:30:00");
    }

    #[test]
    fn test_string_passes_through() {
        let value = FieldValue::from("2024-03-01 13:05:09");
        assert_eq!(format(&value, &Config::default()).unwrap(), "2024-03-01 13:05:09");

        let value = FieldValue::from("next tuesday");
        assert_eq!(format(&value, &Config::default()).unwrap(), "next tuesday");

        let value = FieldValue::from(json!("2024-03-01 00:00:00"));
        assert_eq!(format(&value, &Config::default()).unwrap(), "2024-03-01 00:00:00");
    }

    #[test]
    fn test_date_widens_to_midnight_utc() {
        let value = FieldValue::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(format(&value, &Config::default()).unwrap(), "2024-03-01 00:00:00");
    }

    #[test]
    fn test_date_widens_with_configured_time_and_offset() {
        let config = Config::builder()
            .date_only_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .date_only_offset(FixedOffset::east_opt(2 * 3600).unwrap())
            .build();
        let value = FieldValue::from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(format(&value, &config).unwrap(), "2024-03-01 07:00:00");
    }

    #[test]
    fn test_other_values_are_rejected() {
        for value in [json!(1_709_298_309), json!(["2024-03-01"]), json!({"at": 1}), json!(null)] {
            let result = format(&FieldValue::from(value), &Config::default());
            assert!(matches!(result, Err(Error::InvalidSendAtType(_))));
        }
    }
}
