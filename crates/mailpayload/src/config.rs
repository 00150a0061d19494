//! Assembler configuration types.

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use serde::Deserialize;

/// Payload assembler configuration.
///
/// Deserializes with per-field defaults so hosts can embed it in their own
/// configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ask the provider to queue the message instead of sending inline.
    #[serde(rename = "async")]
    pub send_async: bool,
    /// Dedicated IP pool to send from.
    pub ip_pool: Option<String>,
    /// Time of day a date-only `send_at` is widened to.
    pub date_only_time: NaiveTime,
    /// UTC offset, in seconds, of `date_only_time`.
    pub date_only_offset_seconds: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            send_async: false,
            ip_pool: None,
            date_only_time: NaiveTime::default(),
            date_only_offset_seconds: 0,
        }
    }
}

impl Config {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Offset used to widen date-only `send_at` values.
    ///
    /// Out-of-range offsets fall back to UTC.
    #[must_use]
    pub fn date_only_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.date_only_offset_seconds).unwrap_or_else(|| {
            tracing::warn!(
                offset = self.date_only_offset_seconds,
                "Invalid date-only offset, using UTC"
            );
            Utc.fix()
        })
    }
}

/// Builder for assembler configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether requests ask for asynchronous sending.
    #[must_use]
    pub fn send_async(mut self, send_async: bool) -> Self {
        self.config.send_async = send_async;
        self
    }

    /// Sets the IP pool.
    #[must_use]
    pub fn ip_pool(mut self, ip_pool: impl Into<String>) -> Self {
        self.config.ip_pool = Some(ip_pool.into());
        self
    }

    /// Sets the time of day a date-only `send_at` is widened to.
    #[must_use]
    pub fn date_only_time(mut self, time: NaiveTime) -> Self {
        self.config.date_only_time = time;
        self
    }

    /// Sets the offset of the widened date-only `send_at`.
    #[must_use]
    pub fn date_only_offset(mut self, offset: FixedOffset) -> Self {
        self.config.date_only_offset_seconds = offset.local_minus_utc();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
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

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.send_async);
        assert!(config.ip_pool.is_none());
        assert_eq!(config.date_only_time, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(config.date_only_offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .send_async(true)
            .ip_pool("Main Pool")
            .date_only_time(NaiveTime::from_hms_opt(9, 30, 0).unwrap())
            .date_only_offset(FixedOffset::east_opt(2 * 3600).unwrap())
            .build();

        assert!(config.send_async);
        assert_eq!(config.ip_pool.as_deref(), Some("Main Pool"));
        assert_eq!(config.date_only_offset_seconds, 7200);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"async": true, "date_only_time": "08:00:00"}"#).unwrap();
        assert!(config.send_async);
        assert_eq!(config.date_only_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(config.date_only_offset_seconds, 0);
    }

    #[test]
    fn test_invalid_offset_falls_back_to_utc() {
        let config = Config {
            date_only_offset_seconds: 100_000,
            ..Config::default()
        };
        assert_eq!(config.date_only_offset().local_minus_utc(), 0);
    }
}
