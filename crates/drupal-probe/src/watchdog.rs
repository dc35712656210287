//! Database log (watchdog) assertions.
//!
//! The log is truncated before a test (or suite) and checked afterwards.
//! Any entry at or above the configured severity fails the check, with one
//! readable line per entry: `channel - Level: message`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::harness::TestModule;
use crate::result::{ProbeError, ProbeResult};

/// RFC 5424 severity levels, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Severity {
    /// System is unusable
    Emergency = 0,
    /// Action must be taken immediately
    Alert = 1,
    /// Critical conditions
    Critical = 2,
    /// Error conditions
    Error = 3,
    /// Warning conditions
    Warning = 4,
    /// Normal but significant conditions
    Notice = 5,
    /// Informational messages
    Info = 6,
    /// Debug-level messages
    Debug = 7,
}

impl Severity {
    /// All levels, most severe first
    pub const ALL: [Self; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// Numeric RFC level
    #[must_use]
    pub const fn level(self) -> u8 {
        self as u8
    }

    /// Level for a numeric RFC value
    #[must_use]
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(usize::from(level)).copied()
    }

    /// Label used in log check messages
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Alert => "Alert",
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Notice => "Notice",
            Self::Info => "Info",
            Self::Debug => "Debug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProbeError::config(format!("unknown log level '{s}'")))
    }
}

/// One watchdog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Row id
    pub wid: u64,
    /// Channel (the `type` column)
    pub channel: String,
    /// Severity
    pub severity: Severity,
    /// Message with placeholders
    pub message: String,
    /// Placeholder values keyed by placeholder, e.g. `@name`
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl LogEntry {
    /// Create an entry
    #[must_use]
    pub fn new(wid: u64, channel: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            wid,
            channel: channel.into(),
            severity,
            message: message.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Add a placeholder value
    #[must_use]
    pub fn with_variable(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.variables.insert(placeholder.into(), value.into());
        self
    }

    /// Message with every `@x`, `%x` and `:x` placeholder substituted
    #[must_use]
    pub fn rendered_message(&self) -> String {
        let mut placeholders: Vec<_> = self.variables.iter().collect();
        // longest first so `@name` cannot clobber `@names`
        placeholders.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        placeholders
            .into_iter()
            .fold(self.message.clone(), |message, (key, value)| message.replace(key.as_str(), value))
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}: {}", self.channel, self.severity, self.rendered_message())
    }
}

/// The site's database log
pub trait LogStore {
    /// Whether database logging is enabled
    fn is_enabled(&self) -> bool;

    /// Remove every entry
    fn truncate(&mut self) -> ProbeResult<()>;

    /// Entries with severity at or above `max_severity`, optionally limited
    /// to one channel
    fn query(&self, max_severity: Severity, channel: Option<&str>) -> ProbeResult<Vec<LogEntry>>;
}

fn default_level() -> String {
    Severity::Error.label().to_uppercase()
}

const fn default_true() -> bool {
    true
}

/// Watchdog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Per-channel thresholds, checked before the global one
    #[serde(default)]
    pub channels: BTreeMap<String, String>,
    /// Global threshold
    #[serde(default = "default_level")]
    pub level: String,
    /// Truncate before and check after every test
    #[serde(default = "default_true")]
    pub after_test: bool,
    /// Truncate before and check after the suite
    #[serde(default)]
    pub after_suite: bool,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            channels: BTreeMap::new(),
            level: default_level(),
            after_test: true,
            after_suite: false,
        }
    }
}

impl WatchdogConfig {
    /// Set a channel threshold
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>, level: impl Into<String>) -> Self {
        let _ = self.channels.insert(channel.into(), level.into());
        self
    }

    /// Set the global threshold
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Toggle per-test checks
    #[must_use]
    pub const fn with_after_test(mut self, enabled: bool) -> Self {
        self.after_test = enabled;
        self
    }

    /// Toggle per-suite checks
    #[must_use]
    pub const fn with_after_suite(mut self, enabled: bool) -> Self {
        self.after_suite = enabled;
        self
    }
}

fn threshold(level: &str) -> Option<Severity> {
    match level.parse() {
        Ok(severity) => Some(severity),
        Err(_) => {
            tracing::warn!(level, "ignoring unknown watchdog level");
            None
        }
    }
}

/// Log checker over a [`LogStore`]
#[derive(Debug)]
pub struct Watchdog<L: LogStore> {
    store: L,
    config: WatchdogConfig,
}

impl<L: LogStore> Watchdog<L> {
    /// Create a checker with default configuration
    #[must_use]
    pub fn new(store: L) -> Self {
        Self {
            store,
            config: WatchdogConfig::default(),
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: WatchdogConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Borrow the store
    #[must_use]
    pub const fn store(&self) -> &L {
        &self.store
    }

    /// Borrow the store mutably
    pub fn store_mut(&mut self) -> &mut L {
        &mut self.store
    }

    /// Clear the log so a later check only sees new entries
    pub fn prepare(&mut self) -> ProbeResult<()> {
        if !self.store.is_enabled() {
            return Err(ProbeError::assertion("Database logging is not enabled."));
        }
        self.store.truncate()
    }

    /// Readable lines for every entry over the configured thresholds.
    ///
    /// Channel thresholds are applied first, then the global one; an entry
    /// matched by both is reported once.
    pub fn messages(&self) -> ProbeResult<Vec<String>> {
        let mut seen = BTreeSet::new();
        let mut messages = Vec::new();
        let mut collect = |entries: Vec<LogEntry>| {
            for entry in entries {
                if seen.insert(entry.wid) {
                    messages.push(entry.to_string());
                }
            }
        };

        for (channel, level) in &self.config.channels {
            if let Some(severity) = threshold(level) {
                collect(self.store.query(severity, Some(channel))?);
            }
        }
        if let Some(severity) = threshold(&self.config.level) {
            collect(self.store.query(severity, None)?);
        }
        Ok(messages)
    }

    /// Fail if any entry is over the configured thresholds
    pub fn check_logs(&self) -> ProbeResult<()> {
        let messages = self.messages()?;
        if messages.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = messages.len(), "watchdog entries over threshold");
            Err(ProbeError::LogCheckFailed { messages })
        }
    }
}

impl<L: LogStore> TestModule for Watchdog<L> {
    fn name(&self) -> &str {
        "watchdog"
    }

    fn before_suite(&mut self) -> ProbeResult<()> {
        if self.config.after_suite {
            self.prepare()?;
        }
        Ok(())
    }

    fn before(&mut self, _test: &str) -> ProbeResult<()> {
        if self.config.after_test {
            self.prepare()?;
        }
        Ok(())
    }

    fn after(&mut self, _test: &str) -> ProbeResult<()> {
        if self.config.after_test {
            self.check_logs()?;
        }
        Ok(())
    }

    fn after_suite(&mut self) -> ProbeResult<()> {
        if self.config.after_suite {
            self.check_logs()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MemoryLogStore;

    mod severity_tests {
        use super::*;

        #[test]
        fn test_rfc_levels() {
            assert_eq!(Severity::Emergency.level(), 0);
            assert_eq!(Severity::Error.level(), 3);
            assert_eq!(Severity::Debug.level(), 7);
            assert_eq!(Severity::from_level(4), Some(Severity::Warning));
            assert_eq!(Severity::from_level(8), None);
        }

        #[test]
        fn test_parse_case_insensitive() {
            assert_eq!("error".parse::<Severity>().unwrap(), Severity::Error);
            assert_eq!("WARNING".parse::<Severity>().unwrap(), Severity::Warning);
            assert!("loud".parse::<Severity>().is_err());
        }

        #[test]
        fn test_more_severe_orders_first() {
            assert!(Severity::Critical < Severity::Error);
        }

        #[test]
        fn test_serde_uppercase() {
            let level: Severity = serde_yaml_ng::from_str("NOTICE").unwrap();
            assert_eq!(level, Severity::Notice);
        }
    }

    mod entry_tests {
        use super::*;

        #[test]
        fn test_display_substitutes_variables() {
            let entry = LogEntry::new(1, "php", Severity::Error, "%type: @message in %function")
                .with_variable("%type", "TypeError")
                .with_variable("@message", "boom")
                .with_variable("%function", "foo()");
            assert_eq!(entry.to_string(), "php - Error: TypeError: boom in foo()");
        }

        #[test]
        fn test_longer_placeholder_wins() {
            let entry = LogEntry::new(1, "user", Severity::Notice, "@name and @names")
                .with_variable("@name", "a")
                .with_variable("@names", "b");
            assert_eq!(entry.rendered_message(), "a and b");
        }
    }

    mod check_tests {
        use super::*;

        fn store() -> MemoryLogStore {
            let mut store = MemoryLogStore::new();
            store.log("php", Severity::Error, "Broken");
            store.log("cron", Severity::Warning, "Slow run");
            store.log("system", Severity::Info, "Installed");
            store
        }

        #[test]
        fn test_default_level_is_error() {
            let watchdog = Watchdog::new(store());
            let err = watchdog.check_logs().unwrap_err();
            match err {
                ProbeError::LogCheckFailed { messages } => {
                    assert_eq!(messages, vec!["php - Error: Broken"]);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn test_channel_threshold_adds_entries_once() {
            let config = WatchdogConfig::default()
                .with_channel("cron", "warning")
                .with_channel("php", "notice");
            let watchdog = Watchdog::new(store()).with_config(config);
            let messages = watchdog.messages().unwrap();
            assert_eq!(messages, vec!["cron - Warning: Slow run", "php - Error: Broken"]);
        }

        #[test]
        fn test_unknown_level_is_ignored() {
            let config = WatchdogConfig::default().with_level("loud");
            let watchdog = Watchdog::new(store()).with_config(config);
            assert!(watchdog.check_logs().is_ok());
        }

        #[test]
        fn test_prepare_truncates() {
            let mut watchdog = Watchdog::new(store());
            watchdog.prepare().unwrap();
            assert!(watchdog.check_logs().is_ok());
        }

        #[test]
        fn test_prepare_requires_dblog() {
            let mut watchdog = Watchdog::new(MemoryLogStore::disabled());
            let err = watchdog.prepare().unwrap_err();
            assert!(err.to_string().contains("Database logging is not enabled."));
        }

        #[test]
        fn test_hooks_follow_config() {
            let mut watchdog = Watchdog::new(store());
            watchdog.after_suite().unwrap();
            assert!(watchdog.after("t").is_err());
            watchdog.before("t").unwrap();
            assert!(watchdog.after("t").is_ok());
        }

        #[test]
        fn test_config_yaml_defaults() {
            let config: WatchdogConfig = serde_yaml_ng::from_str("channels:\n  php: notice\n").unwrap();
            assert_eq!(config.level, "ERROR");
            assert!(config.after_test);
            assert!(!config.after_suite);
            assert_eq!(config.channels.get("php").map(String::as_str), Some("notice"));
        }
    }
}
