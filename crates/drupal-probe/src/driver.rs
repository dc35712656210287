//! Browser driving agent abstraction.
//!
//! The crate never speaks a browser protocol itself. A `WebDriver`
//! implementation (Selenium, Chromium over CDP, or the in-memory
//! [`MockDriver`](crate::mock::MockDriver)) receives resolved locators and
//! performs the interaction.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::locator::{Locator, LocatorAction};
use crate::result::ProbeResult;

/// One entry of the browser console log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserLogEntry {
    /// Log level as reported by the browser (`SEVERE`, `WARNING`, ...)
    pub level: String,
    /// Message text
    pub message: String,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub timestamp: u64,
}

impl BrowserLogEntry {
    /// Create a log entry
    #[must_use]
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
            timestamp: 0,
        }
    }
}

/// Abstract driver trait for browser automation
pub trait WebDriver {
    /// Navigate to a site-relative or absolute URL
    fn am_on_page(&mut self, url: &str) -> ProbeResult<()>;

    /// Click element
    fn click(&mut self, locator: &Locator) -> ProbeResult<()>;

    /// Type text into element, replacing its value
    fn fill_field(&mut self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Choose an option of a select list
    fn select_option(&mut self, locator: &Locator, option: &str) -> ProbeResult<()>;

    /// Wait until the element is present and clickable
    fn wait_for_element_clickable(&mut self, locator: &Locator) -> ProbeResult<()>;

    /// Wait until the element is gone or hidden
    fn wait_for_element_not_visible(&mut self, locator: &Locator) -> ProbeResult<()>;

    /// Read an attribute of the element
    fn grab_attribute_from(&mut self, locator: &Locator, attribute: &str) -> ProbeResult<String>;

    /// Execute JavaScript in page context
    fn execute_script(&mut self, script: &str) -> ProbeResult<serde_json::Value>;

    /// Pause
    fn wait(&mut self, duration: Duration) -> ProbeResult<()>;

    /// Console entries collected since the last call
    fn browser_logs(&mut self) -> ProbeResult<Vec<BrowserLogEntry>>;

    /// Perform a locator action
    fn perform(&mut self, action: &LocatorAction) -> ProbeResult<()> {
        match action {
            LocatorAction::Click { locator } => self.click(locator),
            LocatorAction::Fill { locator, text } => self.fill_field(locator, text),
            LocatorAction::SelectOption { locator, option } => self.select_option(locator, option),
            LocatorAction::WaitForClickable { locator } => self.wait_for_element_clickable(locator),
            LocatorAction::WaitForHidden { locator } => self.wait_for_element_not_visible(locator),
        }
    }
}
