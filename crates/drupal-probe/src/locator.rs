//! Locators handed to the browser driving agent.
//!
//! A [`Locator`] wraps a resolved selector string plus wait options. Calling
//! an action method does not touch a browser; it yields a [`LocatorAction`]
//! that a [`WebDriver`](crate::driver::WebDriver) performs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default timeout for waits (10 seconds, the WebDriver module default)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    /// XPath expression, as produced by form fields
    XPath(String),
    /// CSS selector
    Css(String),
}

impl Selector {
    /// The raw selector text
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::XPath(s) | Self::Css(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locator options for customizing wait behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for waits
    pub timeout: Duration,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// A locator for finding and interacting with elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from an XPath expression
    #[must_use]
    pub fn xpath(xpath: impl Into<String>) -> Self {
        Self::from_selector(Selector::XPath(xpath.into()))
    }

    /// Create a locator from a CSS selector
    #[must_use]
    pub fn css(css: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(css.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Click on the located element
    #[must_use]
    pub fn click(&self) -> LocatorAction {
        LocatorAction::Click {
            locator: self.clone(),
        }
    }

    /// Fill the located element with text
    #[must_use]
    pub fn fill(&self, text: impl Into<String>) -> LocatorAction {
        LocatorAction::Fill {
            locator: self.clone(),
            text: text.into(),
        }
    }

    /// Select an option of the located select list
    #[must_use]
    pub fn select_option(&self, option: impl Into<String>) -> LocatorAction {
        LocatorAction::SelectOption {
            locator: self.clone(),
            option: option.into(),
        }
    }

    /// Wait for the element to be clickable
    #[must_use]
    pub fn wait_for_clickable(&self) -> LocatorAction {
        LocatorAction::WaitForClickable {
            locator: self.clone(),
        }
    }

    /// Wait for the element to disappear
    #[must_use]
    pub fn wait_for_hidden(&self) -> LocatorAction {
        LocatorAction::WaitForHidden {
            locator: self.clone(),
        }
    }
}

impl From<String> for Locator {
    fn from(xpath: String) -> Self {
        Self::xpath(xpath)
    }
}

/// Actions that can be performed on a located element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorAction {
    /// Click on the element
    Click {
        /// The locator
        locator: Locator,
    },
    /// Fill the element with text
    Fill {
        /// The locator
        locator: Locator,
        /// Text to fill
        text: String,
    },
    /// Select an option in a select list
    SelectOption {
        /// The locator
        locator: Locator,
        /// Option label or value
        option: String,
    },
    /// Wait for element to be clickable
    WaitForClickable {
        /// The locator
        locator: Locator,
    },
    /// Wait for element to be hidden
    WaitForHidden {
        /// The locator
        locator: Locator,
    },
}

impl LocatorAction {
    /// Get the locator for this action
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        match self {
            Self::Click { locator }
            | Self::Fill { locator, .. }
            | Self::SelectOption { locator, .. }
            | Self::WaitForClickable { locator }
            | Self::WaitForHidden { locator } => locator,
        }
    }

    /// Short action name, used in driver call logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Fill { .. } => "fill",
            Self::SelectOption { .. } => "select_option",
            Self::WaitForClickable { .. } => "wait_for_clickable",
            Self::WaitForHidden { .. } => "wait_for_hidden",
        }
    }
}

impl fmt::Display for LocatorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill { locator, text, .. } => {
                write!(f, "{}:{}={}", self.name(), locator.selector(), text)
            }
            Self::SelectOption {
                locator, option, ..
            } => write!(f, "{}:{}={}", self.name(), locator.selector(), option),
            _ => write!(f, "{}:{}", self.name(), self.locator().selector()),
        }
    }
}
