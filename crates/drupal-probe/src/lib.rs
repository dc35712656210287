//! drupal-probe: test support for Drupal sites
//!
//! Builds XPath locators for nested form widgets (repeatable fields,
//! single-instance sub-forms and paragraphs) and provides the collaborators
//! a functional or acceptance suite needs around them: a drush runner,
//! an entity registry that deletes what tests created, watchdog checks,
//! event assertions, kernel bootstrap, test users and groups.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ FormField    │───►│ XpathTemplate│───►│ Locator      │───► WebDriver
//! │ (identifiers)│    │ (patterns)   │    │ (actions)    │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ TestHarness  │───►│ TestModule   │◄───│ registry,    │
//! │ (lifecycle)  │    │ (hooks)      │    │ users,       │
//! └──────────────┘    └──────────────┘    │ watchdog     │
//!                                         └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use drupal_probe::FormField;
//!
//! let paragraphs = FormField::paragraph("field_paragraphs").unwrap();
//! let title = FormField::child("field_title", &paragraphs).unwrap();
//! assert_eq!(
//!     title.get_current("value"),
//!     r#"//*[@data-drupal-selector="edit-field-paragraphs-0-subform-field-title-0-value"]"#
//! );
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc)]
mod acceptance;
mod bootstrap;
#[allow(clippy::missing_errors_doc)]
mod config;
mod driver;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod drush;
#[allow(clippy::missing_errors_doc)]
mod entity;
mod events;
mod form_field;
mod group;
#[allow(clippy::missing_errors_doc)]
mod harness;
mod locator;
/// Subscriber setup for binaries
pub mod logging;
/// In-memory collaborators for tests
///
/// A recording browser driver, entity storage, log store, event collector
/// and kernel, in the spirit of a mock browser driver.
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;
mod result;
#[allow(clippy::missing_errors_doc)]
mod user;
mod watchdog;
mod xpath;

pub use acceptance::{ckeditor_script, Acceptance, WYSIWYG_SETTLE};
pub use bootstrap::{
    find_drupal_root, BootRequest, BootstrapConfig, DrupalBootstrap, Kernel, DEFAULT_SITE_PATH,
    ROOT_MARKER, ROOT_SUBDIRECTORIES,
};
pub use config::{AcceptanceConfig, SuiteConfig};
pub use driver::{BrowserLogEntry, WebDriver};
pub use drush::{
    extract_login_path, strip_output, Drush, DrushConfig, DrushOutput, ExecutionMode,
    DEFAULT_DRUSH, LOGIN_PATH_MARKER,
};
pub use entity::{
    CleanupPolicy, CleanupReport, EntityId, EntityRecord, EntityRegistry, EntityStorage,
    EntityValues, Violation, DEFAULT_ENTITY_TYPE,
};
pub use events::{EventAssertions, EventCollector, EventData};
pub use form_field::{
    normalize, FieldKind, FormField, FormFieldBuilder, IdentifiableFormField, ROOT_PREFIX,
};
pub use group::{join_group, leave_group, GroupMembership, DEFAULT_GROUP_OWNER, GROUP_ENTITY_TYPE};
pub use harness::{SuiteResults, TestCase, TestHarness, TestModule, TestResult, TestSuite};
pub use locator::{Locator, LocatorAction, LocatorOptions, Selector, DEFAULT_TIMEOUT_MS};
pub use result::{ProbeError, ProbeResult};
pub use user::{TestUser, UserConfig, UserManager, DEFAULT_ROLE, USER_ENTITY_TYPE};
pub use watchdog::{LogEntry, LogStore, Severity, Watchdog, WatchdogConfig};
pub use xpath::{
    resolve, unresolved_placeholders, XpathTemplate, DEFAULT_ATTRIBUTE, DEFAULT_ELEMENT,
    DEFAULT_PATTERN,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::acceptance::*;
    pub use super::driver::*;
    pub use super::entity::*;
    pub use super::events::*;
    pub use super::form_field::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::result::*;
    pub use super::watchdog::*;
    pub use super::xpath::*;
}
