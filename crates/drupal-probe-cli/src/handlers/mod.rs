//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for a CLI command and
//! the pure helpers it is built from.

pub mod config;
pub mod drush;
pub mod locator;

pub use config::execute_config;
pub use drush::{execute_drush, execute_login_uri};
pub use locator::{build_field, execute_locator, LocatorReport};
