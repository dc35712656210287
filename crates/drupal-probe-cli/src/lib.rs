//! dprobe CLI library
//!
//! Command-line front end for drupal-probe: composes form-field locators,
//! runs drush with the suite's alias and options, and manages the suite
//! configuration file.

#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigFormatArg, DrushArgs, FormatArg, KindArg,
    LocatorArgs, LoginUriArgs, ParentSpec,
};
pub use config::{CliConfig, ColorChoice, Verbosity, DEFAULT_CONFIG_FILE};
pub use error::{CliError, CliResult};
pub use output::Reporter;
