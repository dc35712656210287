//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use drupal_probe::FieldKind;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::CliError;

/// dprobe: compose Drupal form-field locators and run drush for test suites
#[derive(Parser, Debug)]
#[command(name = "dprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Suite configuration file (YAML)
    #[arg(short, long, global = true, env = "DPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compose the locators of a form field
    Locator(LocatorArgs),

    /// Run a drush command with the configured alias and options
    Drush(DrushArgs),

    /// Print a one-time login path
    LoginUri(LoginUriArgs),

    /// Show or initialize the suite configuration
    Config(ConfigArgs),
}

/// Field kind as accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindArg {
    /// Repeatable leaf field
    #[default]
    Leaf,
    /// Single embedded sub-form
    Composite,
    /// Removable paragraph item
    Paragraph,
}

impl From<KindArg> for FieldKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Leaf => Self::Leaf,
            KindArg::Composite => Self::Composite,
            KindArg::Paragraph => Self::Paragraph,
        }
    }
}

/// One ancestor of the field: `[kind:]name[@position]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentSpec {
    /// Field name
    pub name: String,
    /// Widget kind
    pub kind: FieldKind,
    /// Position of the current item
    pub position: usize,
}

impl FromStr for ParentSpec {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = match s.split_once(':') {
            Some((kind, rest)) => (kind.parse::<FieldKind>()?, rest),
            None => (FieldKind::Leaf, s),
        };
        let (name, position) = match rest.rsplit_once('@') {
            Some((name, position)) => {
                let position = position
                    .parse()
                    .map_err(|_| CliError::invalid_argument(format!("invalid position in '{s}'")))?;
                (name, position)
            }
            None => (rest, 0),
        };
        Ok(Self {
            name: name.to_string(),
            kind,
            position,
        })
    }
}

/// Arguments for the locator command
#[derive(Parser, Debug)]
pub struct LocatorArgs {
    /// Field name, e.g. field_body
    pub field: String,

    /// Widget kind of the field
    #[arg(short, long, value_enum, default_value = "leaf")]
    pub kind: KindArg,

    /// Current position of the field
    #[arg(short, long, default_value = "0")]
    pub position: usize,

    /// Ancestor as [kind:]name[@position], outermost first (repeatable)
    #[arg(long = "parent", value_parser = clap::value_parser!(ParentSpec))]
    pub parents: Vec<ParentSpec>,

    /// Sub-element under the current item, e.g. value or target_id
    #[arg(short, long)]
    pub element: Option<String>,

    /// Type of the add-more button
    #[arg(long)]
    pub add_more: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the drush command
#[derive(Parser, Debug)]
pub struct DrushArgs {
    /// Drush command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// Site alias, overriding the configuration
    #[arg(long)]
    pub alias: Option<String>,

    /// Timeout in seconds, overriding the configuration
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the invocation instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the login-uri command
#[derive(Parser, Debug)]
pub struct LoginUriArgs {
    /// User name; the superuser when absent
    #[arg(short, long)]
    pub name: Option<String>,

    /// Prefix the path with the configured base URL
    #[arg(long)]
    pub absolute: bool,

    /// Print the invocation instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Write the default configuration to this file
    #[arg(long)]
    pub init: Option<PathBuf>,

    /// Overwrite an existing file with --init
    #[arg(long)]
    pub force: bool,

    /// Output format for showing the configuration
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormatArg,
}

/// Output format of the locator command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Output format of the config command
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormatArg {
    /// YAML, as read from the file
    #[default]
    Yaml,
    /// JSON output
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
