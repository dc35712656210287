//! dprobe: Drupal test support from the command line
//!
//! ## Usage
//!
//! ```bash
//! dprobe locator field_title --parent paragraph:field_paragraphs@1 -e value
//! dprobe drush --dry-run cr
//! dprobe login-uri --name alice --absolute
//! dprobe config --init drupal-probe.yml
//! ```

use clap::Parser;
use drupal_probe::logging::init_tracing;
use drupal_probe_cli::{handlers, Cli, CliConfig, CliResult, ColorChoice, Commands, Reporter, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_tracing(config.verbosity.level(), cli.log_json);
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let cwd = std::env::current_dir()?;
    let suite = config.suite_config(&cwd)?;

    match cli.command {
        Commands::Locator(args) => handlers::execute_locator(&reporter, &args),
        Commands::Drush(args) => handlers::execute_drush(&reporter, &suite, &args),
        Commands::LoginUri(args) => handlers::execute_login_uri(&suite, &args),
        Commands::Config(args) => handlers::execute_config(&reporter, &suite, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();

    let mut config = CliConfig::new().with_verbosity(verbosity).with_color(color);
    if let Some(path) = &cli.config {
        config = config.with_config_path(path);
    }
    config
}
