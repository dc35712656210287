//! Drush and login-uri command handlers

use drupal_probe::{Drush, DrushConfig, SuiteConfig};

use crate::commands::{DrushArgs, LoginUriArgs};
use crate::error::CliResult;
use crate::output::Reporter;

/// Apply command-line overrides to the configured runner
#[must_use]
pub fn effective_config(base: &DrushConfig, alias: Option<&str>, timeout: Option<u64>) -> DrushConfig {
    let mut config = base.clone();
    if let Some(alias) = alias {
        config = config.with_alias(alias);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout_secs(secs);
    }
    config
}

/// Full command line, executable included
#[must_use]
pub fn describe(drush: &Drush, args: &[String]) -> String {
    drush.command_line(&args.join(" ")).join(" ")
}

/// Execute the drush command
pub fn execute_drush(reporter: &Reporter, suite: &SuiteConfig, args: &DrushArgs) -> CliResult<()> {
    let drush = Drush::new(effective_config(&suite.drush, args.alias.as_deref(), args.timeout));

    if args.dry_run {
        println!("{}", describe(&drush, &args.command));
        return Ok(());
    }

    tracing::debug!(command = ?args.command, "running drush from cli");
    let output = drush.run_args(&args.command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    reporter.success("drush finished");
    Ok(())
}

/// Execute the login-uri command
pub fn execute_login_uri(suite: &SuiteConfig, args: &LoginUriArgs) -> CliResult<()> {
    let drush = Drush::new(suite.drush.clone());

    if args.dry_run {
        println!("{}", describe(&drush, &Drush::login_args(args.name.as_deref())));
        return Ok(());
    }

    let path = drush.login_uri(args.name.as_deref())?;
    if args.absolute {
        println!("{}", suite.acceptance.url(&path));
    } else {
        println!("{path}");
    }
    Ok(())
}
