//! Config command handler

use drupal_probe::{ProbeError, SuiteConfig};
use std::path::Path;

use crate::commands::{ConfigArgs, ConfigFormatArg};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;

/// Render `config` in the requested format
pub fn render_config(config: &SuiteConfig, format: ConfigFormatArg) -> CliResult<String> {
    match format {
        ConfigFormatArg::Yaml => Ok(config.to_yaml()?),
        ConfigFormatArg::Json => Ok(serde_json::to_string_pretty(config).map_err(ProbeError::from)?),
    }
}

/// Write the default configuration to `path`
pub fn write_default_config(path: &Path, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    std::fs::write(path, SuiteConfig::default().to_yaml()?)?;
    Ok(())
}

/// Execute the config command
pub fn execute_config(reporter: &Reporter, suite: &SuiteConfig, args: &ConfigArgs) -> CliResult<()> {
    if let Some(path) = &args.init {
        write_default_config(path, args.force)?;
        reporter.success(&format!("wrote {}", path.display()));
        return Ok(());
    }

    print!("{}", render_config(suite, args.format)?);
    if args.format == ConfigFormatArg::Json {
        println!();
    }
    Ok(())
}
