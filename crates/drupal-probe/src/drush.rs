//! Drush command runner.
//!
//! Builds the argument vector from configuration (options, then site alias,
//! then the command tokens) and runs drush either to completion or in the
//! background. Any non-zero exit status is an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::result::{ProbeError, ProbeResult};

/// Default drush executable
pub const DEFAULT_DRUSH: &str = "drush";

/// Marker of the one-time login path in `drush uli` output
pub const LOGIN_PATH_MARKER: &str = "/user/reset";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Drush configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrushConfig {
    /// Executable name or path
    pub drush: String,
    /// Working directory for every invocation
    pub working_directory: Option<PathBuf>,
    /// Site alias placed before the command, e.g. `@mysite`
    pub alias: String,
    /// Global options rendered as `--key=value`, or `--key` when empty
    pub options: BTreeMap<String, String>,
    /// Kill the command after this many seconds
    pub timeout_secs: Option<u64>,
}

impl Default for DrushConfig {
    fn default() -> Self {
        Self {
            drush: DEFAULT_DRUSH.to_string(),
            working_directory: None,
            alias: String::new(),
            options: BTreeMap::new(),
            timeout_secs: None,
        }
    }
}

impl DrushConfig {
    /// Set the executable
    #[must_use]
    pub fn with_drush(mut self, drush: impl Into<String>) -> Self {
        self.drush = drush.into();
        self
    }

    /// Set the working directory
    #[must_use]
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    /// Set the site alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Add a global option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.options.insert(key.into(), value.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Timeout as a duration
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// How [`Drush::execute`] runs the command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Wait for completion and capture stdout
    #[default]
    Capture,
    /// Return the running process
    Background,
}

/// Result of [`Drush::execute`]
#[derive(Debug)]
pub enum DrushOutput {
    /// Newline-stripped, trimmed stdout
    Output(String),
    /// The running process
    Process(Child),
}

/// Drush runner
#[derive(Debug, Clone, Default)]
pub struct Drush {
    config: DrushConfig,
}

impl Drush {
    /// Create a runner
    #[must_use]
    pub const fn new(config: DrushConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &DrushConfig {
        &self.config
    }

    fn arguments<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut out: Vec<String> = self
            .config
            .options
            .iter()
            .map(|(key, value)| {
                if value.is_empty() {
                    format!("--{key}")
                } else {
                    format!("--{key}={value}")
                }
            })
            .collect();
        if !self.config.alias.is_empty() {
            out.push(self.config.alias.clone());
        }
        out.extend(args.iter().map(|a| a.as_ref().to_string()));
        out
    }

    fn split(command: &str) -> Vec<&str> {
        command.split_whitespace().collect()
    }

    /// Full argument vector, executable first
    #[must_use]
    pub fn command_line(&self, command: &str) -> Vec<String> {
        let mut line = vec![self.config.drush.clone()];
        line.extend(self.arguments(&Self::split(command)));
        line
    }

    /// Everything after the executable, joined by spaces
    #[must_use]
    pub fn invocation(&self, command: &str) -> String {
        self.arguments(&Self::split(command)).join(" ")
    }

    fn build(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.config.drush);
        cmd.args(args);
        if let Some(dir) = &self.config.working_directory {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Run `command` (split on whitespace) to completion
    pub fn run(&self, command: &str) -> ProbeResult<String> {
        self.run_args(&Self::split(command))
    }

    /// Run with pre-split arguments, so values may contain spaces
    pub fn run_args<S: AsRef<str>>(&self, args: &[S]) -> ProbeResult<String> {
        let args = self.arguments(args);
        let command_line = format!("{} {}", self.config.drush, args.join(" "));
        tracing::info!(command = %command_line, "running drush");

        let mut child = self
            .build(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = match self.config.timeout() {
            Some(timeout) => wait_with_timeout(&mut child, timeout, &command_line)?,
            None => child.wait()?,
        };
        let stdout = join_reader(stdout);
        let stderr = join_reader(stderr);

        if status.success() {
            Ok(strip_output(&stdout))
        } else {
            Err(ProbeError::CommandExecution {
                command: command_line,
                status: status.to_string(),
                output: format!("{stderr}{stdout}"),
            })
        }
    }

    /// Start `command` and return the process without waiting
    pub fn spawn(&self, command: &str) -> ProbeResult<Child> {
        let args = self.arguments(&Self::split(command));
        tracing::info!(command = %self.config.drush, ?args, "spawning drush");
        Ok(self.build(&args).spawn()?)
    }

    /// Run or spawn depending on `mode`
    pub fn execute(&self, command: &str, mode: ExecutionMode) -> ProbeResult<DrushOutput> {
        match mode {
            ExecutionMode::Capture => self.run(command).map(DrushOutput::Output),
            ExecutionMode::Background => self.spawn(command).map(DrushOutput::Process),
        }
    }

    /// Arguments of `drush uli`, optionally for a named user
    #[must_use]
    pub fn login_args(name: Option<&str>) -> Vec<String> {
        let mut args = vec!["uli".to_string()];
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            args.push(format!("--name={name}"));
        }
        args
    }

    /// One-time login path for `name` (or the superuser)
    pub fn login_uri(&self, name: Option<&str>) -> ProbeResult<String> {
        let output = self.run_args(&Self::login_args(name))?;
        Ok(extract_login_path(&output).to_string())
    }
}

/// Drop every line break and surrounding whitespace
#[must_use]
pub fn strip_output(output: &str) -> String {
    output.replace(['\n', '\r'], "").trim().to_string()
}

/// The part of `output` starting at `/user/reset`, or all of it
#[must_use]
pub fn extract_login_path(output: &str) -> &str {
    output
        .find(LOGIN_PATH_MARKER)
        .map_or(output, |idx| &output[idx..])
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<thread::JoinHandle<String>> {
    source.map(|mut source| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = source.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    command: &str,
) -> ProbeResult<std::process::ExitStatus> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            tracing::warn!(command, ?timeout, "drush timed out, killing");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProbeError::CommandTimeout {
                command: command.to_string(),
                ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}
