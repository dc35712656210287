//! Suite configuration.
//!
//! One YAML document with a block per module. Every block has defaults, so
//! an empty document is a valid configuration.
//!
//! ```yaml
//! drush:
//!   alias: "@self"
//!   options:
//!     uri: http://site.test
//! watchdog:
//!   channels:
//!     php: WARNING
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::bootstrap::BootstrapConfig;
use crate::drush::DrushConfig;
use crate::entity::CleanupPolicy;
use crate::result::{ProbeError, ProbeResult};
use crate::user::UserConfig;
use crate::watchdog::WatchdogConfig;

/// Browser-facing settings of acceptance suites
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Site under test
    pub base_url: Option<String>,
    /// Default wait for elements, in milliseconds
    pub timeout_ms: Option<u64>,
}

impl AcceptanceConfig {
    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the element timeout
    #[must_use]
    pub const fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Element timeout as a duration
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Join `path` onto the base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')),
            None => path.to_string(),
        }
    }
}

/// Configuration for every module of a suite
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Kernel bootstrap
    pub bootstrap: BootstrapConfig,
    /// Drush runner
    pub drush: DrushConfig,
    /// Entity registry cleanup
    pub entity: CleanupPolicy,
    /// Test users
    pub user: UserConfig,
    /// Watchdog checks
    pub watchdog: WatchdogConfig,
    /// Browser settings
    pub acceptance: AcceptanceConfig,
}

impl SuiteConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Read and parse a YAML file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ProbeError::config(format!("cannot read {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loading suite configuration");
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Set the bootstrap block
    #[must_use]
    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set the drush block
    #[must_use]
    pub fn with_drush(mut self, drush: DrushConfig) -> Self {
        self.drush = drush;
        self
    }

    /// Set the entity cleanup policy
    #[must_use]
    pub const fn with_entity(mut self, entity: CleanupPolicy) -> Self {
        self.entity = entity;
        self
    }

    /// Set the user block
    #[must_use]
    pub fn with_user(mut self, user: UserConfig) -> Self {
        self.user = user;
        self
    }

    /// Set the watchdog block
    #[must_use]
    pub fn with_watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Set the acceptance block
    #[must_use]
    pub fn with_acceptance(mut self, acceptance: AcceptanceConfig) -> Self {
        self.acceptance = acceptance;
        self
    }
}
