//! Kernel bootstrap for functional tests.
//!
//! Resolves the Drupal root (configured, detected, or `<project>/web`) and
//! asks a [`Kernel`] to boot a test environment for one site directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::result::{ProbeError, ProbeResult};

/// Default site directory, relative to the root
pub const DEFAULT_SITE_PATH: &str = "sites/default";

/// File whose presence marks a Drupal root
pub const ROOT_MARKER: &str = "core/lib/Drupal.php";

/// Subdirectories that commonly hold the root in composer projects
pub const ROOT_SUBDIRECTORIES: [&str; 2] = ["web", "docroot"];

fn default_site_path() -> String {
    DEFAULT_SITE_PATH.to_string()
}

/// Bootstrap configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Drupal root; detected when absent
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Site directory relative to the root
    #[serde(default = "default_site_path")]
    pub site_path: String,
    /// Host name the request is made for
    #[serde(default)]
    pub http_host: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            root: None,
            site_path: default_site_path(),
            http_host: None,
        }
    }
}

impl BootstrapConfig {
    /// Set the root
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the site directory
    #[must_use]
    pub fn with_site_path(mut self, site_path: impl Into<String>) -> Self {
        self.site_path = site_path.into();
        self
    }

    /// Set the host name
    #[must_use]
    pub fn with_http_host(mut self, host: impl Into<String>) -> Self {
        self.http_host = Some(host.into());
        self
    }
}

fn is_drupal_root(dir: &Path) -> bool {
    dir.join(ROOT_MARKER).is_file()
}

/// Find the Drupal root at or above `start`, looking into `web/` and
/// `docroot/` at every level.
#[must_use]
pub fn find_drupal_root(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        std::iter::once(dir.to_path_buf())
            .chain(ROOT_SUBDIRECTORIES.iter().map(|sub| dir.join(sub)))
            .find(|candidate| is_drupal_root(candidate))
    })
}

/// What the kernel is asked to boot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootRequest {
    /// Drupal root
    pub root: PathBuf,
    /// Site directory relative to the root
    pub site_path: String,
    /// Host name for the synthetic request
    pub http_host: Option<String>,
}

/// The application kernel
pub trait Kernel {
    /// Boot the environment, settings and container for `request`
    fn boot_test_environment(&mut self, request: &BootRequest) -> ProbeResult<()>;
}

/// Bootstraps a kernel from configuration
#[derive(Debug, Clone, Default)]
pub struct DrupalBootstrap {
    config: BootstrapConfig,
}

impl DrupalBootstrap {
    /// Create a bootstrapper
    #[must_use]
    pub const fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Configured root, else the detected one, else `<project_dir>/web`
    #[must_use]
    pub fn resolve_root(&self, project_dir: &Path) -> PathBuf {
        if let Some(root) = &self.config.root {
            return root.clone();
        }
        find_drupal_root(project_dir).unwrap_or_else(|| {
            tracing::debug!(project = %project_dir.display(), "no drupal root found, using web/");
            project_dir.join("web")
        })
    }

    /// Build the boot request for `project_dir`
    pub fn request(&self, project_dir: &Path) -> ProbeResult<BootRequest> {
        let root = self.resolve_root(project_dir);
        if !root.is_dir() {
            return Err(ProbeError::Bootstrap {
                message: format!("Drupal root {} is not a directory", root.display()),
            });
        }
        Ok(BootRequest {
            root,
            site_path: self.config.site_path.clone(),
            http_host: self.config.http_host.clone(),
        })
    }

    /// Resolve the root and boot `kernel`
    pub fn boot<K: Kernel + ?Sized>(&self, project_dir: &Path, kernel: &mut K) -> ProbeResult<BootRequest> {
        let request = self.request(project_dir)?;
        tracing::info!(root = %request.root.display(), site = %request.site_path, "booting kernel");
        kernel.boot_test_environment(&request).map_err(|e| match e {
            ProbeError::Bootstrap { .. } => e,
            other => ProbeError::Bootstrap {
                message: other.to_string(),
            },
        })?;
        Ok(request)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::MockKernel;
    use std::fs;

    fn make_root(dir: &Path) {
        fs::create_dir_all(dir.join("core/lib")).unwrap();
        fs::write(dir.join(ROOT_MARKER), "<?php\n").unwrap();
    }

    mod finder_tests {
        use super::*;

        #[test]
        fn test_finds_root_in_web_subdirectory() {
            let project = tempfile::tempdir().unwrap();
            make_root(&project.path().join("web"));
            let nested = project.path().join("tests/acceptance");
            fs::create_dir_all(&nested).unwrap();
            assert_eq!(find_drupal_root(&nested), Some(project.path().join("web")));
        }

        #[test]
        fn test_finds_root_itself() {
            let root = tempfile::tempdir().unwrap();
            make_root(root.path());
            assert_eq!(find_drupal_root(root.path()), Some(root.path().to_path_buf()));
        }

        #[test]
        fn test_docroot() {
            let project = tempfile::tempdir().unwrap();
            make_root(&project.path().join("docroot"));
            assert_eq!(find_drupal_root(project.path()), Some(project.path().join("docroot")));
        }
    }

    mod boot_tests {
        use super::*;

        #[test]
        fn test_configured_root_wins() {
            let bootstrap = DrupalBootstrap::new(BootstrapConfig::default().with_root("/srv/site"));
            assert_eq!(bootstrap.resolve_root(Path::new("/tmp")), PathBuf::from("/srv/site"));
        }

        #[test]
        fn test_fallback_to_web() {
            let project = tempfile::tempdir().unwrap();
            let bootstrap = DrupalBootstrap::default();
            assert_eq!(bootstrap.resolve_root(project.path()), project.path().join("web"));
        }

        #[test]
        fn test_boot_passes_request_to_kernel() {
            let project = tempfile::tempdir().unwrap();
            make_root(&project.path().join("web"));
            let bootstrap = DrupalBootstrap::new(BootstrapConfig::default().with_http_host("site.test"));
            let mut kernel = MockKernel::new();
            let request = bootstrap.boot(project.path(), &mut kernel).unwrap();
            assert_eq!(request.site_path, "sites/default");
            assert_eq!(kernel.booted, vec![request]);
        }

        #[test]
        fn test_missing_root_is_bootstrap_error() {
            let project = tempfile::tempdir().unwrap();
            let mut kernel = MockKernel::new();
            let err = DrupalBootstrap::default().boot(project.path(), &mut kernel).unwrap_err();
            assert!(matches!(err, ProbeError::Bootstrap { .. }));
            assert!(kernel.booted.is_empty());
        }

        #[test]
        fn test_kernel_failure_is_wrapped() {
            let project = tempfile::tempdir().unwrap();
            make_root(project.path());
            let mut kernel = MockKernel::failing("settings.php missing");
            let err = DrupalBootstrap::new(BootstrapConfig::default().with_root(project.path()))
                .boot(project.path(), &mut kernel)
                .unwrap_err();
            assert!(err.to_string().contains("settings.php missing"));
        }
    }
}
