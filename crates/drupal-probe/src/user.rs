//! Test users.
//!
//! Creates throwaway accounts with random credentials, logs the browser in
//! through a one-time login link, and deletes the accounts (and, optionally,
//! content they own) at the configured checkpoints.

use serde::{Deserialize, Serialize};

use crate::driver::WebDriver;
use crate::drush::Drush;
use crate::entity::{CleanupPolicy, CleanupReport, EntityId, EntityStorage, EntityValues};
use crate::harness::TestModule;
use crate::result::{ProbeError, ProbeResult};

/// Entity type of user accounts
pub const USER_ENTITY_TYPE: &str = "user";

/// Role given when none is requested
pub const DEFAULT_ROLE: &str = "authenticated";

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// User module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Role for users created without roles
    #[serde(default = "default_role")]
    pub default_role: String,
    /// Entity types whose content owned by a test user is deleted with it
    #[serde(default)]
    pub cleanup_entities: Vec<String>,
    /// Cleanup checkpoints
    #[serde(flatten)]
    pub cleanup: CleanupPolicy,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            default_role: default_role(),
            cleanup_entities: Vec::new(),
            cleanup: CleanupPolicy::default(),
        }
    }
}

impl UserConfig {
    /// Set the default role
    #[must_use]
    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = role.into();
        self
    }

    /// Delete content of `entity_type` owned by test users
    #[must_use]
    pub fn with_cleanup_entity(mut self, entity_type: impl Into<String>) -> Self {
        self.cleanup_entities.push(entity_type.into());
        self
    }

    /// Set the cleanup checkpoints
    #[must_use]
    pub const fn with_cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.cleanup = cleanup;
        self
    }
}

/// Credentials of a created user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    /// User id
    pub id: EntityId,
    /// Account name
    pub name: String,
    /// E-mail address
    pub mail: String,
    /// Plain text password
    pub password: String,
    /// Roles
    pub roles: Vec<String>,
}

fn random_token(len: usize) -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(len);
    token
}

fn id_value(id: &EntityId) -> serde_json::Value {
    match id {
        EntityId::Int(id) => (*id).into(),
        EntityId::Str(id) => id.as_str().into(),
    }
}

/// Creates, logs in and cleans up test users
#[derive(Debug)]
pub struct UserManager<S: EntityStorage> {
    storage: S,
    config: UserConfig,
    users: Vec<EntityId>,
}

impl<S: EntityStorage> UserManager<S> {
    /// Create a manager over `storage`
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            config: UserConfig::default(),
            users: Vec::new(),
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: UserConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &UserConfig {
        &self.config
    }

    /// Borrow the storage
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Borrow the storage mutably
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Ids of users created and not yet cleaned up
    #[must_use]
    pub fn users(&self) -> &[EntityId] {
        &self.users
    }

    /// Create an active user with random credentials
    pub fn create_user_with_roles(&mut self, roles: &[&str], password: Option<&str>) -> ProbeResult<TestUser> {
        let roles: Vec<String> = if roles.is_empty() {
            vec![self.config.default_role.clone()]
        } else {
            roles.iter().map(ToString::to_string).collect()
        };
        let name = format!("user_{}", random_token(12));
        let mail = format!("{name}@example.com");
        let password = password.map_or_else(|| random_token(14), ToString::to_string);

        let mut values = EntityValues::new();
        let _ = values.insert("name".into(), name.as_str().into());
        let _ = values.insert("mail".into(), mail.as_str().into());
        let _ = values.insert("roles".into(), roles.clone().into());
        let _ = values.insert("pass".into(), password.as_str().into());
        let _ = values.insert("status".into(), 1_u64.into());

        let record = self.storage.create(USER_ENTITY_TYPE, &values).map_err(|e| {
            ProbeError::storage(
                USER_ENTITY_TYPE,
                format!("Could not create user with roles: {}. Error: {e}", roles.join(", ")),
            )
        })?;
        tracing::debug!(user = %name, id = %record.id, "created test user");
        self.users.push(record.id.clone());

        Ok(TestUser {
            id: record.id,
            name,
            mail,
            password,
            roles,
        })
    }

    /// Open a one-time login link for `username` in the browser
    pub fn log_in_as<D: WebDriver + ?Sized>(&self, drush: &Drush, driver: &mut D, username: &str) -> ProbeResult<String> {
        let path = drush.login_uri(Some(username))?;
        driver.am_on_page(&path)?;
        Ok(path)
    }

    /// Create a user with `role` and log in as it
    pub fn log_in_with_role<D: WebDriver + ?Sized>(
        &mut self,
        role: &str,
        drush: &Drush,
        driver: &mut D,
    ) -> ProbeResult<TestUser> {
        let user = self.create_user_with_roles(&[role], None)?;
        let _ = self.log_in_as(drush, driver, &user.name)?;
        Ok(user)
    }

    fn delete_users_content(&mut self, uid: &EntityId, errors: &mut Vec<String>, report: &mut CleanupReport) {
        let mut properties = EntityValues::new();
        let _ = properties.insert("uid".into(), id_value(uid));

        for entity_type in &self.config.cleanup_entities {
            if !self.storage.has_entity_type(entity_type) {
                errors.push(format!("Could not load storage {entity_type}"));
                continue;
            }
            let Ok(records) = self.storage.load_by_properties(entity_type, &properties) else {
                errors.push(format!("Could not load entities of type {entity_type} by uid {uid}"));
                continue;
            };
            for record in records {
                match self.storage.delete(&record) {
                    Ok(()) => report.deleted += 1,
                    Err(e) => errors.push(e.to_string()),
                }
            }
        }
    }

    /// Delete every test user and their configured content.
    ///
    /// A user that cannot be deleted is skipped. Content deletion problems
    /// are collected and returned as one error once every user is processed.
    pub fn cleanup(&mut self) -> ProbeResult<CleanupReport> {
        let mut report = CleanupReport::default();
        let ids = std::mem::take(&mut self.users);
        if ids.is_empty() {
            return Ok(report);
        }

        let mut errors = Vec::new();
        for user in self.storage.load_multiple(USER_ENTITY_TYPE, &ids)? {
            self.delete_users_content(&user.id, &mut errors, &mut report);
            match self.storage.delete(&user) {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::warn!(id = %user.id, error = %e, "could not delete test user");
                    report.failures.push(format!("user {}: {e}", user.id));
                }
            }
        }
        tracing::info!(deleted = report.deleted, "user cleanup finished");

        if errors.is_empty() {
            Ok(report)
        } else {
            Err(ProbeError::storage(USER_ENTITY_TYPE, errors.join("\n")))
        }
    }
}

impl<S: EntityStorage> TestModule for UserManager<S> {
    fn name(&self) -> &str {
        "user"
    }

    fn after(&mut self, _test: &str) -> ProbeResult<()> {
        if self.config.cleanup.cleanup_test {
            let _ = self.cleanup()?;
        }
        Ok(())
    }

    fn failed(&mut self, _test: &str, _error: &ProbeError) -> ProbeResult<()> {
        if self.config.cleanup.cleanup_failed {
            let _ = self.cleanup()?;
        }
        Ok(())
    }

    fn after_suite(&mut self) -> ProbeResult<()> {
        if self.config.cleanup.cleanup_suite {
            let _ = self.cleanup()?;
        }
        Ok(())
    }
}
