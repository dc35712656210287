//! Test entity bookkeeping.
//!
//! Every entity a test creates is registered by type and id so it can be
//! deleted again at the configured lifecycle checkpoints. Cleanup is best
//! effort: a record that fails to load or delete is logged and counted, and
//! the remaining records are still processed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::harness::TestModule;
use crate::result::{ProbeError, ProbeResult};

/// Free-form entity property values
pub type EntityValues = serde_json::Map<String, serde_json::Value>;

/// Default entity type for creation and lookups
pub const DEFAULT_ENTITY_TYPE: &str = "node";

/// Entity id, numeric for content entities and a machine name for config
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    /// Serial id
    Int(u64),
    /// String id
    Str(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// A loaded or freshly created entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity type id
    pub entity_type: String,
    /// Entity id
    pub id: EntityId,
    /// Property values
    #[serde(default)]
    pub values: EntityValues,
}

impl EntityRecord {
    /// Create a record
    #[must_use]
    pub fn new(entity_type: impl Into<String>, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            values: EntityValues::new(),
        }
    }

    /// Add a property value
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let _ = self.values.insert(key.into(), value.into());
        self
    }

    /// Get a property value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// String value of the `name` (or `title`) property
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.get("name")
            .or_else(|| self.get("title"))
            .and_then(serde_json::Value::as_str)
    }
}

/// A validation failure reported by storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Property path, e.g. `label.0.value`
    pub property_path: String,
    /// Message
    pub message: String,
}

impl Violation {
    /// Create a violation
    #[must_use]
    pub fn new(property_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property_path: property_path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property_path, self.message)
    }
}

/// Entity storage service of the site under test
pub trait EntityStorage {
    /// Whether storage can handle `entity_type`
    fn has_entity_type(&self, entity_type: &str) -> bool;

    /// Create and save an entity
    fn create(&mut self, entity_type: &str, values: &EntityValues) -> ProbeResult<EntityRecord>;

    /// Load every existing entity among `ids`; missing ids are skipped
    fn load_multiple(&self, entity_type: &str, ids: &[EntityId]) -> ProbeResult<Vec<EntityRecord>>;

    /// Delete an entity
    fn delete(&mut self, record: &EntityRecord) -> ProbeResult<()>;

    /// Load entities whose properties equal every value in `properties`
    fn load_by_properties(&self, entity_type: &str, properties: &EntityValues) -> ProbeResult<Vec<EntityRecord>>;

    /// Resolve the canonical entity behind a site-relative URL
    fn entity_from_url(&self, _url: &str) -> ProbeResult<Option<EntityRecord>> {
        Ok(None)
    }

    /// Validate values before creation
    fn validate(&self, _entity_type: &str, _values: &EntityValues) -> Vec<Violation> {
        Vec::new()
    }
}

fn default_true() -> bool {
    true
}

/// Which lifecycle checkpoints trigger cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPolicy {
    /// After every test
    #[serde(default = "default_true")]
    pub cleanup_test: bool,
    /// After a failed test
    #[serde(default = "default_true")]
    pub cleanup_failed: bool,
    /// After the suite
    #[serde(default = "default_true")]
    pub cleanup_suite: bool,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            cleanup_test: true,
            cleanup_failed: true,
            cleanup_suite: true,
        }
    }
}

impl CleanupPolicy {
    /// Never clean up automatically
    #[must_use]
    pub const fn manual() -> Self {
        Self {
            cleanup_test: false,
            cleanup_failed: false,
            cleanup_suite: false,
        }
    }

    /// Toggle cleanup after each test
    #[must_use]
    pub const fn with_cleanup_test(mut self, enabled: bool) -> Self {
        self.cleanup_test = enabled;
        self
    }

    /// Toggle cleanup after a failed test
    #[must_use]
    pub const fn with_cleanup_failed(mut self, enabled: bool) -> Self {
        self.cleanup_failed = enabled;
        self
    }

    /// Toggle cleanup after the suite
    #[must_use]
    pub const fn with_cleanup_suite(mut self, enabled: bool) -> Self {
        self.cleanup_suite = enabled;
        self
    }
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Records deleted
    pub deleted: usize,
    /// One message per record or type that could not be cleaned up
    pub failures: Vec<String>,
}

impl CleanupReport {
    /// Whether nothing failed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: Self) {
        self.deleted += other.deleted;
        self.failures.extend(other.failures);
    }
}

/// Registry of entities created during tests
#[derive(Debug)]
pub struct EntityRegistry<S: EntityStorage> {
    storage: S,
    entities: BTreeMap<String, Vec<EntityId>>,
    policy: CleanupPolicy,
}

impl<S: EntityStorage> EntityRegistry<S> {
    /// Create a registry over `storage`
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            entities: BTreeMap::new(),
            policy: CleanupPolicy::default(),
        }
    }

    /// Set the cleanup policy
    #[must_use]
    pub fn with_policy(mut self, policy: CleanupPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the cleanup policy
    #[must_use]
    pub const fn policy(&self) -> CleanupPolicy {
        self.policy
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

    /// Registered ids of `entity_type`
    #[must_use]
    pub fn registered(&self, entity_type: &str) -> &[EntityId] {
        self.entities.get(entity_type).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of registered ids over all types
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Track an entity for cleanup
    pub fn register(&mut self, entity_type: &str, id: impl Into<EntityId>) -> ProbeResult<()> {
        if !self.storage.has_entity_type(entity_type) {
            return Err(ProbeError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            });
        }
        let id = id.into();
        tracing::debug!(entity_type, %id, "registered test entity");
        self.entities.entry(entity_type.to_string()).or_default().push(id);
        Ok(())
    }

    /// Create an entity and register it
    pub fn create_entity(&mut self, values: &EntityValues, entity_type: &str) -> ProbeResult<EntityRecord> {
        let record = self
            .storage
            .create(entity_type, values)
            .map_err(|e| ProbeError::storage(entity_type, format!("Could not create entity. Error message: {e}")))?;
        self.register(&record.entity_type, record.id.clone())?;
        Ok(record)
    }

    /// Last entity of `entity_type` whose `name` property equals `name`
    pub fn entity_by_name(&self, name: &str, entity_type: &str) -> ProbeResult<Option<EntityRecord>> {
        let mut properties = EntityValues::new();
        let _ = properties.insert("name".to_string(), name.into());
        Ok(self.storage.load_by_properties(entity_type, &properties)?.pop())
    }

    /// Canonical entity behind a site-relative URL
    pub fn entity_from_url(&self, url: &str) -> ProbeResult<Option<EntityRecord>> {
        self.storage.entity_from_url(url)
    }

    /// Register the entity behind `url`, if there is one
    pub fn register_by_url(&mut self, url: &str) -> ProbeResult<Option<EntityRecord>> {
        let record = self.storage.entity_from_url(url)?;
        if let Some(record) = &record {
            self.register(&record.entity_type, record.id.clone())?;
        }
        Ok(record)
    }

    /// Delete every registered entity and clear the registry
    pub fn cleanup(&mut self) -> CleanupReport {
        let mut report = CleanupReport::default();
        for (entity_type, ids) in std::mem::take(&mut self.entities) {
            let records = match self.storage.load_multiple(&entity_type, &ids) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(%entity_type, error = %e, "could not load test entities");
                    report.failures.push(format!("{entity_type}: {e}"));
                    continue;
                }
            };
            for record in records {
                match self.storage.delete(&record) {
                    Ok(()) => report.deleted += 1,
                    Err(e) => {
                        tracing::warn!(%entity_type, id = %record.id, error = %e, "could not delete test entity");
                        report.failures.push(format!("{entity_type} {}: {e}", record.id));
                    }
                }
            }
        }
        tracing::info!(deleted = report.deleted, failed = report.failures.len(), "entity cleanup finished");
        report
    }

    /// Clean up at a lifecycle checkpoint, warning once if anything was left behind
    fn checkpoint(&mut self, stage: &str) -> CleanupReport {
        let report = self.cleanup();
        if !report.is_clean() {
            tracing::warn!(
                stage,
                failed = report.failures.len(),
                failures = ?report.failures,
                "entity cleanup left records behind"
            );
        }
        report
    }
}

impl<S: EntityStorage> TestModule for EntityRegistry<S> {
    fn name(&self) -> &str {
        "entity"
    }

    fn after(&mut self, _test: &str) -> ProbeResult<()> {
        if self.policy.cleanup_test {
            self.checkpoint("after test");
        }
        Ok(())
    }

    fn failed(&mut self, _test: &str, _error: &ProbeError) -> ProbeResult<()> {
        if self.policy.cleanup_failed {
            self.checkpoint("failed test");
        }
        Ok(())
    }

    fn after_suite(&mut self) -> ProbeResult<()> {
        if self.policy.cleanup_suite {
            self.checkpoint("after suite");
        }
        Ok(())
    }
}
