//! In-memory collaborators for unit testing.
//!
//! Each double records what it was asked to do so tests can assert on the
//! exact interaction, the same way a real site would observe it.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::bootstrap::{BootRequest, Kernel};
use crate::driver::{BrowserLogEntry, WebDriver};
use crate::entity::{EntityId, EntityRecord, EntityStorage, EntityValues, Violation};
use crate::events::{EventCollector, EventData};
use crate::group::GroupMembership;
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::watchdog::{LogEntry, LogStore, Severity};

/// Mock driver for unit testing
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Attribute values returned by `grab_attribute_from`, by attribute name
    pub attributes: BTreeMap<String, String>,
    /// Value returned by `execute_script`
    pub script_result: serde_json::Value,
    /// Pending browser log entries
    pub logs: Vec<BrowserLogEntry>,
    /// Methods that return an error
    pub failing: BTreeSet<String>,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of an attribute for every element
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let _ = self.attributes.insert(name.into(), value.into());
    }

    /// Queue a browser log entry
    pub fn push_log(&mut self, entry: BrowserLogEntry) {
        self.logs.push(entry);
    }

    /// Make `method` fail from now on
    pub fn fail_on(&mut self, method: impl Into<String>) {
        let _ = self.failing.insert(method.into());
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn record(&mut self, method: &str, call: String) -> ProbeResult<()> {
        self.call_history.push(call);
        if self.failing.contains(method) {
            Err(ProbeError::browser(format!("{method} failed")))
        } else {
            Ok(())
        }
    }
}

impl WebDriver for MockDriver {
    fn am_on_page(&mut self, url: &str) -> ProbeResult<()> {
        self.record("am_on_page", format!("am_on_page:{url}"))?;
        self.current_url = url.to_string();
        Ok(())
    }

    fn click(&mut self, locator: &Locator) -> ProbeResult<()> {
        self.record("click", format!("click:{}", locator.selector()))
    }

    fn fill_field(&mut self, locator: &Locator, text: &str) -> ProbeResult<()> {
        self.record("fill_field", format!("fill_field:{}={text}", locator.selector()))
    }

    fn select_option(&mut self, locator: &Locator, option: &str) -> ProbeResult<()> {
        self.record("select_option", format!("select_option:{}={option}", locator.selector()))
    }

    fn wait_for_element_clickable(&mut self, locator: &Locator) -> ProbeResult<()> {
        self.record(
            "wait_for_element_clickable",
            format!("wait_for_element_clickable:{}", locator.selector()),
        )
    }

    fn wait_for_element_not_visible(&mut self, locator: &Locator) -> ProbeResult<()> {
        self.record(
            "wait_for_element_not_visible",
            format!("wait_for_element_not_visible:{}", locator.selector()),
        )
    }

    fn grab_attribute_from(&mut self, locator: &Locator, attribute: &str) -> ProbeResult<String> {
        self.record(
            "grab_attribute_from",
            format!("grab_attribute_from:{}@{attribute}", locator.selector()),
        )?;
        self.attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| ProbeError::browser(format!("no mock value for attribute '{attribute}'")))
    }

    fn execute_script(&mut self, script: &str) -> ProbeResult<serde_json::Value> {
        self.record("execute_script", format!("execute_script:{script}"))?;
        Ok(self.script_result.clone())
    }

    fn wait(&mut self, duration: Duration) -> ProbeResult<()> {
        self.record("wait", format!("wait:{}ms", duration.as_millis()))
    }

    fn browser_logs(&mut self) -> ProbeResult<Vec<BrowserLogEntry>> {
        self.record("browser_logs", "browser_logs".to_string())?;
        Ok(std::mem::take(&mut self.logs))
    }
}

/// In-memory entity storage with sequential numeric ids
#[derive(Debug, Default)]
pub struct MemoryStorage {
    types: BTreeSet<String>,
    records: Vec<EntityRecord>,
    next_id: u64,
    routes: BTreeMap<String, (String, EntityId)>,
    violations: BTreeMap<String, Vec<Violation>>,
    failing_deletes: BTreeSet<(String, EntityId)>,
    delete_calls: Vec<(String, EntityId)>,
    memberships: BTreeSet<(EntityId, EntityId)>,
}

impl MemoryStorage {
    /// Storage that knows `types`
    #[must_use]
    pub fn with_types(types: &[&str]) -> Self {
        Self {
            types: types.iter().map(ToString::to_string).collect(),
            next_id: 1,
            ..Self::default()
        }
    }

    /// Store a record as is
    pub fn insert(&mut self, record: EntityRecord) {
        if let EntityId::Int(id) = record.id {
            self.next_id = self.next_id.max(id + 1);
        }
        self.records.push(record);
    }

    /// Make `url` resolve to an entity
    pub fn route(&mut self, url: impl Into<String>, entity_type: impl Into<String>, id: impl Into<EntityId>) {
        let _ = self.routes.insert(url.into(), (entity_type.into(), id.into()));
    }

    /// Report `violation` when validating `entity_type`
    pub fn add_violation(&mut self, entity_type: impl Into<String>, violation: Violation) {
        self.violations.entry(entity_type.into()).or_default().push(violation);
    }

    /// Make deleting one record fail
    pub fn fail_delete(&mut self, entity_type: impl Into<String>, id: impl Into<EntityId>) {
        let _ = self.failing_deletes.insert((entity_type.into(), id.into()));
    }

    /// Every delete call, failed ones included
    #[must_use]
    pub fn delete_calls(&self) -> &[(String, EntityId)] {
        &self.delete_calls
    }

    /// Look up a stored record
    #[must_use]
    pub fn get(&self, entity_type: &str, id: &EntityId) -> Option<&EntityRecord> {
        self.records
            .iter()
            .find(|r| r.entity_type == entity_type && &r.id == id)
    }

    /// Number of stored records of `entity_type`
    #[must_use]
    pub fn count(&self, entity_type: &str) -> usize {
        self.records.iter().filter(|r| r.entity_type == entity_type).count()
    }

    fn check_type(&self, entity_type: &str) -> ProbeResult<()> {
        if self.types.contains(entity_type) {
            Ok(())
        } else {
            Err(ProbeError::UnknownEntityType {
                entity_type: entity_type.to_string(),
            })
        }
    }
}

impl EntityStorage for MemoryStorage {
    fn has_entity_type(&self, entity_type: &str) -> bool {
        self.types.contains(entity_type)
    }

    fn create(&mut self, entity_type: &str, values: &EntityValues) -> ProbeResult<EntityRecord> {
        self.check_type(entity_type)?;
        let record = EntityRecord {
            entity_type: entity_type.to_string(),
            id: EntityId::Int(self.next_id),
            values: values.clone(),
        };
        self.next_id += 1;
        self.records.push(record.clone());
        Ok(record)
    }

    fn load_multiple(&self, entity_type: &str, ids: &[EntityId]) -> ProbeResult<Vec<EntityRecord>> {
        self.check_type(entity_type)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.get(entity_type, id).cloned())
            .collect())
    }

    fn delete(&mut self, record: &EntityRecord) -> ProbeResult<()> {
        let key = (record.entity_type.clone(), record.id.clone());
        self.delete_calls.push(key.clone());
        if self.failing_deletes.contains(&key) {
            return Err(ProbeError::storage(&record.entity_type, format!("cannot delete {}", record.id)));
        }
        self.records
            .retain(|r| !(r.entity_type == record.entity_type && r.id == record.id));
        Ok(())
    }

    fn load_by_properties(&self, entity_type: &str, properties: &EntityValues) -> ProbeResult<Vec<EntityRecord>> {
        self.check_type(entity_type)?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.entity_type == entity_type)
            .filter(|r| properties.iter().all(|(k, v)| r.values.get(k) == Some(v)))
            .cloned()
            .collect())
    }

    fn entity_from_url(&self, url: &str) -> ProbeResult<Option<EntityRecord>> {
        Ok(self
            .routes
            .get(url)
            .and_then(|(entity_type, id)| self.get(entity_type, id))
            .cloned())
    }

    fn validate(&self, entity_type: &str, _values: &EntityValues) -> Vec<Violation> {
        self.violations.get(entity_type).cloned().unwrap_or_default()
    }
}

impl GroupMembership for MemoryStorage {
    fn add_member(&mut self, group: &EntityId, user: &EntityId) -> ProbeResult<()> {
        let _ = self.memberships.insert((group.clone(), user.clone()));
        Ok(())
    }

    fn remove_member(&mut self, group: &EntityId, user: &EntityId) -> ProbeResult<()> {
        let _ = self.memberships.remove(&(group.clone(), user.clone()));
        Ok(())
    }

    fn is_member(&self, group: &EntityId, user: &EntityId) -> ProbeResult<bool> {
        Ok(self.memberships.contains(&(group.clone(), user.clone())))
    }
}

/// In-memory watchdog table
#[derive(Debug)]
pub struct MemoryLogStore {
    enabled: bool,
    entries: Vec<LogEntry>,
    next_wid: u64,
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLogStore {
    /// An enabled, empty log
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            entries: Vec::new(),
            next_wid: 1,
        }
    }

    /// A log whose database logging is switched off
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            entries: Vec::new(),
            next_wid: 1,
        }
    }

    /// Append an entry with the next row id
    pub fn log(&mut self, channel: &str, severity: Severity, message: &str) -> u64 {
        let wid = self.next_wid;
        self.next_wid += 1;
        self.entries.push(LogEntry::new(wid, channel, severity, message));
        wid
    }

    /// Append a prepared entry
    pub fn push(&mut self, entry: LogEntry) {
        self.next_wid = self.next_wid.max(entry.wid + 1);
        self.entries.push(entry);
    }

    /// Stored entries
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }
}

impl LogStore for MemoryLogStore {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn truncate(&mut self) -> ProbeResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn query(&self, max_severity: Severity, channel: Option<&str>) -> ProbeResult<Vec<LogEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.severity <= max_severity)
            .filter(|e| channel.map_or(true, |c| e.channel == c))
            .cloned()
            .collect())
    }
}

/// Event collector fed by the test
#[derive(Debug, Default)]
pub struct RecordingCollector {
    /// Event name to called listeners
    pub listeners: EventData,
    /// Event name to dispatch records of events without listeners
    pub orphans: EventData,
}

impl RecordingCollector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a listener call for `event`
    pub fn listener(&mut self, event: &str, listener: &str) {
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(listener.to_string());
    }

    /// Record a dispatch of `event` that nobody listened to
    pub fn orphan(&mut self, event: &str) {
        self.orphans
            .entry(event.to_string())
            .or_default()
            .push("dispatched".to_string());
    }
}

impl EventCollector for RecordingCollector {
    fn called_listeners(&self) -> ProbeResult<EventData> {
        Ok(self.listeners.clone())
    }

    fn orphaned_events(&self) -> ProbeResult<EventData> {
        Ok(self.orphans.clone())
    }
}

/// Kernel that remembers boot requests
#[derive(Debug, Default)]
pub struct MockKernel {
    /// Requests booted so far
    pub booted: Vec<BootRequest>,
    /// Error message to fail with
    pub failure: Option<String>,
}

impl MockKernel {
    /// A kernel that always boots
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A kernel that always fails with `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            booted: Vec::new(),
            failure: Some(message.into()),
        }
    }
}

impl Kernel for MockKernel {
    fn boot_test_environment(&mut self, request: &BootRequest) -> ProbeResult<()> {
        if let Some(message) = &self.failure {
            return Err(ProbeError::Bootstrap {
                message: message.clone(),
            });
        }
        self.booted.push(request.clone());
        Ok(())
    }
}
