//! Group entities and membership.

use crate::entity::{EntityId, EntityRecord, EntityRegistry, EntityStorage, EntityValues};
use crate::result::{ProbeError, ProbeResult};

/// Entity type of groups
pub const GROUP_ENTITY_TYPE: &str = "group";

/// Owner used when the values carry no `uid`
pub const DEFAULT_GROUP_OWNER: u64 = 1;

/// Membership operations of the group module
pub trait GroupMembership {
    /// Add `user` to `group`
    fn add_member(&mut self, group: &EntityId, user: &EntityId) -> ProbeResult<()>;

    /// Remove `user` from `group`
    fn remove_member(&mut self, group: &EntityId, user: &EntityId) -> ProbeResult<()>;

    /// Whether `user` belongs to `group`
    fn is_member(&self, group: &EntityId, user: &EntityId) -> ProbeResult<bool>;
}

/// Add `user` to `group`; true when the membership exists afterwards
pub fn join_group<M: GroupMembership + ?Sized>(
    membership: &mut M,
    group: &EntityId,
    user: &EntityId,
) -> ProbeResult<bool> {
    membership.add_member(group, user)?;
    membership.is_member(group, user)
}

/// Remove `user` from `group`; true when the membership is gone afterwards
pub fn leave_group<M: GroupMembership + ?Sized>(
    membership: &mut M,
    group: &EntityId,
    user: &EntityId,
) -> ProbeResult<bool> {
    membership.remove_member(group, user)?;
    Ok(!membership.is_member(group, user)?)
}

fn creation_error(message: impl std::fmt::Display) -> ProbeError {
    ProbeError::storage(
        GROUP_ENTITY_TYPE,
        format!("Could not create group entity. Error message: {message}"),
    )
}

impl<S: EntityStorage> EntityRegistry<S> {
    /// Create a group owned by `values["uid"]` (user 1 by default) and
    /// register it for cleanup. With `validate`, storage violations abort
    /// creation and are listed as `path: message` lines.
    pub fn create_group(&mut self, values: &EntityValues, validate: bool) -> ProbeResult<EntityRecord> {
        let mut values = values.clone();
        let _ = values
            .entry("uid")
            .or_insert_with(|| DEFAULT_GROUP_OWNER.into());

        if validate {
            let violations = self.storage().validate(GROUP_ENTITY_TYPE, &values);
            if !violations.is_empty() {
                let lines: String = violations.iter().map(|v| format!("\n{v}")).collect();
                return Err(creation_error(lines));
            }
        }

        let record = self
            .storage_mut()
            .create(GROUP_ENTITY_TYPE, &values)
            .map_err(creation_error)?;
        self.register(&record.entity_type, record.id.clone())?;
        Ok(record)
    }
}
