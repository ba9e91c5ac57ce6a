//! Emulated controller: an arena of control groups behind one coarse state
//! lock.

use crate::controller::group::{ControlGroup, GroupError};
use crate::controller::reference::InputSource;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Index-stable handle to a group in a controller's arena. Groups are owned
/// by the arena and referenced by index, never by address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupId(pub(crate) usize);

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("no group with id {0:?}")]
    UnknownGroup(GroupId),

    #[error("no group named '{0}'")]
    UnknownGroupName(String),

    #[error("frame buffer has {got} bytes, expected {expected}")]
    FrameSize { expected: usize, got: usize },

    #[error(transparent)]
    Group(#[from] GroupError),
}

/// The lock-protected arena: every group of one emulated device, in protocol
/// order. Built once at controller construction; no add/remove afterwards.
#[derive(Debug, Default)]
pub struct ControllerState {
    groups: Vec<ControlGroup>,
}

impl ControllerState {
    /// Construction-time only: append a group and hand back its id.
    pub fn add_group(&mut self, group: ControlGroup) -> GroupId {
        debug!(
            "Adding group '{}' ({:?}) at index {}",
            group.name(),
            group.kind(),
            self.groups.len()
        );
        self.groups.push(group);
        GroupId(self.groups.len() - 1)
    }

    /// Fails loudly on a stale or foreign id; a silently substituted group
    /// would corrupt downstream frame layout.
    pub fn group(&self, id: GroupId) -> Result<&ControlGroup, ControllerError> {
        self.groups.get(id.0).ok_or(ControllerError::UnknownGroup(id))
    }

    pub fn group_mut(&mut self, id: GroupId) -> Result<&mut ControlGroup, ControllerError> {
        self.groups
            .get_mut(id.0)
            .ok_or(ControllerError::UnknownGroup(id))
    }

    pub fn group_by_name(&self, name: &str) -> Result<&ControlGroup, ControllerError> {
        self.groups
            .iter()
            .find(|group| group.name() == name)
            .ok_or_else(|| ControllerError::UnknownGroupName(name.to_string()))
    }

    pub fn group_mut_by_name(&mut self, name: &str) -> Result<&mut ControlGroup, ControllerError> {
        self.groups
            .iter_mut()
            .find(|group| group.name() == name)
            .ok_or_else(|| ControllerError::UnknownGroupName(name.to_string()))
    }

    pub fn groups(&self) -> &[ControlGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [ControlGroup] {
        &mut self.groups
    }

    /// Refresh every control reference from the device backend.
    pub fn update_references(&mut self, source: &dyn InputSource) {
        for group in &mut self.groups {
            group.update_references(source);
        }
    }
}

/// One emulated device: an ordered set of control groups living for the
/// device session, shared between the emulation producer and read-only
/// pollers.
pub struct EmulatedController {
    name: String,
    state: Mutex<ControllerState>,
}

impl EmulatedController {
    pub fn new(name: impl Into<String>, state: ControllerState) -> Self {
        let name = name.into();
        info!(
            "Created emulated controller '{}' with {} groups",
            name,
            state.groups.len()
        );
        Self {
            name,
            state: Mutex::new(state),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scoped whole-controller lock. Everything read under one guard is a
    /// consistent snapshot; nothing is promised across separate guards.
    /// Callers must not hold the guard across blocking operations.
    pub fn state_lock(&self) -> MutexGuard<'_, ControllerState> {
        // Derivation is pure over cached samples, so a poisoned lock still
        // holds usable state.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
