//! Per-user flow state.
//!
//! A user is inside at most one multi-step flow. All three flow kinds live in one map
//! keyed by user id, so writing a new state replaces whatever was there and the
//! "at most one" rule holds by construction.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::Serialize;

use crate::domain::{GroupId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "flow", rename_all = "snake_case")]
pub enum FlowState {
    AwaitingGroupName,
    AwaitingInviteeMentions { group_id: GroupId },
    AwaitingWishDetails { group_id: GroupId },
}

/// Mutable flow store, owned by the router.
///
/// Notification tasks never receive this type; code that only needs to look at flows
/// gets a [`FlowReader`].
#[derive(Debug, Default)]
pub struct FlowStore {
    inner: Arc<Mutex<HashMap<UserId, FlowState>>>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, FlowState>> {
        // The map stays consistent even if a holder panicked mid-insert.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set(&self, user_id: UserId, state: FlowState) {
        tracing::debug!(user_id = user_id.0, ?state, "setting flow state");
        self.lock().insert(user_id, state);
    }

    pub fn set_group_creation(&self, user_id: UserId) {
        self.set(user_id, FlowState::AwaitingGroupName);
    }

    pub fn set_invite_creation(&self, user_id: UserId, group_id: GroupId) {
        self.set(user_id, FlowState::AwaitingInviteeMentions { group_id });
    }

    pub fn set_wish_creation(&self, user_id: UserId, group_id: GroupId) {
        self.set(user_id, FlowState::AwaitingWishDetails { group_id });
    }

    /// Clear every flow for the user. Safe when nothing is set.
    pub fn release(&self, user_id: UserId) {
        if let Some(prev) = self.lock().remove(&user_id) {
            tracing::debug!(user_id = user_id.0, ?prev, "released flow state");
        }
    }

    pub fn current(&self, user_id: UserId) -> Option<FlowState> {
        self.lock().get(&user_id).copied()
    }

    pub fn is_group_creation(&self, user_id: UserId) -> bool {
        matches!(self.current(user_id), Some(FlowState::AwaitingGroupName))
    }

    pub fn is_invite_creation(&self, user_id: UserId) -> bool {
        self.invite_group_id(user_id).is_some()
    }

    pub fn is_wish_creation(&self, user_id: UserId) -> bool {
        self.wish_group_id(user_id).is_some()
    }

    pub fn invite_group_id(&self, user_id: UserId) -> Option<GroupId> {
        match self.current(user_id) {
            Some(FlowState::AwaitingInviteeMentions { group_id }) => Some(group_id),
            _ => None,
        }
    }

    pub fn wish_group_id(&self, user_id: UserId) -> Option<GroupId> {
        match self.current(user_id) {
            Some(FlowState::AwaitingWishDetails { group_id }) => Some(group_id),
            _ => None,
        }
    }

    pub fn reader(&self) -> FlowReader {
        FlowReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Read-only view of the flow store for code running beside the router.
#[derive(Clone, Debug)]
pub struct FlowReader {
    inner: Arc<Mutex<HashMap<UserId, FlowState>>>,
}

impl FlowReader {
    pub fn current(&self, user_id: UserId) -> Option<FlowState> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        map.get(&user_id).copied()
    }

    /// All active flows, ordered by user id.
    pub fn snapshot(&self) -> Vec<(UserId, FlowState)> {
        let map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut out: Vec<(UserId, FlowState)> = map.iter().map(|(u, s)| (*u, *s)).collect();
        out.sort_by_key(|(u, _)| *u);
        out
    }
}
