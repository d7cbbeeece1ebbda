use crate::domain::contribution::Contribution;
use crate::domain::group::{ActorId, Group, GroupId};
use crate::domain::membership::Membership;
use crate::domain::ports::{ContributionStore, GroupStore, MembershipStore};
use crate::error::{Result, TontineError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Thread-safe in-memory group store.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access and an
/// `AtomicU64` for id allocation. Ideal for tests and single-process runs.
#[derive(Default, Clone)]
pub struct InMemoryGroupStore {
    groups: Arc<RwLock<HashMap<GroupId, Group>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupStore for InMemoryGroupStore {
    async fn allocate_id(&self) -> Result<GroupId> {
        Ok(GroupId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn insert(&self, group: Group) -> Result<()> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id, group);
        Ok(())
    }

    async fn get(&self, id: GroupId) -> Result<Option<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.get(&id).cloned())
    }

    async fn update(&self, group: Group) -> Result<()> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id, group);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Group>> {
        let groups = self.groups.read().await;
        let mut all: Vec<Group> = groups.values().cloned().collect();
        all.sort_by_key(|g| g.id);
        Ok(all)
    }
}

/// Thread-safe in-memory membership store.
///
/// Both uniqueness constraints are checked under the single write-lock
/// acquisition inside `insert`, so a concurrent duplicate join cannot slip
/// through a check-then-insert window.
#[derive(Default, Clone)]
pub struct InMemoryMembershipStore {
    memberships: Arc<RwLock<HashMap<(GroupId, ActorId), Membership>>>,
}

impl InMemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembershipStore {
    async fn insert(&self, membership: Membership) -> Result<()> {
        let mut memberships = self.memberships.write().await;
        let key = (membership.group_id, membership.actor_id);
        if memberships.contains_key(&key) {
            return Err(TontineError::Conflict(format!(
                "actor {} is already a participant of group {}",
                membership.actor_id, membership.group_id
            )));
        }
        if memberships
            .values()
            .any(|m| m.group_id == membership.group_id && m.position == membership.position)
        {
            return Err(TontineError::Conflict(format!(
                "position {} is already taken in group {}",
                membership.position, membership.group_id
            )));
        }
        memberships.insert(key, membership);
        Ok(())
    }

    async fn get(&self, group: GroupId, actor: ActorId) -> Result<Option<Membership>> {
        let memberships = self.memberships.read().await;
        Ok(memberships.get(&(group, actor)).cloned())
    }

    async fn update(&self, membership: Membership) -> Result<()> {
        let mut memberships = self.memberships.write().await;
        let key = (membership.group_id, membership.actor_id);
        if !memberships.contains_key(&key) {
            return Err(TontineError::NotFound(format!(
                "membership of actor {} in group {}",
                membership.actor_id, membership.group_id
            )));
        }
        memberships.insert(key, membership);
        Ok(())
    }

    async fn for_group(&self, group: GroupId) -> Result<Vec<Membership>> {
        let memberships = self.memberships.read().await;
        let mut members: Vec<Membership> = memberships
            .values()
            .filter(|m| m.group_id == group)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.position);
        Ok(members)
    }

    async fn group_ids_for_actor(&self, actor: ActorId) -> Result<Vec<GroupId>> {
        let memberships = self.memberships.read().await;
        let mut ids: Vec<GroupId> = memberships
            .values()
            .filter(|m| m.actor_id == actor)
            .map(|m| m.group_id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

/// Thread-safe in-memory contribution store keyed by the unique
/// `(group, actor, round)` triple.
#[derive(Default, Clone)]
pub struct InMemoryContributionStore {
    contributions: Arc<RwLock<HashMap<(GroupId, ActorId, u32), Contribution>>>,
}

impl InMemoryContributionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContributionStore for InMemoryContributionStore {
    async fn insert(&self, contribution: Contribution) -> Result<()> {
        let mut contributions = self.contributions.write().await;
        let key = (
            contribution.group_id,
            contribution.actor_id,
            contribution.round_number,
        );
        if contributions.contains_key(&key) {
            return Err(TontineError::Conflict(format!(
                "actor {} has already paid for round {} of group {}",
                contribution.actor_id, contribution.round_number, contribution.group_id
            )));
        }
        contributions.insert(key, contribution);
        Ok(())
    }

    async fn get(
        &self,
        group: GroupId,
        actor: ActorId,
        round: u32,
    ) -> Result<Option<Contribution>> {
        let contributions = self.contributions.read().await;
        Ok(contributions.get(&(group, actor, round)).cloned())
    }

    async fn for_round(&self, group: GroupId, round: u32) -> Result<Vec<Contribution>> {
        let contributions = self.contributions.read().await;
        Ok(contributions
            .values()
            .filter(|c| c.group_id == group && c.round_number == round)
            .cloned()
            .collect())
    }
}
