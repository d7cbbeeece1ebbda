use super::contribution::Contribution;
use super::group::{ActorId, Group, GroupId};
use super::membership::Membership;
use crate::error::Result;
use async_trait::async_trait;

/// Storage port for groups. `insert`/`update` are whole-row puts keyed by
/// the group id; id allocation is the store's responsibility so backends can
/// persist their counter.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn allocate_id(&self) -> Result<GroupId>;
    async fn insert(&self, group: Group) -> Result<()>;
    async fn get(&self, id: GroupId) -> Result<Option<Group>>;
    async fn update(&self, group: Group) -> Result<()>;
    async fn all(&self) -> Result<Vec<Group>>;
}

/// Storage port for memberships.
///
/// `insert` must atomically reject a duplicate `(group, actor)` pair or a
/// duplicate `(group, position)` with `TontineError::Conflict` — the
/// uniqueness constraints live in the store, not in caller-side checks.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn insert(&self, membership: Membership) -> Result<()>;
    async fn get(&self, group: GroupId, actor: ActorId) -> Result<Option<Membership>>;
    async fn update(&self, membership: Membership) -> Result<()>;
    /// All memberships of a group, ordered by position ascending.
    async fn for_group(&self, group: GroupId) -> Result<Vec<Membership>>;
    async fn group_ids_for_actor(&self, actor: ActorId) -> Result<Vec<GroupId>>;
}

/// Storage port for contributions.
///
/// `insert` must atomically reject a duplicate `(group, actor, round)`
/// triple with `TontineError::Conflict`. Rows are immutable once inserted.
#[async_trait]
pub trait ContributionStore: Send + Sync {
    async fn insert(&self, contribution: Contribution) -> Result<()>;
    async fn get(
        &self,
        group: GroupId,
        actor: ActorId,
        round: u32,
    ) -> Result<Option<Contribution>>;
    async fn for_round(&self, group: GroupId, round: u32) -> Result<Vec<Contribution>>;
}

pub type GroupStoreBox = Box<dyn GroupStore>;
pub type MembershipStoreBox = Box<dyn MembershipStore>;
pub type ContributionStoreBox = Box<dyn ContributionStore>;
