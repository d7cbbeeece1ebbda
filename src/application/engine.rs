use crate::domain::contribution::Contribution;
use crate::domain::group::{ActorId, Amount, Group, GroupId, GroupStatus};
use crate::domain::membership::Membership;
use crate::domain::ports::{ContributionStoreBox, GroupStoreBox, MembershipStoreBox};
use crate::error::{Result, TontineError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Validated inputs for creating a group.
#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub name: String,
    pub amount: Decimal,
    pub frequency_days: u32,
    pub start_date: NaiveDate,
}

/// A group together with its ordered member list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDetails {
    pub group: Group,
    pub members: Vec<Membership>,
    pub participant_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRoundStatus {
    pub membership: Membership,
    pub has_paid_current_round: bool,
}

/// On-demand projection of the current round; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundStatus {
    pub current_round: u32,
    pub total_rounds: Option<u32>,
    pub status: GroupStatus,
    pub beneficiary: Option<ActorId>,
    pub members: Vec<MemberRoundStatus>,
    pub payments_received: usize,
    pub total_participants: usize,
    pub is_round_complete: bool,
}

/// The tontine round engine.
///
/// Owns the storage ports and serializes every state-changing operation on a
/// group through that group's entry in the lock table, so concurrent
/// payments against one group cannot double-advance a round while payments
/// for different groups proceed in parallel.
pub struct TontineEngine {
    groups: GroupStoreBox,
    memberships: MembershipStoreBox,
    contributions: ContributionStoreBox,
    group_locks: RwLock<HashMap<GroupId, Arc<Mutex<()>>>>,
}

impl TontineEngine {
    pub fn new(
        groups: GroupStoreBox,
        memberships: MembershipStoreBox,
        contributions: ContributionStoreBox,
    ) -> Self {
        Self {
            groups,
            memberships,
            contributions,
            group_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the serialization point for one group's state transitions.
    async fn group_lock(&self, group: GroupId) -> Arc<Mutex<()>> {
        {
            let locks = self.group_locks.read().await;
            if let Some(lock) = locks.get(&group) {
                return lock.clone();
            }
        }
        let mut locks = self.group_locks.write().await;
        locks
            .entry(group)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Creates a group in `Pending` state and enrolls the creator at
    /// position 1 as part of the same operation.
    pub async fn create_group(&self, creator: ActorId, req: CreateGroup) -> Result<Group> {
        let amount = Amount::new(req.amount)?;
        let id = self.groups.allocate_id().await?;
        let mut group = Group::new(
            id,
            creator,
            req.name,
            amount,
            req.frequency_days,
            req.start_date,
        )?;

        // The creator's join is what sets total_rounds to 1.
        group.record_join(1);
        self.groups.insert(group.clone()).await?;
        self.memberships
            .insert(Membership::new(id, creator, 1))
            .await?;

        info!(group = %id, creator = %creator, name = %group.name, "group created");
        Ok(group)
    }

    pub async fn get_group(&self, id: GroupId) -> Result<Group> {
        self.groups
            .get(id)
            .await?
            .ok_or_else(|| TontineError::NotFound(format!("group {id}")))
    }

    /// Every group the actor created or is a member of.
    pub async fn list_groups_for_actor(&self, actor: ActorId) -> Result<Vec<Group>> {
        let member_of: HashSet<GroupId> = self
            .memberships
            .group_ids_for_actor(actor)
            .await?
            .into_iter()
            .collect();
        let groups = self
            .groups
            .all()
            .await?
            .into_iter()
            .filter(|g| g.created_by == actor || member_of.contains(&g.id))
            .collect();
        Ok(groups)
    }

    pub async fn get_group_details(&self, id: GroupId) -> Result<GroupDetails> {
        let group = self.get_group(id).await?;
        let members = self.memberships.for_group(id).await?;
        let participant_count = members.len();
        Ok(GroupDetails {
            group,
            members,
            participant_count,
        })
    }

    pub async fn all_groups(&self) -> Result<Vec<Group>> {
        self.groups.all().await
    }

    /// Adds the actor to the group at the next free position and extends the
    /// group's round count to match. Only `Completed` groups refuse joins.
    pub async fn join(&self, group_id: GroupId, actor: ActorId) -> Result<Membership> {
        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;

        let mut group = self.get_group(group_id).await?;
        if group.is_completed() {
            return Err(TontineError::InvalidState(format!(
                "cannot join completed group {group_id}"
            )));
        }
        if self.memberships.get(group_id, actor).await?.is_some() {
            return Err(TontineError::Conflict(format!(
                "actor {actor} is already a participant of group {group_id}"
            )));
        }

        let members = self.memberships.for_group(group_id).await?;
        let position = members.iter().map(|m| m.position).max().unwrap_or(0) + 1;

        let membership = Membership::new(group_id, actor, position);
        // The store's uniqueness constraint backs the check above.
        self.memberships.insert(membership.clone()).await?;

        group.record_join(position);
        self.groups.update(group).await?;

        info!(group = %group_id, actor = %actor, position, "member joined");
        Ok(membership)
    }

    /// Memberships of a group, ordered by position.
    pub async fn list_members(&self, group_id: GroupId) -> Result<Vec<Membership>> {
        self.get_group(group_id).await?;
        self.memberships.for_group(group_id).await
    }

    /// Records a contribution for the group's current round and, if the
    /// round is now fully paid, marks the beneficiary and advances or
    /// completes the group — all under the group's exclusive lock.
    pub async fn submit_contribution(
        &self,
        group_id: GroupId,
        actor: ActorId,
        amount: Decimal,
    ) -> Result<Contribution> {
        let lock = self.group_lock(group_id).await;
        let _guard = lock.lock().await;

        let mut group = self.get_group(group_id).await?;

        if self.memberships.get(group_id, actor).await?.is_none() {
            return Err(TontineError::Forbidden(format!(
                "actor {actor} is not a participant of group {group_id}"
            )));
        }

        if amount != group.contribution_amount.value() {
            return Err(TontineError::Validation(format!(
                "payment amount must be {}",
                group.contribution_amount
            )));
        }

        let round = group.current_round;
        if self
            .contributions
            .get(group_id, actor, round)
            .await?
            .is_some()
        {
            return Err(TontineError::Conflict(format!(
                "actor {actor} has already paid for round {round} of group {group_id}"
            )));
        }

        let contribution =
            Contribution::completed(group_id, actor, round, group.contribution_amount);
        // The store's (group, actor, round) constraint backs the check above.
        self.contributions.insert(contribution.clone()).await?;
        info!(group = %group_id, actor = %actor, round, amount = %group.contribution_amount, "contribution recorded");

        self.check_and_advance(&mut group).await?;
        Ok(contribution)
    }

    /// Round coordinator: closes the current round once every member has a
    /// completed contribution for it.
    ///
    /// Callers must hold the group's lock; the paid/member counts and the
    /// `current_round`/`status` writes below are what that lock protects.
    async fn check_and_advance(&self, group: &mut Group) -> Result<()> {
        // An unset round count means the creator membership was never
        // recorded; the round cannot be considered complete.
        if group.total_rounds.is_none() {
            return Ok(());
        }

        let members = self.memberships.for_group(group.id).await?;
        let paid = self
            .contributions
            .for_round(group.id, group.current_round)
            .await?
            .iter()
            .filter(|c| c.is_completed())
            .count();
        if paid != members.len() {
            return Ok(());
        }

        let round = group.current_round;
        match members.iter().find(|m| m.position == round) {
            Some(beneficiary) => {
                let mut beneficiary = beneficiary.clone();
                beneficiary.mark_paid_out();
                let actor = beneficiary.actor_id;
                self.memberships.update(beneficiary).await?;
                info!(group = %group.id, actor = %actor, round, "beneficiary paid out");
            }
            // The round still closes: the advance decision must not be
            // blocked by a missing beneficiary record.
            None => warn!(group = %group.id, round, "no membership at beneficiary position"),
        }

        if round >= members.len() as u32 {
            group.complete();
            info!(group = %group.id, round, "group completed");
        } else {
            group.advance_round();
            info!(group = %group.id, round = group.current_round, "round advanced");
        }
        self.groups.update(group.clone()).await?;
        Ok(())
    }

    /// Read-only projection of the current round's progress.
    pub async fn get_round_status(&self, group_id: GroupId) -> Result<RoundStatus> {
        let group = self.get_group(group_id).await?;
        let members = self.memberships.for_group(group_id).await?;
        let payments: Vec<Contribution> = self
            .contributions
            .for_round(group_id, group.current_round)
            .await?
            .into_iter()
            .filter(|c| c.is_completed())
            .collect();

        let paid: HashSet<ActorId> = payments.iter().map(|c| c.actor_id).collect();
        let beneficiary = members
            .iter()
            .find(|m| m.position == group.current_round)
            .map(|m| m.actor_id);
        let total_participants = members.len();
        let payments_received = payments.len();

        let members = members
            .into_iter()
            .map(|membership| {
                let has_paid_current_round = paid.contains(&membership.actor_id);
                MemberRoundStatus {
                    membership,
                    has_paid_current_round,
                }
            })
            .collect();

        Ok(RoundStatus {
            current_round: group.current_round,
            total_rounds: group.total_rounds,
            status: group.status,
            beneficiary,
            members,
            payments_received,
            total_participants,
            is_round_complete: payments_received == total_participants,
        })
    }
}
