use crate::domain::group::{ActorId, GroupId};
use serde::{Deserialize, Serialize};

/// One participant's seat in a group.
///
/// `(group_id, actor_id)` and `(group_id, position)` are both unique; the
/// stores enforce that on insert. Positions within a group are contiguous
/// 1..N and fixed for the life of the group.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Membership {
    pub group_id: GroupId,
    pub actor_id: ActorId,
    pub position: u32,
    pub has_received_payout: bool,
}

impl Membership {
    pub fn new(group_id: GroupId, actor_id: ActorId, position: u32) -> Self {
        Self {
            group_id,
            actor_id,
            position,
            has_received_payout: false,
        }
    }

    /// Marks this member as the paid-out beneficiary of their round.
    pub fn mark_paid_out(&mut self) {
        self.has_received_payout = true;
    }
}
