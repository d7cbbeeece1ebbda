use crate::domain::group::{ActorId, Amount, GroupId};
use serde::{Deserialize, Serialize};

/// Settlement state of a contribution. The engine only ever records
/// `Completed` rows; `Pending` and `Failed` are reserved for a future
/// settlement integration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Pending,
    #[default]
    Completed,
    Failed,
}

/// One member's payment recorded against a specific round.
///
/// `(group_id, actor_id, round_number)` is unique and the row is immutable
/// once created; there is no update or delete path in the core.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Contribution {
    pub group_id: GroupId,
    pub actor_id: ActorId,
    pub round_number: u32,
    pub amount: Amount,
    pub status: ContributionStatus,
}

impl Contribution {
    /// A contribution accepted by the ledger for the given round.
    pub fn completed(
        group_id: GroupId,
        actor_id: ActorId,
        round_number: u32,
        amount: Amount,
    ) -> Self {
        Self {
            group_id,
            actor_id,
            round_number,
            amount,
            status: ContributionStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ContributionStatus::Completed
    }
}
