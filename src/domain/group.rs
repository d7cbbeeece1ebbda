use crate::error::TontineError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a tontine group, allocated by the group store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

/// Identity of an already-authenticated actor, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A positive monetary amount.
///
/// Wrapper around `rust_decimal::Decimal` so contribution amounts can never
/// be zero or negative once constructed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, TontineError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(TontineError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = TontineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Pending,
    Active,
    Completed,
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupStatus::Pending => "pending",
            GroupStatus::Active => "active",
            GroupStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// A rotating savings group.
///
/// `current_round` and `status` are mutated only by the round coordinator;
/// `total_rounds` tracks the highest position assigned so far and grows on
/// every join, including joins after rounds have begun.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub contribution_amount: Amount,
    /// Informational cadence in days; no scheduler enforces it.
    pub frequency_days: u32,
    pub start_date: NaiveDate,
    pub status: GroupStatus,
    pub current_round: u32,
    pub total_rounds: Option<u32>,
    pub created_by: ActorId,
}

impl Group {
    /// Builds a new group in `Pending` state at round 1.
    ///
    /// `total_rounds` starts unset; recording the creator's membership at
    /// position 1 sets it via [`Group::record_join`].
    pub fn new(
        id: GroupId,
        created_by: ActorId,
        name: String,
        contribution_amount: Amount,
        frequency_days: u32,
        start_date: NaiveDate,
    ) -> Result<Self, TontineError> {
        let name = name.trim().to_string();
        if name.len() < 3 || name.len() > 100 {
            return Err(TontineError::Validation(
                "name must be between 3 and 100 characters".to_string(),
            ));
        }
        if frequency_days < 1 {
            return Err(TontineError::Validation(
                "frequency must be at least 1 day".to_string(),
            ));
        }
        Ok(Self {
            id,
            name,
            contribution_amount,
            frequency_days,
            start_date,
            status: GroupStatus::Pending,
            current_round: 1,
            total_rounds: None,
            created_by,
        })
    }

    /// Records that a member joined at `position`, extending the round count.
    pub fn record_join(&mut self, position: u32) {
        self.total_rounds = Some(position);
    }

    /// Moves to the next round after the current one closed.
    pub fn advance_round(&mut self) {
        self.current_round += 1;
    }

    /// Marks the final round as closed.
    pub fn complete(&mut self) {
        self.status = GroupStatus::Completed;
    }

    pub fn is_completed(&self) -> bool {
        self.status == GroupStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn group(name: &str, frequency_days: u32) -> Result<Group, TontineError> {
        Group::new(
            GroupId(1),
            ActorId(7),
            name.to_string(),
            Amount::new(dec!(40000)).unwrap(),
            frequency_days,
            date("2025-12-01"),
        )
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0)),
            Err(TontineError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-5)),
            Err(TontineError::Validation(_))
        ));
    }

    #[test]
    fn test_new_group_defaults() {
        let g = group("Family pot", 22).unwrap();
        assert_eq!(g.status, GroupStatus::Pending);
        assert_eq!(g.current_round, 1);
        assert_eq!(g.total_rounds, None);
        assert_eq!(g.created_by, ActorId(7));
    }

    #[test]
    fn test_name_length_validated() {
        assert!(matches!(group("ab", 22), Err(TontineError::Validation(_))));
        let long = "x".repeat(101);
        assert!(matches!(
            group(&long, 22),
            Err(TontineError::Validation(_))
        ));
        assert!(group("abc", 22).is_ok());
    }

    #[test]
    fn test_frequency_validated() {
        assert!(matches!(
            group("Family pot", 0),
            Err(TontineError::Validation(_))
        ));
    }

    #[test]
    fn test_record_join_grows_total_rounds() {
        let mut g = group("Family pot", 22).unwrap();
        g.record_join(1);
        assert_eq!(g.total_rounds, Some(1));
        g.record_join(2);
        assert_eq!(g.total_rounds, Some(2));
    }

    #[test]
    fn test_transitions() {
        let mut g = group("Family pot", 22).unwrap();
        g.advance_round();
        assert_eq!(g.current_round, 2);
        assert!(!g.is_completed());
        g.complete();
        assert!(g.is_completed());
    }
}
