#![allow(dead_code)]

use rust_decimal::Decimal;
use tontine::application::engine::{CreateGroup, TontineEngine};
use tontine::domain::group::{ActorId, Group};
use tontine::infrastructure::in_memory::{
    InMemoryContributionStore, InMemoryGroupStore, InMemoryMembershipStore,
};

pub fn engine() -> TontineEngine {
    TontineEngine::new(
        Box::new(InMemoryGroupStore::new()),
        Box::new(InMemoryMembershipStore::new()),
        Box::new(InMemoryContributionStore::new()),
    )
}

pub fn create_req(name: &str, amount: Decimal, frequency_days: u32) -> CreateGroup {
    CreateGroup {
        name: name.to_string(),
        amount,
        frequency_days,
        start_date: "2025-12-01".parse().unwrap(),
    }
}

/// Creates a group with actor 1 as creator and actors 2..=n as joined
/// members.
pub async fn group_with_members(engine: &TontineEngine, amount: Decimal, n: u64) -> Group {
    let group = engine
        .create_group(ActorId(1), create_req("Family pot", amount, 22))
        .await
        .unwrap();
    for actor in 2..=n {
        engine.join(group.id, ActorId(actor)).await.unwrap();
    }
    engine.get_group(group.id).await.unwrap()
}

/// Submits a valid contribution for every member, closing the current round.
pub async fn pay_full_round(engine: &TontineEngine, group: &Group, amount: Decimal, n: u64) {
    for actor in 1..=n {
        engine
            .submit_contribution(group.id, ActorId(actor), amount)
            .await
            .unwrap();
    }
}
