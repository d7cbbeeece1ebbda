mod common;

use common::{engine, group_with_members, pay_full_round};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tontine::domain::group::{ActorId, GroupStatus};
use tontine::error::TontineError;

#[tokio::test]
async fn concurrent_final_round_payments_complete_exactly_once() {
    let engine = Arc::new(engine());
    let group = group_with_members(&engine, dec!(100), 2).await;
    pay_full_round(&engine, &group, dec!(100), 2).await;

    // Round 2 is the final round; both remaining payments race.
    let e1 = engine.clone();
    let e2 = engine.clone();
    let id = group.id;
    let h1 = tokio::spawn(async move { e1.submit_contribution(id, ActorId(1), dec!(100)).await });
    let h2 = tokio::spawn(async move { e2.submit_contribution(id, ActorId(2), dec!(100)).await });

    h1.await.unwrap().unwrap();
    h2.await.unwrap().unwrap();

    let finished = engine.get_group(group.id).await.unwrap();
    assert_eq!(finished.status, GroupStatus::Completed);
    // Exactly one transition: the round counter never ran past the total.
    assert_eq!(finished.current_round, 2);

    let members = engine.list_members(group.id).await.unwrap();
    assert!(members.iter().all(|m| m.has_received_payout));
}

#[tokio::test]
async fn concurrent_duplicate_payments_accept_exactly_one() {
    let engine = Arc::new(engine());
    let group = group_with_members(&engine, dec!(100), 3).await;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let engine = engine.clone();
        let id = group.id;
        handles.push(tokio::spawn(async move {
            engine.submit_contribution(id, ActorId(1), dec!(100)).await
        }));
    }

    let mut accepted = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(TontineError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(conflicts, 3);

    let status = engine.get_round_status(group.id).await.unwrap();
    assert_eq!(status.payments_received, 1);
}

#[tokio::test]
async fn concurrent_joins_assign_contiguous_positions() {
    let engine = Arc::new(engine());
    let group = group_with_members(&engine, dec!(100), 1).await;

    let mut handles = Vec::new();
    for actor in 2..=10u64 {
        let engine = engine.clone();
        let id = group.id;
        handles.push(tokio::spawn(
            async move { engine.join(id, ActorId(actor)).await },
        ));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let members = engine.list_members(group.id).await.unwrap();
    let positions: Vec<u32> = members.iter().map(|m| m.position).collect();
    assert_eq!(positions, (1..=10).collect::<Vec<u32>>());
    assert_eq!(
        engine.get_group(group.id).await.unwrap().total_rounds,
        Some(10)
    );
}

#[tokio::test]
async fn payments_for_different_groups_run_in_parallel() {
    let engine = Arc::new(engine());
    let g1 = group_with_members(&engine, dec!(100), 2).await;

    let g2 = engine
        .create_group(
            ActorId(11),
            common::create_req("Second group", dec!(250), 30),
        )
        .await
        .unwrap();
    engine.join(g2.id, ActorId(12)).await.unwrap();

    let mut handles = Vec::new();
    for (group, actor, amount) in [
        (g1.id, 1u64, dec!(100)),
        (g1.id, 2, dec!(100)),
        (g2.id, 11, dec!(250)),
        (g2.id, 12, dec!(250)),
    ] {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.submit_contribution(group, ActorId(actor), amount).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Both groups closed round 1 independently.
    assert_eq!(engine.get_group(g1.id).await.unwrap().current_round, 2);
    assert_eq!(engine.get_group(g2.id).await.unwrap().current_round, 2);
}
