#![cfg(feature = "storage-rocksdb")]

use rust_decimal_macros::dec;
use tempfile::tempdir;
use tontine::application::engine::{CreateGroup, TontineEngine};
use tontine::domain::group::{ActorId, GroupStatus};
use tontine::infrastructure::rocksdb::RocksDbStore;

fn engine_on(store: RocksDbStore) -> TontineEngine {
    TontineEngine::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store),
    )
}

#[tokio::test]
async fn group_state_survives_reopen() {
    let dir = tempdir().unwrap();

    let group_id = {
        let engine = engine_on(RocksDbStore::open(dir.path()).unwrap());
        let group = engine
            .create_group(
                ActorId(1),
                CreateGroup {
                    name: "Durable pot".to_string(),
                    amount: dec!(40000),
                    frequency_days: 22,
                    start_date: "2025-12-01".parse().unwrap(),
                },
            )
            .await
            .unwrap();
        engine.join(group.id, ActorId(2)).await.unwrap();
        engine
            .submit_contribution(group.id, ActorId(1), dec!(40000))
            .await
            .unwrap();
        group.id
    };

    let engine = engine_on(RocksDbStore::open(dir.path()).unwrap());
    let group = engine.get_group(group_id).await.unwrap();
    assert_eq!(group.name, "Durable pot");
    assert_eq!(group.current_round, 1);
    assert_eq!(group.total_rounds, Some(2));

    let status = engine.get_round_status(group_id).await.unwrap();
    assert_eq!(status.payments_received, 1);
    assert!(!status.is_round_complete);

    // Finish the round against the reopened store.
    engine
        .submit_contribution(group_id, ActorId(2), dec!(40000))
        .await
        .unwrap();
    assert_eq!(engine.get_group(group_id).await.unwrap().current_round, 2);
}

#[tokio::test]
async fn completed_group_persists_final_state() {
    let dir = tempdir().unwrap();

    {
        let engine = engine_on(RocksDbStore::open(dir.path()).unwrap());
        let group = engine
            .create_group(
                ActorId(1),
                CreateGroup {
                    name: "Solo pot".to_string(),
                    amount: dec!(100),
                    frequency_days: 7,
                    start_date: "2025-12-01".parse().unwrap(),
                },
            )
            .await
            .unwrap();
        engine
            .submit_contribution(group.id, ActorId(1), dec!(100))
            .await
            .unwrap();
    }

    let engine = engine_on(RocksDbStore::open(dir.path()).unwrap());
    let groups = engine.all_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].status, GroupStatus::Completed);

    let members = engine.list_members(groups[0].id).await.unwrap();
    assert!(members[0].has_received_payout);
}
