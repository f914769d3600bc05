//! Concurrency and persistence tests for the cooldown stores.

use futures::future::join_all;
use relay_commands::{Admission, CooldownStore, MemoryCooldownStore, SledCooldownStore};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(43_200);
const CONTENDERS: usize = 32;

async fn race(store: Arc<dyn CooldownStore>, key: &'static str) -> Vec<Admission> {
    let attempts = (0..CONTENDERS).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.try_acquire(key).await })
    });

    join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect()
}

fn allowed(admissions: &[Admission]) -> usize {
    admissions
        .iter()
        .filter(|admission| **admission == Admission::Allowed)
        .count()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_memory_store_admits_one_concurrent_caller() {
    let store = Arc::new(MemoryCooldownStore::new(TTL));

    let admissions = race(store.clone(), "telegram_user:7").await;

    assert_eq!(allowed(&admissions), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sled_store_admits_one_concurrent_caller() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SledCooldownStore::open(dir.path().join("db"), TTL).unwrap());

    let admissions = race(store, "telegram_user:7").await;

    assert_eq!(allowed(&admissions), 1);
    assert!(admissions
        .iter()
        .all(|admission| matches!(admission, Admission::Allowed | Admission::Blocked { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_keys_do_not_contend() {
    let store = Arc::new(MemoryCooldownStore::new(TTL));

    let attempts = (0..CONTENDERS).map(|i| {
        let store = store.clone();
        tokio::spawn(async move { store.try_acquire(&format!("telegram_user:{i}")).await })
    });
    let admissions: Vec<Admission> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(allowed(&admissions), CONTENDERS);
}

#[tokio::test]
async fn test_sled_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db");

    {
        let store = SledCooldownStore::open(&path, TTL).unwrap();
        assert_eq!(
            store.try_acquire("telegram_user:9").await.unwrap(),
            Admission::Allowed
        );
        store.flush().await.unwrap();
    }

    let reopened = SledCooldownStore::open(&path, TTL).unwrap();
    match reopened.try_acquire("telegram_user:9").await.unwrap() {
        Admission::Blocked { remaining_secs } => {
            assert!(remaining_secs > 43_000 && remaining_secs <= 43_200);
        }
        Admission::Allowed => panic!("cooldown was lost across reopen"),
    }
}
