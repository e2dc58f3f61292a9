use std::collections::VecDeque;
use std::pin::pin;
use std::sync::Mutex;

use tokio::sync::oneshot;

use super::*;
use crate::net::types::{ProfileUser, Role, RoleGrant};
use crate::storage::MemoryStorage;

fn profile(id: i64, primary_role: Role) -> UserProfile {
    UserProfile {
        user: ProfileUser {
            id,
            phone_number: "77001234567".into(),
            phone_verified: true,
            date_joined: None,
            first_name: None,
            last_name: None,
            middle_name: None,
            has_password: None,
        },
        grants: vec![RoleGrant::Patient],
        primary_role,
        organizations: Vec::new(),
        employee: None,
        medical_staff: None,
    }
}

/// Returns a fixed result on every call.
struct FixedFetcher(Result<UserProfile, u16>);

#[async_trait]
impl ProfileFetcher for FixedFetcher {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.0.clone().map_err(|status| ApiError::Status { status, message: "boom".into() })
    }
}

/// Each call waits on the next queued channel, so tests decide resolution order.
struct GatedFetcher {
    gates: Mutex<VecDeque<oneshot::Receiver<UserProfile>>>,
}

#[async_trait]
impl ProfileFetcher for GatedFetcher {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        let gate = self.gates.lock().unwrap().pop_front().expect("unexpected fetch");
        gate.await.map_err(|_| ApiError::Cancelled)
    }
}

fn store() -> (Arc<MemoryStorage>, ProfileStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = ProfileStore::new(storage.clone());
    (storage, store)
}

// =============================================================================
// load_profile
// =============================================================================

#[tokio::test]
async fn load_profile_stores_and_persists_payload() {
    let (storage, store) = store();
    let loaded = store.load_profile(&FixedFetcher(Ok(profile(1, Role::Employer)))).await;

    assert_eq!(loaded.unwrap().primary_role, Role::Employer);
    assert_eq!(store.profile().unwrap().user.id, 1);
    assert!(!store.is_loading());
    assert!(storage.get(PROFILE_STORAGE_KEY).unwrap().is_some());
}

#[tokio::test]
async fn load_profile_failure_clears_profile_without_error() {
    let (storage, store) = store();
    store.load_profile(&FixedFetcher(Ok(profile(1, Role::Employer)))).await;

    let loaded = store.load_profile(&FixedFetcher(Err(500))).await;

    assert!(loaded.is_none());
    assert!(store.profile().is_none());
    assert!(!store.is_loading());
    assert_eq!(storage.get(PROFILE_STORAGE_KEY).unwrap(), None);
}

#[tokio::test]
async fn loading_flag_raised_while_in_flight() {
    let (_, store) = store();
    let (tx, rx) = oneshot::channel();
    let fetcher = GatedFetcher { gates: Mutex::new(VecDeque::from([rx])) };

    let mut load = pin!(store.load_profile(&fetcher));
    assert!(futures::poll!(load.as_mut()).is_pending());
    assert!(store.is_loading());

    tx.send(profile(1, Role::Clinic)).unwrap();
    assert!(load.await.is_some());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn concurrent_loads_last_resolved_wins() {
    let (_, store) = store();
    let (tx_first, rx_first) = oneshot::channel();
    let (tx_second, rx_second) = oneshot::channel();
    let fetcher = GatedFetcher { gates: Mutex::new(VecDeque::from([rx_first, rx_second])) };

    let mut first = pin!(store.load_profile(&fetcher));
    let mut second = pin!(store.load_profile(&fetcher));
    assert!(futures::poll!(first.as_mut()).is_pending());
    assert!(futures::poll!(second.as_mut()).is_pending());

    // The later request resolves first; the earlier one resolves last and wins.
    tx_second.send(profile(2, Role::Clinic)).unwrap();
    assert_eq!(second.await.unwrap().user.id, 2);
    assert!(store.is_loading());

    tx_first.send(profile(1, Role::Employer)).unwrap();
    assert_eq!(first.await.unwrap().user.id, 1);

    assert_eq!(store.profile().unwrap().user.id, 1);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn concurrent_loads_in_order_keep_latest() {
    let (_, store) = store();
    let (tx_first, rx_first) = oneshot::channel();
    let (tx_second, rx_second) = oneshot::channel();
    let fetcher = GatedFetcher { gates: Mutex::new(VecDeque::from([rx_first, rx_second])) };

    let mut first = pin!(store.load_profile(&fetcher));
    let mut second = pin!(store.load_profile(&fetcher));
    assert!(futures::poll!(first.as_mut()).is_pending());
    assert!(futures::poll!(second.as_mut()).is_pending());

    tx_first.send(profile(1, Role::Employer)).unwrap();
    first.await;
    tx_second.send(profile(2, Role::Clinic)).unwrap();
    second.await;

    assert_eq!(store.profile().unwrap().user.id, 2);
}

#[tokio::test]
async fn dropped_load_releases_loading_flag() {
    let (_, store) = store();
    let (_tx, rx) = oneshot::channel::<UserProfile>();
    let fetcher = GatedFetcher { gates: Mutex::new(VecDeque::from([rx])) };

    let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), store.load_profile(&fetcher)).await;

    assert!(timed_out.is_err());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn load_started_before_clear_is_discarded() {
    let (storage, store) = store();
    let (tx, rx) = oneshot::channel();
    let fetcher = GatedFetcher { gates: Mutex::new(VecDeque::from([rx])) };

    let mut load = pin!(store.load_profile(&fetcher));
    assert!(futures::poll!(load.as_mut()).is_pending());
    store.clear_profile();

    tx.send(profile(1, Role::Clinic)).unwrap();
    assert_eq!(load.await, None);
    assert!(store.profile().is_none());
    assert!(!store.is_loading());
    assert!(storage.keys().is_empty());
}

#[tokio::test]
async fn load_started_after_clear_applies() {
    let (_, store) = store();
    store.clear_profile();

    let loaded = store.load_profile(&FixedFetcher(Ok(profile(3, Role::Employer)))).await;

    assert_eq!(loaded.unwrap().user.id, 3);
    assert_eq!(store.profile().unwrap().user.id, 3);
}

// =============================================================================
// clear_profile / restore
// =============================================================================

#[tokio::test]
async fn clear_profile_resets_memory_and_storage() {
    let (storage, store) = store();
    store.load_profile(&FixedFetcher(Ok(profile(1, Role::Patient)))).await;

    store.clear_profile();

    assert!(store.profile().is_none());
    assert!(storage.keys().is_empty());
}

#[test]
fn clear_profile_when_empty_does_not_notify() {
    let (_, store) = store();
    let rx = store.subscribe();
    store.clear_profile();
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn restore_reads_persisted_profile() {
    let (storage, store) = store();
    storage::save_json(storage.as_ref(), PROFILE_STORAGE_KEY, &profile(9, Role::Clinic)).unwrap();

    let restored = store.restore();

    assert_eq!(restored.unwrap().user.id, 9);
    assert_eq!(store.profile().unwrap().primary_role, Role::Clinic);
}

#[test]
fn restore_discards_corrupt_record() {
    let (storage, store) = store();
    storage.set(PROFILE_STORAGE_KEY, "[]").unwrap();

    assert!(store.restore().is_none());
    assert_eq!(storage.get(PROFILE_STORAGE_KEY).unwrap(), None);
}
