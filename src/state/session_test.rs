use super::*;
use crate::storage::MemoryStorage;

fn user() -> UserSummary {
    UserSummary { id: 42, phone_number: "77001234567".into(), phone_verified: true, date_joined: None }
}

fn tokens(access: &str) -> TokenPair {
    TokenPair { access: access.into(), refresh: format!("{access}-refresh") }
}

fn store() -> (Arc<MemoryStorage>, SessionStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone());
    (storage, store)
}

fn persisted_access(storage: &MemoryStorage) -> Option<String> {
    let raw = storage.get(SESSION_STORAGE_KEY).unwrap()?;
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    value["tokens"]["access"].as_str().map(str::to_owned)
}

fn seed(storage: &MemoryStorage, access: &str) {
    let record = serde_json::json!({
        "user": { "id": 42, "phone_number": "77001234567", "phone_verified": true, "date_joined": null },
        "tokens": { "access": access, "refresh": "r" }
    });
    storage.set(SESSION_STORAGE_KEY, &record.to_string()).unwrap();
}

// =============================================================================
// Hydration gating
// =============================================================================

#[test]
fn new_store_is_pending() {
    let (_, store) = store();
    assert_eq!(store.status(), AuthStatus::Pending);
    assert!(!store.is_hydrated());
}

#[test]
fn not_authenticated_before_hydration_even_with_token() {
    let (_, store) = store();
    store.set_auth(user(), tokens("abc")).unwrap();
    assert!(!store.is_authenticated());
    assert_eq!(store.status(), AuthStatus::Pending);

    store.set_has_hydrated(true);
    assert!(store.is_authenticated());
}

#[test]
fn repeated_hydration_flags_are_stable() {
    let (_, store) = store();
    store.set_has_hydrated(true);
    store.set_has_hydrated(true);
    assert!(store.is_hydrated());
    assert_eq!(store.status(), AuthStatus::Unauthenticated);
}

#[test]
fn hydration_never_reverts() {
    let (_, store) = store();
    store.set_has_hydrated(true);
    store.set_has_hydrated(false);
    assert!(store.is_hydrated());
}

#[test]
fn set_has_hydrated_false_before_hydration_is_noop() {
    let (_, store) = store();
    store.set_has_hydrated(false);
    assert_eq!(store.status(), AuthStatus::Pending);
}

#[test]
fn bare_hydration_flag_keeps_persisted_record() {
    let (storage, store) = store();
    seed(&storage, "abc");
    store.set_has_hydrated(true);
    assert_eq!(persisted_access(&storage).as_deref(), Some("abc"));
}

// =============================================================================
// hydrate
// =============================================================================

#[test]
fn hydrate_restores_persisted_session() {
    let (storage, store) = store();
    seed(&storage, "abc");

    assert_eq!(store.hydrate(), AuthStatus::Authenticated);
    assert_eq!(store.access_token().as_deref(), Some("abc"));
    assert_eq!(store.refresh_token().as_deref(), Some("r"));
    assert_eq!(store.user().unwrap().id, 42);
}

#[test]
fn hydrate_without_record_is_unauthenticated() {
    let (_, store) = store();
    assert_eq!(store.hydrate(), AuthStatus::Unauthenticated);
}

#[test]
fn hydrate_discards_corrupt_record() {
    let (storage, store) = store();
    storage.set(SESSION_STORAGE_KEY, "{ not json").unwrap();

    assert_eq!(store.hydrate(), AuthStatus::Unauthenticated);
    assert_eq!(storage.get(SESSION_STORAGE_KEY).unwrap(), None);
}

#[test]
fn hydrate_ignores_record_with_malformed_token() {
    let (storage, store) = store();
    seed(&storage, "has space");
    assert_eq!(store.hydrate(), AuthStatus::Unauthenticated);
}

#[test]
fn hydrate_keeps_login_made_before_hydration() {
    let (storage, store) = store();
    seed(&storage, "old");
    store.set_auth(user(), tokens("fresh")).unwrap();

    store.hydrate();
    assert_eq!(store.access_token().as_deref(), Some("fresh"));
    assert_eq!(persisted_access(&storage).as_deref(), Some("fresh"));
}

#[test]
fn hydrate_twice_is_noop() {
    let (storage, store) = store();
    store.hydrate();
    seed(&storage, "late");
    assert_eq!(store.hydrate(), AuthStatus::Unauthenticated);
}

// =============================================================================
// set_auth
// =============================================================================

#[test]
fn set_auth_authenticates_and_persists_access_token() {
    let (storage, store) = store();
    store.hydrate();
    store.set_auth(user(), tokens("abc")).unwrap();

    assert!(store.is_authenticated());
    assert_eq!(persisted_access(&storage).as_deref(), Some("abc"));
}

#[test]
fn set_auth_rejects_empty_access_token() {
    let (storage, store) = store();
    store.hydrate();
    let err = store.set_auth(user(), TokenPair { access: String::new(), refresh: "r".into() }).unwrap_err();

    assert!(matches!(err, SessionError::MalformedToken { kind: "access" }));
    assert!(!store.is_authenticated());
    assert_eq!(storage.get(SESSION_STORAGE_KEY).unwrap(), None);
}

#[test]
fn set_auth_rejects_header_unsafe_refresh_token() {
    let (_, store) = store();
    store.hydrate();
    let err = store.set_auth(user(), TokenPair { access: "a".into(), refresh: "r\n".into() }).unwrap_err();
    assert!(matches!(err, SessionError::MalformedToken { kind: "refresh" }));
}

#[test]
fn set_auth_replaces_previous_session() {
    let (_, store) = store();
    store.hydrate();
    store.set_auth(user(), tokens("one")).unwrap();
    store.set_auth(user(), tokens("two")).unwrap();
    assert_eq!(store.access_token().as_deref(), Some("two"));
}

// =============================================================================
// logout
// =============================================================================

#[test]
fn logout_clears_memory_and_storage() {
    let (storage, store) = store();
    store.hydrate();
    store.set_auth(user(), tokens("abc")).unwrap();

    store.logout();

    assert!(!store.is_authenticated());
    assert_eq!(store.status(), AuthStatus::Unauthenticated);
    assert!(store.user().is_none());
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
    assert!(storage.keys().is_empty());
}

#[test]
fn logout_twice_matches_logout_once() {
    let (storage, store) = store();
    store.hydrate();
    store.set_auth(user(), tokens("abc")).unwrap();

    store.logout();
    let once = (store.snapshot(), storage.keys());
    store.logout();
    let twice = (store.snapshot(), storage.keys());

    assert_eq!(once, twice);
}

#[test]
fn second_logout_does_not_notify() {
    let (_, store) = store();
    store.hydrate();
    store.set_auth(user(), tokens("abc")).unwrap();
    store.logout();

    let mut rx = store.subscribe();
    rx.borrow_and_update();
    store.logout();
    assert!(!rx.has_changed().unwrap());
}

// =============================================================================
// subscribe
// =============================================================================

#[test]
fn subscribers_see_hydration_and_login() {
    let (_, store) = store();
    let mut rx = store.subscribe();

    store.hydrate();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().status(), AuthStatus::Unauthenticated);

    store.set_auth(user(), tokens("abc")).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().status(), AuthStatus::Authenticated);
}
