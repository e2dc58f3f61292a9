use std::pin::pin;

use futures::channel::oneshot;

use super::*;

// =============================================================================
// RequestScope
// =============================================================================

#[tokio::test]
async fn run_passes_through_result() {
    let scope = RequestScope::new();
    let value = scope.run(async { Ok::<_, ApiError>(7) }).await.unwrap();
    assert_eq!(value, 7);
}

#[tokio::test]
async fn run_passes_through_error() {
    let scope = RequestScope::new();
    let err = scope.run(async { Err::<(), _>(ApiError::Unauthorized) }).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn cancel_aborts_in_flight_request() {
    let scope = RequestScope::new();
    let (tx, rx) = oneshot::channel::<i32>();

    let mut running = pin!(scope.run(async move { rx.await.map_err(|_| ApiError::Cancelled) }));
    assert!(futures::poll!(running.as_mut()).is_pending());

    scope.cancel();
    let _ = tx.send(1);

    assert!(matches!(running.await, Err(ApiError::Cancelled)));
}

#[tokio::test]
async fn cancelled_scope_rejects_new_requests() {
    let scope = RequestScope::new();
    scope.cancel();
    assert!(scope.is_cancelled());

    let err = scope.run(async { Ok::<_, ApiError>(1) }).await.unwrap_err();
    assert!(matches!(err, ApiError::Cancelled));
}

#[tokio::test]
async fn cancel_reaches_request_on_another_task() {
    let scope = std::sync::Arc::new(RequestScope::new());
    let (tx, rx) = oneshot::channel::<i32>();
    let (started_tx, started_rx) = oneshot::channel::<()>();

    let task = tokio::spawn({
        let scope = scope.clone();
        async move {
            scope
                .run(async move {
                    let _ = started_tx.send(());
                    rx.await.map_err(|_| ApiError::Cancelled)
                })
                .await
        }
    });

    started_rx.await.unwrap();
    scope.cancel();
    drop(scope);
    let _ = tx.send(1);

    assert!(matches!(task.await.unwrap(), Err(ApiError::Cancelled)));
}

// =============================================================================
// RequestSequence
// =============================================================================

#[test]
fn only_latest_ticket_is_current() {
    let seq = RequestSequence::new();
    let first = seq.begin();
    assert!(seq.is_current(first));

    let second = seq.begin();
    assert!(!seq.is_current(first));
    assert!(seq.is_current(second));
    assert_ne!(first, second);
}
