/// Concurrency tests for the aggregator
///
/// Handlers are independent tasks with no locking between the read and the
/// write of a read-modify-write. These tests pin down what that means.
mod common;

use std::sync::Arc;

use common::{FlakyStore, GatedStore};
use login_history::messaging::{Request, Response};
use login_history::{Aggregator, AggregatorHandle, EventStore, LoginEvent, StaticHistory};

#[tokio::test]
async fn test_interleaved_records_lose_an_update() {
    let store = Arc::new(GatedStore::new(2));
    let aggregator = Arc::new(Aggregator::new(store.clone(), Arc::new(StaticHistory::default())));

    let first = LoginEvent::detected("https://a.test/login", 1).unwrap();
    let second = LoginEvent::detected("https://b.test/login", 2).unwrap();

    // Both handlers read the empty log before either writes
    let a = tokio::spawn({
        let aggregator = Arc::clone(&aggregator);
        async move { aggregator.record(first).await }
    });
    let b = tokio::spawn({
        let aggregator = Arc::clone(&aggregator);
        async move { aggregator.record(second).await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let log = store.read_ungated().await;
    assert_eq!(log.len(), 1, "last write wins over the whole log");
}

#[tokio::test]
async fn test_storage_failure_only_affects_its_own_request() {
    let store = FlakyStore::new();
    let aggregator = Arc::new(Aggregator::new(store.clone(), Arc::new(StaticHistory::default())));
    let (handle, inbox) = AggregatorHandle::channel();
    let server = tokio::spawn(aggregator.serve(inbox));

    store.set_failing(true);
    let failed = handle
        .request(Request::ReportLogin(LoginEvent::detected("https://a.test/", 1).unwrap()))
        .await;
    assert!(failed.is_err(), "no acknowledgment for a failed write");

    store.set_failing(false);
    let reply = handle
        .request(Request::ReportLogin(LoginEvent::detected("https://b.test/", 2).unwrap()))
        .await
        .unwrap();
    assert_eq!(reply, Response::Ack { ok: true });
    assert_eq!(store.successful_writes(), 1);

    drop(handle);
    server.await.unwrap();
}

#[tokio::test]
async fn test_many_requests_in_flight() {
    let store = FlakyStore::new();
    let aggregator = Arc::new(Aggregator::new(store.clone(), Arc::new(StaticHistory::default())));
    let (handle, inbox) = AggregatorHandle::channel();
    let server = tokio::spawn(aggregator.serve(inbox));

    let requests: Vec<_> = (0..20)
        .map(|i| {
            let handle = handle.clone();
            tokio::spawn(async move {
                let event = LoginEvent::detected("https://a.test/", i).unwrap();
                handle.request(Request::ReportLogin(event)).await
            })
        })
        .collect();

    for request in requests {
        assert_eq!(request.await.unwrap().unwrap(), Response::Ack { ok: true });
    }

    let log = store.read().await.unwrap();
    assert!(!log.is_empty() && log.len() <= 20);

    drop(handle);
    server.await.unwrap();
}
