/// End-to-end tests for the login history pipeline
///
/// These tests verify complete workflows: page detector / history scan → messaging →
/// aggregator → storage → query
mod common;

use std::sync::Arc;

use common::{DAY_MS, HistoryRecordBuilder, Workspace, now_ms};
use login_history::detector::{InputKind, Page};
use login_history::messaging::{Request, Response, ScanParams};
use login_history::models::{HistoryRecord, LoginMethod};
use login_history::{
    Aggregator, AggregatorHandle, EventStore, FileEventStore, FileHistory, InMemoryDocument,
    LoginEvent, MemoryEventStore, StaticHistory,
};

fn start(
    store: Arc<dyn EventStore>,
    records: Vec<HistoryRecord>,
) -> (AggregatorHandle, tokio::task::JoinHandle<()>) {
    let aggregator = Arc::new(Aggregator::new(store, Arc::new(StaticHistory::new(records))));
    let (handle, inbox) = AggregatorHandle::channel();
    let server = tokio::spawn(aggregator.serve(inbox));
    (handle, server)
}

async fn get_logins(handle: &AggregatorHandle) -> Vec<LoginEvent> {
    match handle.request(Request::GetLogins).await.unwrap() {
        Response::Logins { events } => events,
        other => panic!("unexpected reply: {:?}", other),
    }
}

#[tokio::test]
async fn test_e2e_password_form_submit_is_logged_once() {
    let store = Arc::new(MemoryEventStore::new());
    let (handle, server) = start(store.clone(), vec![]);

    let mut doc = InMemoryDocument::new("https://site.test/login");
    let form = doc.add_form(&[InputKind::Email, InputKind::Password, InputKind::Submit]);
    let mut page = Page::load(doc, handle.clone());

    // The structural observer fires repeatedly while the page settles
    for _ in 0..5 {
        page.mutate(|_| ());
    }
    assert_eq!(page.submit(form), 1);

    // Page navigates away; the coordinator drains in-flight reports on shutdown
    drop(page);
    drop(handle);
    server.await.unwrap();

    let log = store.read().await.unwrap();
    assert_eq!(log.len(), 1);
    let event = &log.events()[0];
    assert_eq!(event.method, LoginMethod::Detected);
    assert_eq!(event.domain, "site.test");
    assert_eq!(event.url, "https://site.test/login");
}

#[tokio::test]
async fn test_e2e_detected_event_visible_through_get_logins() {
    let store = Arc::new(MemoryEventStore::new());
    let (handle, server) = start(store.clone(), vec![]);

    let event = LoginEvent::detected("https://site.test/login", now_ms()).unwrap();
    handle.request(Request::ReportLogin(event)).await.unwrap();

    let events = get_logins(&handle).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].domain, "site.test");
    assert_eq!(events[0].method, LoginMethod::Detected);

    drop(handle);
    server.await.unwrap();
}

#[tokio::test]
async fn test_e2e_scan_history_keywords() {
    let now = now_ms();
    let records = vec![
        HistoryRecord::new("https://a.test/login", "Home", Some(now - 2 * DAY_MS)),
        HistoryRecord::new("https://b.test/", "Shop", Some(now - 2 * DAY_MS)),
    ];
    let (handle, server) = start(Arc::new(MemoryEventStore::new()), records);

    let reply = handle
        .request(Request::ScanHistoryKeywords(Some(ScanParams { days: Some(30) })))
        .await
        .unwrap();
    assert_eq!(reply, Response::Scanned { ok: true, added: 1 });

    let events = get_logins(&handle).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].method, LoginMethod::HistoryKeyword);
    assert_eq!(events[0].domain, "a.test");

    drop(handle);
    server.await.unwrap();
}

#[tokio::test]
async fn test_e2e_scan_does_not_override_detected_event() {
    let visited = now_ms() - DAY_MS;
    let records = vec![HistoryRecord::new("https://x.test/login", "Sign in", Some(visited))];
    let (handle, server) = start(Arc::new(MemoryEventStore::new()), records);

    let original = LoginEvent::detected("https://x.test/login", visited).unwrap();
    handle.request(Request::ReportLogin(original.clone())).await.unwrap();

    let reply = handle.request(Request::ScanHistoryKeywords(None)).await.unwrap();
    assert_eq!(reply, Response::Scanned { ok: true, added: 1 });

    assert_eq!(get_logins(&handle).await, vec![original]);

    drop(handle);
    server.await.unwrap();
}

#[tokio::test]
async fn test_e2e_log_survives_coordinator_restart() {
    let workspace = Workspace::new();
    let history = workspace.with_history(&[
        HistoryRecordBuilder::new("https://accounts.test/signin").title("Sign in").days_ago(3),
        HistoryRecordBuilder::new("https://news.test/").title("Headlines").days_ago(3),
    ]);

    for _ in 0..2 {
        let store = Arc::new(FileEventStore::in_dir(&workspace.data_dir()));
        let aggregator = Arc::new(Aggregator::new(store, Arc::new(FileHistory::new(&history))));
        let (handle, inbox) = AggregatorHandle::channel();
        let server = tokio::spawn(aggregator.serve(inbox));

        let reply = handle.request(Request::ScanHistoryKeywords(None)).await.unwrap();
        assert_eq!(reply, Response::Scanned { ok: true, added: 1 });

        drop(handle);
        server.await.unwrap();
    }

    let store = FileEventStore::in_dir(&workspace.data_dir());
    let log = store.read().await.unwrap();
    assert_eq!(log.len(), 1, "second scan should collapse into the first");
    assert_eq!(log.events()[0].domain, "accounts.test");
}

#[tokio::test]
async fn test_e2e_export_history_through_messages() {
    let now = now_ms();
    let records = vec![
        HistoryRecord::new("https://a.test/", "Alpha", Some(now - DAY_MS)),
        HistoryRecord::new("https://b.test/", "Beta", Some(now - 2 * DAY_MS)),
    ];
    let (handle, server) = start(Arc::new(MemoryEventStore::new()), records);

    let reply = handle.request(Request::ExportHistory(None)).await.unwrap();
    match reply {
        Response::History { history } => {
            assert_eq!(history.len(), 2);
            assert_eq!(history[0].title.as_deref(), Some("Alpha"));
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    drop(handle);
    server.await.unwrap();
}
