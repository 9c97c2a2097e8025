#![allow(clippy::unwrap_used)]
// Integration tests for `Store<M>` against a wiremock backend.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fieldbook_api::{
    ApiClient, CredentialStore, MemoryCredentialStore, Params, TransportConfig, UploadFile,
};
use fieldbook_core::{CoreError, EntityId, Label, Merchant, Project, Store, Task};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<ApiClient>) {
    let server = MockServer::start().await;
    let client = ApiClient::new(
        &server.uri(),
        "/api/v1",
        &TransportConfig::default(),
        Arc::new(MemoryCredentialStore::with_token("t0ken")),
    )
    .unwrap();
    (server, Arc::new(client))
}

fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap()
}

// ── Fetching ────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_hydrates_nested_entities() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/7/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "title": "Visit shop",
                "projectId": 7,
                "done": false,
                "dueDate": "2026-03-01T10:00:00Z",
                "priority": 3,
                "labels": [{ "id": 4, "title": "urgent", "hexColor": "FF0000" }],
                "createdBy": { "id": 2, "username": "ana" }
            },
            { "id": 2, "title": "Call back", "project_id": 7, "done": true }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let store: Store<Task> = Store::new(client);
    let tasks = store
        .fetch_scoped(&EntityId::from(7), &Params::new())
        .await
        .unwrap();

    assert_eq!(tasks.len(), 2);
    let first = &tasks[0];
    assert_eq!(first.title, "Visit shop");
    assert_eq!(first.project_id, EntityId::from(7));
    assert!(first.has_due_date());
    assert_eq!(first.labels.len(), 1);
    assert_eq!(first.labels[0].hex_color, "#FF0000");
    assert_eq!(first.created_by.username, "ana");

    // Absent fields fall back to defaults.
    assert!(tasks[1].done);
    assert!(!tasks[1].has_due_date());
    assert!(tasks[1].labels.is_empty());

    assert_eq!(store.len(), 2);
    assert_eq!(store.get_by_relation(&EntityId::from(7)).len(), 2);
}

#[tokio::test]
async fn scoped_fetch_replaces_only_its_scope() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "title": "a", "project_id": 1 },
            { "id": 11, "title": "b", "project_id": 1 }
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/2/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 20, "title": "c", "project_id": 2 }
        ])))
        .mount(&server)
        .await;

    let store: Store<Task> = Store::new(client);
    store.fetch_scoped(&EntityId::from(1), &Params::new()).await.unwrap();
    store.fetch_scoped(&EntityId::from(2), &Params::new()).await.unwrap();
    assert_eq!(store.len(), 3);

    // Project 1 now only holds task 12.
    Mock::given(method("GET"))
        .and(path("/api/v1/projects/1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 12, "title": "d", "project_id": 1 }
        ])))
        .mount(&server)
        .await;
    store.fetch_scoped(&EntityId::from(1), &Params::new()).await.unwrap();

    let ids: Vec<_> = store.snapshot().iter().map(|t| t.id.clone()).collect();
    assert!(ids.contains(&EntityId::from(20)));
    assert!(ids.contains(&EntityId::from(12)));
    assert!(!ids.contains(&EntityId::from(10)));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn global_fetch_merges() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": 1, "title": "Alpha" }, { "id": 2, "title": "Beta" }]
        })))
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    store.fetch_all(&Params::new()).await.unwrap();
    store.fetch_all(&Params::new()).await.unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(
        store.get_by_id(&EntityId::from(2)).unwrap().title,
        "Beta"
    );
}

// ── Template failures ───────────────────────────────────────────────

#[tokio::test]
async fn missing_parameter_sends_nothing() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store: Store<Task> = Store::new(client);
    let err = store.fetch_all(&Params::new()).await.unwrap_err();

    assert!(err.is_parameter_error());
    assert!(!store.is_loading());
    assert_eq!(store.error().as_deref(), Some("Failed to fetch tasks"));
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_appends_server_copy() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/projects/3/tasks"))
        .and(body_partial_json(json!({ "title": "New" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 99, "title": "New", "project_id": 3, "priority": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Store<Task> = Store::new(client);
    let created = store
        .create(&params(json!({ "project_id": 3, "title": "New" })))
        .await
        .unwrap();

    assert_eq!(created.id, EntityId::from(99));
    assert_eq!(created.priority, 2);
    assert!(Arc::ptr_eq(
        &created,
        &store.get_by_id(&EntityId::from(99)).unwrap()
    ));
}

#[tokio::test]
async fn update_replaces_cached_entry_only() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Old", "description": "kept?" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "title": "Renamed"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "title": "Elsewhere"
        })))
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    store.fetch_all(&Params::new()).await.unwrap();

    store
        .update(&EntityId::from(1), &params(json!({ "title": "Renamed" })))
        .await
        .unwrap();
    let cached = store.get_by_id(&EntityId::from(1)).unwrap();
    assert_eq!(cached.title, "Renamed");
    // Wholesale replacement: fields the server omitted are defaults now.
    assert_eq!(cached.description, "");

    store
        .update(&EntityId::from(5), &params(json!({ "title": "Elsewhere" })))
        .await
        .unwrap();
    assert!(store.get_by_id(&EntityId::from(5)).is_none());
}

#[tokio::test]
async fn stale_update_does_not_overwrite_newer() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "title": "v0" }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects/1"))
        .and(body_partial_json(json!({ "title": "v1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": 1, "title": "v1" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/projects/1"))
        .and(body_partial_json(json!({ "title": "v2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "title": "v2" })))
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    store.fetch_all(&Params::new()).await.unwrap();

    let id = EntityId::from(1);
    let first = params(json!({ "title": "v1" }));
    let second = params(json!({ "title": "v2" }));
    let (slow, fast) = tokio::join!(store.update(&id, &first), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.update(&id, &second).await
    });

    // Both callers get their own response.
    assert_eq!(slow.unwrap().title, "v1");
    assert_eq!(fast.unwrap().title, "v2");
    // The cache keeps the later request's result.
    assert_eq!(store.get_by_id(&id).unwrap().title, "v2");
}

#[tokio::test]
async fn failed_delete_keeps_cache_and_records_detail() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "title": "x" }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/1"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Not your project" })),
        )
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    store.fetch_all(&Params::new()).await.unwrap();

    let err = store.delete(&EntityId::from(1)).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert_eq!(store.len(), 1);
    assert_eq!(store.error().as_deref(), Some("Not your project"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn successful_delete_removes_and_clears_error() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/2"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    store.fetch_all(&Params::new()).await.unwrap_err();
    assert_eq!(store.error().as_deref(), Some("Failed to fetch projects"));

    store.fetch_all(&Params::new()).await.unwrap();
    assert!(store.error().is_none());

    store.delete(&EntityId::from(2)).await.unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.get_by_id(&EntityId::from(2)).is_none());
}

#[tokio::test]
async fn create_without_server_id_is_not_cached() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/labels"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let store: Store<Label> = Store::new(client);
    let first = store.create(&params(json!({ "title": "a" }))).await.unwrap();
    store.create(&params(json!({ "title": "b" }))).await.unwrap();

    assert!(first.id.is_unassigned());
    assert!(store.is_empty());
    assert!(store.error().is_none());
}

// ── Reactive state ──────────────────────────────────────────────────

#[tokio::test]
async fn subscribers_see_cache_and_error_changes() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5, "title": "Route A" })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/projects/5"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "detail": "Project has open tasks" })))
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    let mut snapshots = store.subscribe();
    let stream = store.subscribe().into_stream();
    let mut errors = store.subscribe_error();
    assert!(snapshots.current().is_empty());

    store.create(&params(json!({ "title": "Route A" }))).await.unwrap();
    let snap = tokio::time::timeout(Duration::from_secs(1), snapshots.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].title, "Route A");
    assert_eq!(snapshots.current().len(), 1);

    store.delete(&EntityId::from(5)).await.unwrap_err();
    let error = tokio::time::timeout(
        Duration::from_secs(1),
        errors.wait_for(Option::is_some),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(error.as_deref(), Some("Project has open tasks"));

    // The failed delete published no new snapshot.
    assert_eq!(snapshots.latest().len(), 1);
    let latest: Vec<_> = stream.take(1).collect().await;
    assert_eq!(latest[0].len(), 1);
}

// ── Loading / cancellation ──────────────────────────────────────────

#[tokio::test]
async fn loading_is_true_only_while_in_flight() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    assert!(!store.is_loading());

    let params = Params::new();
    let (result, during) = tokio::join!(store.fetch_all(&params), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.is_loading()
    });

    result.unwrap();
    assert!(during);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn cancel_aborts_without_recording_error() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": 1 }]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let store: Store<Project> = Store::new(client);
    let params = Params::new();
    let (result, cancelled) = tokio::join!(store.fetch_all(&params), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.cancel()
    });

    assert!(cancelled >= 1);
    assert!(matches!(result, Err(CoreError::Cancelled)));
    assert!(!store.is_loading());
    assert!(store.error().is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn unauthorized_is_not_recorded() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "expired" })))
        .mount(&server)
        .await;

    let mut failures = client.subscribe_auth_failures();
    let store: Store<Project> = Store::new(Arc::clone(&client));
    let err = store.fetch_all(&Params::new()).await.unwrap_err();

    assert!(matches!(err, CoreError::Unauthorized));
    assert!(store.error().is_none());
    assert!(client.credentials().load().unwrap().is_none());
    assert_eq!(failures.recv().await.unwrap().path, "/projects");
}

// ── Entity extensions ───────────────────────────────────────────────

#[tokio::test]
async fn toggle_done_flips_cached_task() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4, "title": "t", "project_id": 1, "done": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tasks/4"))
        .and(body_partial_json(json!({ "done": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4, "title": "t", "project_id": 1, "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Store<Task> = Store::new(client);
    assert!(store.toggle_done(&EntityId::from(4)).await.unwrap().is_none());

    store.get(&EntityId::from(4)).await.unwrap();
    let toggled = store.toggle_done(&EntityId::from(4)).await.unwrap().unwrap();
    assert!(toggled.done);
    assert!(store.get_by_id(&EntityId::from(4)).unwrap().done);
}

#[tokio::test]
async fn csv_import_reports_rows_and_resets_progress() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/merchants/import/csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_rows": 3,
            "success_count": 2,
            "errors": [{ "row": 3, "column": "title", "message": "missing name" }],
            "imported_items": [
                { "id": 31, "title": "Bakery", "city": "Hangzhou" },
                { "id": 32, "title": "Florist" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store: Store<Merchant> = Store::new(client);
    let file = UploadFile::new("shops.csv", "title,city\nBakery,Hangzhou\n".repeat(64));
    let result = store.import_csv(file, true).await.unwrap();

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.error_count, 1);
    assert!(result.has_errors());
    assert_eq!(store.len(), 2);
    assert_eq!(store.service().progress(), 0);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn upload_progress_rises_to_100_then_resets() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/merchants/import/excel"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "total_rows": 0 }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let store: Store<Merchant> = Store::new(client);
    let mut progress = store.service().subscribe_progress();
    let watcher = tokio::spawn(async move {
        let mut seen = Vec::new();
        while progress.changed().await.is_ok() {
            let pct = *progress.borrow_and_update();
            if pct > 0 {
                seen.push(pct);
            } else if !seen.is_empty() {
                break;
            }
        }
        seen
    });

    // Four chunks of the transport's 64 KiB.
    let file = UploadFile::new("shops.xlsx", vec![0u8; 256 * 1024]);
    store.import_excel(file).await.unwrap();

    let seen = tokio::time::timeout(Duration::from_secs(2), watcher)
        .await
        .unwrap()
        .unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {seen:?}");
    assert_eq!(seen.last(), Some(&100));
    assert_eq!(store.service().progress(), 0);
}

#[tokio::test]
async fn geocode_replaces_cached_merchant() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/merchants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 8, "title": "Tea house" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/merchants/8/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8, "title": "Tea house", "lng": 120.15, "lat": 30.28,
            "geocode_level": "street", "geocode_description": "ok"
        })))
        .mount(&server)
        .await;

    let store: Store<Merchant> = Store::new(client);
    store.fetch_all(&Params::new()).await.unwrap();
    assert!(!store.get_by_id(&EntityId::from(8)).unwrap().has_location());

    store.geocode(&EntityId::from(8)).await.unwrap();
    let merchant = store.get_by_id(&EntityId::from(8)).unwrap();
    assert!(merchant.has_location());
    assert!(merchant.is_geocoded());
}
