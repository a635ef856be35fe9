//! End-to-end tests against a live server on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use agridash::config::ServerConfig;
use agridash::dashboard::{Alert, ApiClient, Dashboard};
use agridash::server::{router, ApiErrorCode, ErrorPayload};
use agridash::{
    Broadcaster, Error, Ingestor, NewObservation, Observation, ObservationField, RecordStore,
    SqliteStore, Storage,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_stream::StreamExt;

const WAIT: Duration = Duration::from_secs(5);

struct TestServer {
    base_url: String,
    ingestor: Ingestor,
}

impl TestServer {
    async fn start(store: Arc<dyn RecordStore>) -> Self {
        Self::start_with(store, &ServerConfig::default()).await
    }

    async fn start_with(store: Arc<dyn RecordStore>, config: &ServerConfig) -> Self {
        let ingestor = Ingestor::new(store, Broadcaster::new(64));
        let app = router(ingestor.clone(), config);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve") });

        Self {
            base_url: format!("http://{addr}"),
            ingestor,
        }
    }

    async fn with_sqlite() -> Self {
        let storage = Storage::open_in_memory().expect("open storage");
        Self::start(Arc::new(SqliteStore::new(storage))).await
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), WAIT).expect("client")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn wait_for_subscribers(&self, expected: usize) {
        timeout(WAIT, async {
            while self.ingestor.broadcaster().subscriber_count() < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("subscribers connected");
    }
}

struct BrokenStore;

#[async_trait]
impl RecordStore for BrokenStore {
    async fn insert(&self, _new: NewObservation) -> agridash::Result<Observation> {
        Err(Error::StoreUnavailable("disk detached".to_string()))
    }

    async fn list_all(&self) -> agridash::Result<Vec<Observation>> {
        Err(Error::StoreUnavailable("disk detached".to_string()))
    }
}

fn sample() -> NewObservation {
    NewObservation::new("Clay", "Drip", "Hybrid", "Organic")
}

#[tokio::test]
async fn submitted_observation_appears_last_in_listing() {
    let server = TestServer::with_sqlite().await;
    let client = server.client();

    let stored = client.submit(&sample()).await.unwrap();
    assert_eq!(stored.soil_type, "Clay");
    assert_eq!(stored.irrigation_method, "Drip");
    assert_eq!(stored.seed_type, "Hybrid");
    assert_eq!(stored.fertilizer_used, "Organic");

    let listing = client.list().await.unwrap();
    assert_eq!(listing.last(), Some(&stored));
}

#[tokio::test]
async fn raw_submission_returns_201_with_stored_record() {
    let server = TestServer::with_sqlite().await;

    let response = reqwest::Client::new()
        .post(server.url("/api/data"))
        .json(&serde_json::json!({
            "soilType": "Clay",
            "irrigationMethod": "Drip",
            "seedType": "Hybrid",
            "fertilizerUsed": "Organic"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored: Observation = response.json().await.unwrap();
    assert_eq!(stored.soil_type, "Clay");
    assert_eq!(stored.irrigation_method, "Drip");
    assert_eq!(stored.seed_type, "Hybrid");
    assert_eq!(stored.fertilizer_used, "Organic");
}

#[tokio::test]
async fn event_stream_frames_records_as_new_data() {
    let server = TestServer::with_sqlite().await;

    let response = reqwest::get(server.url("/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = Box::pin(response.bytes_stream());
    server.wait_for_subscribers(1).await;

    let stored = server.client().submit(&sample()).await.unwrap();

    let text = timeout(WAIT, async {
        let mut text = String::new();
        while !text
            .find("data:")
            .is_some_and(|start| text[start..].contains("\n\n"))
        {
            let chunk = body.next().await.expect("stream open").unwrap();
            text.push_str(&String::from_utf8_lossy(&chunk));
        }
        text
    })
    .await
    .expect("event frame received");

    let lines: Vec<&str> = text.lines().collect();
    let event_at = lines
        .iter()
        .position(|line| *line == "event: newData")
        .unwrap_or_else(|| panic!("no newData event in {text:?}"));
    let data = lines[event_at + 1]
        .strip_prefix("data: ")
        .or_else(|| lines[event_at + 1].strip_prefix("data:"))
        .unwrap_or_else(|| panic!("no data line in {text:?}"));
    let pushed: Observation = serde_json::from_str(data).unwrap();
    assert_eq!(pushed, stored);
}

#[tokio::test]
async fn listing_is_in_creation_order() {
    let server = TestServer::with_sqlite().await;
    let client = server.client();

    for soil in ["Clay", "Loam", "Sandy"] {
        client
            .submit(&NewObservation::new(soil, "Drip", "Hybrid", "Organic"))
            .await
            .unwrap();
    }

    let listing = client.list().await.unwrap();
    let soils: Vec<&str> = listing.iter().map(|r| r.soil_type.as_str()).collect();
    assert_eq!(soils, ["Clay", "Loam", "Sandy"]);
    assert!(listing
        .windows(2)
        .all(|w| w[0].id < w[1].id && w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn empty_field_is_rejected_and_not_stored() {
    let server = TestServer::with_sqlite().await;
    let client = server.client();
    client.submit(&sample()).await.unwrap();

    let err = client
        .submit(&NewObservation::new("", "Drip", "Hybrid", "Organic"))
        .await
        .unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("soilType"), "message: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(client.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_field_returns_validation_payload() {
    let server = TestServer::with_sqlite().await;

    let response = reqwest::Client::new()
        .post(server.url("/api/data"))
        .json(&serde_json::json!({
            "soilType": "Clay",
            "irrigationMethod": "Drip",
            "seedType": "Hybrid"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let payload: ErrorPayload = response.json().await.unwrap();
    assert_eq!(payload.error.code, ApiErrorCode::ValidationError);
    assert!(payload.error.message.contains("fertilizerUsed"));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let server = TestServer::with_sqlite().await;

    let response = reqwest::Client::new()
        .post(server.url("/api/data"))
        .header("content-type", "application/json")
        .body("{\"soilType\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let payload: ErrorPayload = response.json().await.unwrap();
    assert_eq!(payload.error.code, ApiErrorCode::ValidationError);
    assert!(server.client().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn every_subscriber_receives_one_identical_event() {
    let server = TestServer::with_sqlite().await;
    let client = server.client();

    let mut first = client.subscribe().await.unwrap();
    let mut second = client.subscribe().await.unwrap();
    server.wait_for_subscribers(2).await;

    let stored = client.submit(&sample()).await.unwrap();

    let a = timeout(WAIT, first.next()).await.unwrap().unwrap();
    let b = timeout(WAIT, second.next()).await.unwrap().unwrap();
    assert_eq!(a.as_ref(), Some(&stored));
    assert_eq!(b.as_ref(), Some(&stored));

    // Nothing further was pushed.
    assert!(timeout(Duration::from_millis(200), first.next()).await.is_err());
}

#[tokio::test]
async fn rejected_submission_is_not_broadcast() {
    let server = TestServer::with_sqlite().await;
    let client = server.client();

    let mut events = client.subscribe().await.unwrap();
    server.wait_for_subscribers(1).await;

    assert!(client
        .submit(&NewObservation::new("Clay", "", "Hybrid", "Organic"))
        .await
        .is_err());
    assert!(timeout(Duration::from_millis(200), events.next()).await.is_err());
}

#[tokio::test]
async fn storage_failure_returns_500() {
    let server = TestServer::start(Arc::new(BrokenStore)).await;

    let response = reqwest::get(server.url("/api/data")).await.unwrap();
    assert_eq!(response.status(), 500);
    let payload: ErrorPayload = response.json().await.unwrap();
    assert_eq!(payload.error.code, ApiErrorCode::StorageError);

    let err = server.client().submit(&sample()).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));
}

#[tokio::test]
async fn cors_allows_configured_origin() {
    let server = TestServer::with_sqlite().await;

    let response = reqwest::Client::new()
        .get(server.url("/api/data"))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}

#[tokio::test]
async fn wildcard_origin_allows_any_caller() {
    let config = ServerConfig {
        allowed_origin: "*".to_string(),
        ..ServerConfig::default()
    };
    let storage = Storage::open_in_memory().expect("open storage");
    let server = TestServer::start_with(Arc::new(SqliteStore::new(storage)), &config).await;

    for path in ["/api/data", "/api/events"] {
        let response = reqwest::Client::new()
            .get(server.url(path))
            .header("origin", "http://fields.example")
            .send()
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*"),
            "path {path}"
        );
    }
}

#[tokio::test]
async fn dashboard_follows_its_own_submission_once() {
    let server = TestServer::with_sqlite().await;
    server.client().submit(&sample()).await.unwrap();

    let session = Dashboard::new(server.client(), Duration::from_millis(50));
    let _feed = session.start().await;
    server.wait_for_subscribers(1).await;

    let loaded = session.snapshot();
    assert!(!loaded.is_loading());
    assert_eq!(loaded.records().len(), 1);

    session.set_field(ObservationField::SoilType, "Loam");
    session.set_field(ObservationField::IrrigationMethod, "Sprinkler");
    session.set_field(ObservationField::SeedType, "Heirloom");
    session.set_field(ObservationField::FertilizerUsed, "Compost");
    let stored = session.submit().await.unwrap();

    let mut updates = session.watch();
    timeout(WAIT, async {
        loop {
            if updates.borrow_and_update().records().len() == 2 {
                break;
            }
            updates.changed().await.expect("dashboard alive");
        }
    })
    .await
    .expect("pushed record applied");

    let state = session.snapshot();
    assert_eq!(state.records().last(), Some(&stored));
    assert!(state.form().is_empty());
    assert!(matches!(state.alert(), Alert::Success(_)));
}
