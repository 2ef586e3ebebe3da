//! JSON-RPC End-to-End Tests
//!
//! Real server on an ephemeral port, driven through the SDK client

use jsonrpsee::server::ServerHandle;
use photoqueue_api_rpc::{RpcServer, RpcServerConfig};
use photoqueue_core::application::CommandProcessor;
use photoqueue_core::port::StaticTokenAuthorizer;
use photoqueue_integration_tests::default_processor;
use photoqueue_sdk::{
    EntryStatus, NewEntry, OperationalStatus, PaymentMethod, PhotoQueueClient, QueueWatcher,
};
use std::sync::Arc;
use std::time::Duration;

const OPERATOR_TOKEN: &str = "op-token";
const ADMIN_TOKEN: &str = "admin-token";

struct TestServer {
    url: String,
    processor: Arc<CommandProcessor>,
    handle: ServerHandle,
}

impl TestServer {
    async fn start() -> Self {
        let processor = default_processor();
        let authorizer = Arc::new(StaticTokenAuthorizer::new(
            vec![OPERATOR_TOKEN.to_string()],
            vec![ADMIN_TOKEN.to_string()],
        ));
        let config = RpcServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let (addr, handle) = RpcServer::new(config, processor.clone(), authorizer)
            .start()
            .await
            .unwrap();
        Self {
            url: format!("http://{}", addr),
            processor,
            handle,
        }
    }

    async fn client(&self, token: Option<&str>) -> PhotoQueueClient {
        let client = PhotoQueueClient::connect(&self.url).await.unwrap();
        match token {
            Some(token) => client.with_token(token),
            None => client,
        }
    }

    async fn stop(self) {
        self.handle.stop().unwrap();
        self.handle.stopped().await;
    }
}

#[tokio::test]
async fn test_lifecycle_over_rpc() {
    let server = TestServer::start().await;
    let operator = server.client(Some(OPERATOR_TOKEN)).await;

    let entry = operator
        .admit(NewEntry::new("Ana", 3).with_group("Keluarga"))
        .await
        .unwrap();
    assert_eq!(entry.total_price, 15000);
    assert_eq!(entry.group.as_deref(), Some("Keluarga"));

    operator.begin_service(&entry.id).await.unwrap();
    let done = operator.complete(&entry.id, Some("qris")).await.unwrap();
    assert_eq!(done.status, EntryStatus::Done);
    assert_eq!(done.payment_method, Some(PaymentMethod::Electronic));

    // Snapshot is readable without a token
    let anonymous = server.client(None).await;
    let snapshot = anonymous.snapshot().await.unwrap();
    assert_eq!(snapshot.revision, 3);
    assert_eq!(snapshot.entries, vec![done]);
    assert_eq!(&snapshot, server.processor.snapshot().as_ref());

    server.stop().await;
}

#[tokio::test]
async fn test_error_codes_over_rpc() {
    let server = TestServer::start().await;
    let operator = server.client(Some(OPERATOR_TOKEN)).await;

    let err = server
        .client(None)
        .await
        .admit(NewEntry::new("Ana", 1))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    let err = operator.admit(NewEntry::new("Ana", 0)).await.unwrap_err();
    assert!(err.is_validation());

    let ana = operator.admit(NewEntry::new("Ana", 1)).await.unwrap();
    let budi = operator.admit(NewEntry::new("Budi", 1)).await.unwrap();
    operator.begin_service(&ana.id).await.unwrap();

    let err = operator.begin_service(&budi.id).await.unwrap_err();
    assert!(err.is_resource_busy());

    let err = operator.complete(&ana.id, None).await.unwrap_err();
    assert!(err.is_validation());

    let err = operator.complete(&budi.id, Some("cash")).await.unwrap_err();
    assert!(err.is_invalid_transition());

    let err = operator.cancel("missing").await.unwrap_err();
    assert!(err.is_not_found());

    operator.set_status(OperationalStatus::Closed).await.unwrap();
    let err = operator.admit(NewEntry::new("Late", 1)).await.unwrap_err();
    assert!(err.is_admission_closed());

    server.stop().await;
}

#[tokio::test]
async fn test_admin_methods_require_elevated_token() {
    let server = TestServer::start().await;
    let operator = server.client(Some(OPERATOR_TOKEN)).await;
    let admin = server.client(Some(ADMIN_TOKEN)).await;

    operator.admit(NewEntry::new("Ana", 2)).await.unwrap();

    assert!(operator.reset().await.unwrap_err().is_unauthorized());
    assert!(operator.set_unit_price(6000).await.unwrap_err().is_unauthorized());
    assert!(operator.stats().await.unwrap_err().is_unauthorized());
    assert!(operator
        .force("e-1", EntryStatus::Cancelled, None)
        .await
        .unwrap_err()
        .is_unauthorized());

    let forced = admin
        .force("e-1", EntryStatus::Done, Some("cash"))
        .await
        .unwrap();
    assert_eq!(forced.status, EntryStatus::Done);

    let stats = admin.stats().await.unwrap();
    assert_eq!(stats.done, 1);
    assert_eq!(stats.cash_revenue, 10000);

    let change = admin.set_unit_price(6000).await.unwrap();
    assert_eq!(change.unit_price, 6000);

    let location = operator
        .set_location(Some("Pantai"), Some(vec!["Pantai".into(), "Alun-alun".into()]))
        .await
        .unwrap();
    assert_eq!(location.location, "Pantai");
    assert_eq!(location.preset_locations, vec!["Pantai", "Alun-alun"]);

    assert_eq!(admin.reset().await.unwrap(), 1);
    assert!(admin.snapshot().await.unwrap().entries.is_empty());

    server.stop().await;
}

/// The watcher mirrors the engine through the WebSocket delta stream
#[tokio::test]
async fn test_watcher_follows_changes() {
    let server = TestServer::start().await;
    let operator = server.client(Some(OPERATOR_TOKEN)).await;
    operator.admit(NewEntry::new("Ana", 1)).await.unwrap();

    let mut watcher = QueueWatcher::start(server.client(None).await)
        .await
        .unwrap();
    assert_eq!(watcher.revision(), 1);

    operator.admit(NewEntry::new("Budi", 2)).await.unwrap();
    operator.begin_service("e-1").await.unwrap();
    operator.set_status(OperationalStatus::Break).await.unwrap();

    let state = tokio::time::timeout(Duration::from_secs(5), watcher.wait_for_revision(4))
        .await
        .expect("watcher caught up")
        .unwrap();
    assert_eq!(state, server.processor.snapshot().as_ref());
    assert_eq!(state.status, OperationalStatus::Break);
    assert_eq!(state.in_service.as_ref().map(|e| e.id.as_str()), Some("e-1"));
    assert_eq!(watcher.resyncs(), 0);

    server.stop().await;
}

/// Two concurrent operators racing to start service on the same entry
#[tokio::test]
async fn test_concurrent_begin_service_over_rpc() {
    let server = TestServer::start().await;
    let operator = server.client(Some(OPERATOR_TOKEN)).await;
    operator.admit(NewEntry::new("Ana", 1)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = operator.clone();
        handles.push(tokio::spawn(async move { client.begin_service("e-1").await }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(e.is_invalid_transition() || e.is_resource_busy()),
        }
    }
    assert_eq!(successes, 1);

    server.stop().await;
}
