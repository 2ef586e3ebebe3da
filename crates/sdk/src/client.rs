//! PhotoQueue Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    EntryStatus, LocationChange, NewEntry, OperationalStatus, PriceChange, QueueEntry, QueueEvent,
    QueueSnapshot, QueueStats, ResetResponse, StatusChange,
};
use jsonrpsee::core::client::{ClientT, Subscription, SubscriptionClientT};
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use photoqueue_core::domain::Price;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// PhotoQueue Engine Client
///
/// Commands go over HTTP; `subscribe` opens a separate WebSocket connection.
///
/// # Example
///
/// ```no_run
/// use photoqueue_sdk::{NewEntry, PhotoQueueClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PhotoQueueClient::connect("http://127.0.0.1:9630")
///     .await?
///     .with_token("operator-secret");
/// let entry = client.admit(NewEntry::new("Ana", 3)).await?;
/// println!("{} pays {}", entry.name, entry.total_price);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PhotoQueueClient {
    client: HttpClient,
    ws_url: String,
    token: Option<String>,
}

impl PhotoQueueClient {
    /// Connect to the PhotoQueue daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9630`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();
        let ws_url = websocket_url(url)?;

        let client = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            ws_url,
            token: None,
        })
    }

    /// Attach the operator or admin token sent with every call
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Full current state
    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let response: QueueSnapshot = self
            .client
            .request("queue.snapshot.v1", rpc_params![])
            .await?;
        Ok(response)
    }

    pub async fn admit(&self, entry: NewEntry) -> Result<QueueEntry> {
        self.call(
            "queue.admit.v1",
            json!({
                "name": entry.name,
                "group": entry.group,
                "photoCount": entry.photo_count,
            }),
        )
        .await
    }

    pub async fn begin_service(&self, id: &str) -> Result<QueueEntry> {
        self.call("queue.begin_service.v1", json!({ "id": id }))
            .await
    }

    /// # Arguments
    ///
    /// * `payment_method` - `cash`, `electronic` or `qris`; required by the daemon
    pub async fn complete(&self, id: &str, payment_method: Option<&str>) -> Result<QueueEntry> {
        self.call(
            "queue.complete.v1",
            json!({ "id": id, "paymentMethod": payment_method }),
        )
        .await
    }

    pub async fn cancel(&self, id: &str) -> Result<QueueEntry> {
        self.call("queue.cancel.v1", json!({ "id": id })).await
    }

    /// Elevated: set any status directly
    pub async fn force(
        &self,
        id: &str,
        target: EntryStatus,
        payment_method: Option<&str>,
    ) -> Result<QueueEntry> {
        self.call(
            "admin.force.v1",
            json!({
                "id": id,
                "target": target.to_string(),
                "paymentMethod": payment_method,
            }),
        )
        .await
    }

    /// Elevated: drop every entry; returns how many were removed
    pub async fn reset(&self) -> Result<usize> {
        let response: ResetResponse = self.call("admin.reset.v1", json!({})).await?;
        Ok(response.removed)
    }

    pub async fn set_status(&self, status: OperationalStatus) -> Result<StatusChange> {
        self.call("status.set.v1", json!({ "status": status.to_string() }))
            .await
    }

    pub async fn set_location(
        &self,
        location: Option<&str>,
        presets: Option<Vec<String>>,
    ) -> Result<LocationChange> {
        self.call(
            "location.set.v1",
            json!({ "location": location, "presets": presets }),
        )
        .await
    }

    /// Elevated: price applied to future admissions
    pub async fn set_unit_price(&self, unit_price: Price) -> Result<PriceChange> {
        self.call("pricing.set.v1", json!({ "unitPrice": unit_price }))
            .await
    }

    /// Elevated: counts and revenue
    pub async fn stats(&self) -> Result<QueueStats> {
        self.call("admin.stats.v1", json!({})).await
    }

    /// Open a WebSocket and join the delta stream.
    ///
    /// Fetch a snapshot only after this returns; see `QueueWatcher`.
    pub async fn subscribe(&self) -> Result<EventStream> {
        let ws = WsClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(&self.ws_url)
            .await
            .map_err(|e| SdkError::Connection(format!("WebSocket connect failed: {}", e)))?;
        let subscription = ws
            .subscribe("queue.subscribe", rpc_params![], "queue.unsubscribe")
            .await?;
        Ok(EventStream {
            subscription,
            _ws: ws,
        })
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, request: Value) -> Result<R> {
        let params = self.params(request)?;
        let response: R = self.client.request(method, params).await?;
        Ok(response)
    }

    /// Object params: request fields (nulls dropped) plus the token
    fn params(&self, request: Value) -> Result<ObjectParams> {
        let mut params = ObjectParams::new();
        if let Value::Object(fields) = request {
            for (name, value) in fields {
                if !value.is_null() {
                    params.insert(&name, value)?;
                }
            }
        }
        if let Some(token) = &self.token {
            params.insert("token", token)?;
        }
        Ok(params)
    }
}

/// Live delta stream; owns its WebSocket connection
pub struct EventStream {
    subscription: Subscription<QueueEvent>,
    _ws: WsClient,
}

impl EventStream {
    /// Next delta, or `None` once the daemon closed the stream
    pub async fn next(&mut self) -> Option<Result<QueueEvent>> {
        self.subscription
            .next()
            .await
            .map(|event| event.map_err(SdkError::from))
    }
}

fn websocket_url(url: &str) -> Result<String> {
    if let Some(rest) = url.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else if let Some(rest) = url.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(url.to_string())
    } else {
        Err(SdkError::InvalidUrl(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url_follows_scheme() {
        assert_eq!(
            websocket_url("http://127.0.0.1:9630").unwrap(),
            "ws://127.0.0.1:9630"
        );
        assert_eq!(
            websocket_url("https://booth.example").unwrap(),
            "wss://booth.example"
        );
        assert!(matches!(
            websocket_url("127.0.0.1:9630"),
            Err(SdkError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let result = PhotoQueueClient::connect("localhost").await;
        assert!(matches!(result, Err(SdkError::InvalidUrl(_))));
    }
}
