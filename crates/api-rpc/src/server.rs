//! JSON-RPC Server
//!
//! Serves HTTP and WebSocket on one TCP port. Queue deltas are pushed to
//! WebSocket clients through the `queue.subscribe` subscription.

use crate::handler::RpcHandler;
use crate::types::{
    AdmitRequest, CompleteRequest, EmptyRequest, EntryRequest, ForceRequest, SetLocationRequest,
    SetPriceRequest, SetStatusRequest,
};
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::{PendingSubscriptionSink, RpcModule, SubscriptionMessage};
use photoqueue_core::application::{CommandProcessor, Subscription, SubscriptionError};
use photoqueue_core::port::Authorizer;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

pub const SUBSCRIBE_METHOD: &str = "queue.subscribe";
pub const NOTIFICATION_METHOD: &str = "queue.event";
pub const UNSUBSCRIBE_METHOD: &str = "queue.unsubscribe";

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        processor: Arc<CommandProcessor>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(processor, authorizer)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Returns the bound address (useful with port 0) and the stop handle.
    pub async fn start(self) -> Result<(SocketAddr, ServerHandle), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server (HTTP + WebSocket)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;
        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let module = self.module().map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok((local_addr, handle))
    }

    fn module(&self) -> Result<RpcModule<()>, jsonrpsee::core::RegisterMethodError> {
        let mut module = RpcModule::new(());

        // Reads
        let handler = self.handler.clone();
        module.register_method("queue.snapshot.v1", move |_, _, _| {
            Ok::<_, ErrorObjectOwned>(handler.snapshot())
        })?;

        let handler = self.handler.clone();
        module.register_method("admin.stats.v1", move |params, _, _| {
            let req: Option<EmptyRequest> = params.parse()?;
            handler.stats(req.unwrap_or_default())
        })?;

        // Queue commands
        let handler = self.handler.clone();
        module.register_async_method("queue.admit.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: AdmitRequest = params.parse()?;
                handler.admit(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue.begin_service.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: EntryRequest = params.parse()?;
                handler.begin_service(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue.complete.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: CompleteRequest = params.parse()?;
                handler.complete(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("queue.cancel.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: EntryRequest = params.parse()?;
                handler.cancel(req).await
            }
        })?;

        // Administration
        let handler = self.handler.clone();
        module.register_async_method("admin.force.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: ForceRequest = params.parse()?;
                handler.force(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("admin.reset.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: Option<EmptyRequest> = params.parse()?;
                handler.reset(req.unwrap_or_default()).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("status.set.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SetStatusRequest = params.parse()?;
                handler.set_status(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("location.set.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SetLocationRequest = params.parse()?;
                handler.set_location(req).await
            }
        })?;

        let handler = self.handler.clone();
        module.register_async_method("pricing.set.v1", move |params, _, _| {
            let handler = handler.clone();
            async move {
                let req: SetPriceRequest = params.parse()?;
                handler.set_price(req).await
            }
        })?;

        // Deltas. The broadcaster subscription is taken before the call is
        // acknowledged, so anything committed afterwards reaches the client.
        let handler = self.handler.clone();
        module.register_subscription(
            SUBSCRIBE_METHOD,
            NOTIFICATION_METHOD,
            UNSUBSCRIBE_METHOD,
            move |_, pending, _, _| forward_events(pending, handler.subscribe()),
        )?;

        Ok(module)
    }
}

/// Pipe broadcaster deltas into one WebSocket subscription until either side closes
async fn forward_events(
    pending: PendingSubscriptionSink,
    mut subscription: Subscription,
) -> SubscriptionResult {
    let sink = pending.accept().await?;
    debug!(subscription_id = ?sink.subscription_id(), "Observer subscribed");

    loop {
        tokio::select! {
            _ = sink.closed() => break,
            next = subscription.recv() => match next {
                Ok(event) => {
                    let message = SubscriptionMessage::from_json(&event)?;
                    if sink.send(message).await.is_err() {
                        break;
                    }
                }
                // The client sees the revision gap and resyncs
                Err(SubscriptionError::Lagged(skipped)) => {
                    warn!(skipped, "Observer lagged; deltas dropped");
                }
                Err(SubscriptionError::Closed) => break,
            },
        }
    }

    debug!(subscription_id = ?sink.subscription_id(), "Observer left");
    Ok(())
}
