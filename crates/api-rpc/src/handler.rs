//! RPC Method Handlers
//!
//! Resolves the caller's identity, checks the privilege each method needs,
//! then delegates to the command processor.

use crate::error::to_rpc_error;
use crate::types::{
    AdmitRequest, CompleteRequest, EmptyRequest, EntryRequest, ForceRequest, ResetResponse,
    SetLocationRequest, SetLocationResponse, SetPriceRequest, SetPriceResponse,
    SetStatusRequest, SetStatusResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use photoqueue_core::application::{CommandProcessor, QueueStats, Subscription};
use photoqueue_core::domain::{EntryStatus, NewEntry, OperationalStatus, QueueEntry, QueueSnapshot};
use photoqueue_core::error::AppError;
use photoqueue_core::port::{Authorizer, OperatorIdentity};
use std::sync::Arc;
use tracing::debug;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    processor: Arc<CommandProcessor>,
    authorizer: Arc<dyn Authorizer>,
}

impl RpcHandler {
    pub fn new(processor: Arc<CommandProcessor>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            processor,
            authorizer,
        }
    }

    /// queue.snapshot.v1
    pub fn snapshot(&self) -> QueueSnapshot {
        self.processor.snapshot().as_ref().clone()
    }

    /// Join the broadcast topic for queue.subscribe
    pub fn subscribe(&self) -> Subscription {
        let subscription = self.processor.subscribe();
        debug!(
            observers = self.processor.broadcaster().subscriber_count(),
            "Observer joining delta stream"
        );
        subscription
    }

    /// queue.admit.v1
    pub async fn admit(&self, params: AdmitRequest) -> RpcResult<QueueEntry> {
        self.operator(params.token.as_deref(), "queue.admit.v1")?;
        let mut request = NewEntry::new(params.name, params.photo_count);
        request.group = params.group;
        self.processor.admit(request).await.map_err(to_rpc_error)
    }

    /// queue.begin_service.v1
    pub async fn begin_service(&self, params: EntryRequest) -> RpcResult<QueueEntry> {
        self.operator(params.token.as_deref(), "queue.begin_service.v1")?;
        self.processor
            .begin_service(&params.id)
            .await
            .map_err(to_rpc_error)
    }

    /// queue.complete.v1
    pub async fn complete(&self, params: CompleteRequest) -> RpcResult<QueueEntry> {
        self.operator(params.token.as_deref(), "queue.complete.v1")?;
        self.processor
            .complete(&params.id, params.payment_method.as_deref())
            .await
            .map_err(to_rpc_error)
    }

    /// queue.cancel.v1
    pub async fn cancel(&self, params: EntryRequest) -> RpcResult<QueueEntry> {
        self.operator(params.token.as_deref(), "queue.cancel.v1")?;
        self.processor.cancel(&params.id).await.map_err(to_rpc_error)
    }

    /// admin.force.v1
    pub async fn force(&self, params: ForceRequest) -> RpcResult<QueueEntry> {
        self.elevated(params.token.as_deref(), "admin.force.v1")?;
        let target: EntryStatus = params
            .target
            .parse()
            .map_err(|e| to_rpc_error(AppError::from(e)))?;
        self.processor
            .force(&params.id, target, params.payment_method.as_deref())
            .await
            .map_err(to_rpc_error)
    }

    /// admin.reset.v1
    pub async fn reset(&self, params: EmptyRequest) -> RpcResult<ResetResponse> {
        self.elevated(params.token.as_deref(), "admin.reset.v1")?;
        let removed = self.processor.reset().await;
        Ok(ResetResponse { removed })
    }

    /// status.set.v1
    pub async fn set_status(&self, params: SetStatusRequest) -> RpcResult<SetStatusResponse> {
        self.operator(params.token.as_deref(), "status.set.v1")?;
        let status: OperationalStatus = params
            .status
            .parse()
            .map_err(|e| to_rpc_error(AppError::from(e)))?;
        let revision = self.processor.set_status(status).await;
        Ok(SetStatusResponse { status, revision })
    }

    /// location.set.v1
    pub async fn set_location(
        &self,
        params: SetLocationRequest,
    ) -> RpcResult<SetLocationResponse> {
        self.operator(params.token.as_deref(), "location.set.v1")?;
        let state = self
            .processor
            .set_location(params.location.as_deref(), params.presets)
            .await
            .map_err(to_rpc_error)?;
        Ok(SetLocationResponse {
            location: state.location,
            preset_locations: state.preset_locations,
            revision: state.revision,
        })
    }

    /// pricing.set.v1
    pub async fn set_price(&self, params: SetPriceRequest) -> RpcResult<SetPriceResponse> {
        self.elevated(params.token.as_deref(), "pricing.set.v1")?;
        let revision = self
            .processor
            .update_unit_price(params.unit_price)
            .await
            .map_err(to_rpc_error)?;
        Ok(SetPriceResponse {
            unit_price: params.unit_price,
            revision,
        })
    }

    /// admin.stats.v1
    pub fn stats(&self, params: EmptyRequest) -> RpcResult<QueueStats> {
        self.elevated(params.token.as_deref(), "admin.stats.v1")?;
        Ok(self.processor.stats())
    }

    fn identify(&self, token: Option<&str>) -> OperatorIdentity {
        self.authorizer.identify(token)
    }

    fn operator(&self, token: Option<&str>, method: &str) -> RpcResult<()> {
        self.identify(token).require_operator().map_err(|e| {
            debug!(method, "Unauthorized call");
            to_rpc_error(e)
        })
    }

    fn elevated(&self, token: Option<&str>, method: &str) -> RpcResult<()> {
        self.identify(token).require_elevated().map_err(|e| {
            debug!(method, "Unauthorized call");
            to_rpc_error(e)
        })
    }
}
