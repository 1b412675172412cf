//! The remote-call collaborator consumed by the executor.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tgbucket_protocol::{CallRoute, RpcError};

/// Failure reported by a [`RemoteCaller`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    /// The remote side answered with a structured error.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The call failed without structured error information.
    #[error("transport: {0}")]
    Transport(String),
}

/// Issues logical remote calls.
///
/// Connection setup, encryption and serialization live behind this trait.
/// Implementations must be safe to call from concurrent transfers.
pub trait RemoteCaller: Send + Sync {
    /// Invokes `method` with `params`, honoring the datacenter override in `route`.
    fn call(
        &self,
        method: &str,
        params: &Value,
        route: &CallRoute,
    ) -> impl Future<Output = Result<Value, CallError>> + Send;

    /// Moves the default datacenter used by calls without an override.
    fn set_default_dc(&self, dc_id: i32) -> impl Future<Output = Result<(), CallError>> + Send;
}

impl<T: RemoteCaller> RemoteCaller for Arc<T> {
    fn call(
        &self,
        method: &str,
        params: &Value,
        route: &CallRoute,
    ) -> impl Future<Output = Result<Value, CallError>> + Send {
        (**self).call(method, params, route)
    }

    fn set_default_dc(&self, dc_id: i32) -> impl Future<Output = Result<(), CallError>> + Send {
        (**self).set_default_dc(dc_id)
    }
}
