//! Retry layer wrapping every remote call.
//!
//! Rate-limit errors (420) are absorbed by sleeping for the requested time
//! and repeating the identical call. Migration errors (303) are absorbed by
//! rerouting: an authentication-phase redirect moves the process-wide
//! default datacenter, any other redirect pins only the current call chain
//! to the new datacenter. Everything else is surfaced to the caller.

use std::future::Future;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tgbucket_protocol::{CallRoute, MigrateScope, Migration, Recovery, RpcMethod};

use crate::TransferError;
use crate::caller::{CallError, RemoteCaller};

/// Bound on how many recoverable failures one logical call may absorb.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries indefinitely.
    pub max_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self { max_retries: None }
    }

    pub fn bounded(max_retries: u32) -> Self {
        Self {
            max_retries: Some(max_retries),
        }
    }

    fn allows(&self, retries_so_far: u32) -> bool {
        self.max_retries.is_none_or(|max| retries_so_far < max)
    }
}

/// Wraps a [`RemoteCaller`] with rate-limit and redirect handling.
pub struct ResilientExecutor<C> {
    caller: C,
    policy: RetryPolicy,
    /// Last default datacenter installed through an auth redirect. Only
    /// reported, never trusted: the collaborator owns the real default.
    /// Held across the collaborator call so switches never interleave.
    default_dc: Mutex<Option<i32>>,
}

impl<C: RemoteCaller> ResilientExecutor<C> {
    /// Creates an executor that retries recoverable errors indefinitely.
    pub fn new(caller: C) -> Self {
        Self {
            caller,
            policy: RetryPolicy::default(),
            default_dc: Mutex::new(None),
        }
    }

    /// Replaces the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Default datacenter installed by the most recent auth redirect, if any.
    pub async fn default_dc(&self) -> Option<i32> {
        *self.default_dc.lock().await
    }

    /// Sends a typed request and decodes its response.
    pub async fn call<M: RpcMethod>(
        &self,
        request: &M,
        route: CallRoute,
    ) -> Result<M::Response, TransferError> {
        self.call_until(request, route, None).await
    }

    /// Like [`call`](Self::call), but gives up with
    /// [`TransferError::Cancelled`] as soon as `cancel` fires, whether the
    /// call is on the wire or waiting out a rate limit.
    pub async fn call_until<M: RpcMethod>(
        &self,
        request: &M,
        route: CallRoute,
        cancel: Option<&CancellationToken>,
    ) -> Result<M::Response, TransferError> {
        let params = serde_json::to_value(request)?;
        let result = self.execute_until(M::NAME, &params, route, cancel).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Invokes `method`, absorbing recoverable errors until it succeeds, a
    /// fatal error occurs, or the retry policy runs out.
    ///
    /// `route` is owned by this call chain: a call-scoped redirect rebinds it
    /// here and never reaches other calls.
    pub async fn execute(
        &self,
        method: &str,
        params: &Value,
        route: CallRoute,
    ) -> Result<Value, TransferError> {
        self.execute_until(method, params, route, None).await
    }

    /// [`execute`](Self::execute) bounded by a cancellation token. No call is
    /// issued once `cancel` has fired; an in-flight call or pending rate-limit
    /// wait is abandoned.
    pub async fn execute_until(
        &self,
        method: &str,
        params: &Value,
        route: CallRoute,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value, TransferError> {
        let mut route = route;
        let mut retries: u32 = 0;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                debug!(method, retries, "call cancelled before issue");
                return Err(TransferError::Cancelled);
            }
            debug!(method, dc_id = ?route.dc_id, retries, "remote call");

            let reply = unless_cancelled(cancel, self.caller.call(method, params, &route)).await?;
            let err = match reply {
                Ok(result) => return Ok(result),
                Err(CallError::Transport(message)) => {
                    error!(method, %message, "remote call failed without structured error");
                    return Err(TransferError::Transport {
                        method: method.to_string(),
                        message,
                    });
                }
                Err(CallError::Rpc(err)) => err,
            };

            let Some(recovery) = err.recovery() else {
                error!(method, code = err.code, message = %err.message, "remote call failed");
                return Err(TransferError::Remote {
                    method: method.to_string(),
                    source: err,
                });
            };

            if !self.policy.allows(retries) {
                error!(method, attempts = retries + 1, "retry budget exhausted");
                return Err(TransferError::RetriesExhausted {
                    method: method.to_string(),
                    attempts: retries + 1,
                    last: err,
                });
            }
            retries += 1;

            match recovery {
                Recovery::FloodWait(wait) => {
                    warn!(method, seconds = wait.as_secs(), "flood wait");
                    unless_cancelled(cancel, tokio::time::sleep(wait)).await?;
                }
                Recovery::Migrate(Migration {
                    scope: MigrateScope::Session,
                    dc_id,
                }) => {
                    warn!(method, dc_id, kind = ?err.migrate_type(), "session migration");
                    self.switch_default_dc(dc_id).await?;
                }
                Recovery::Migrate(Migration {
                    scope: MigrateScope::Call,
                    dc_id,
                }) => {
                    warn!(method, dc_id, kind = ?err.migrate_type(), "call migration");
                    route = route.redirected(dc_id);
                }
            }
        }
    }

    /// Applied on every auth redirect, even to the datacenter installed
    /// last: another executor sharing the collaborator may have moved it.
    async fn switch_default_dc(&self, dc_id: i32) -> Result<(), TransferError> {
        let mut current = self.default_dc.lock().await;
        self.caller
            .set_default_dc(dc_id)
            .await
            .map_err(|e| call_failure("set_default_dc", e))?;
        info!(dc_id, previous = ?*current, "default datacenter switched");
        *current = Some(dc_id);
        Ok(())
    }
}

/// Awaits `fut`, or fails with [`TransferError::Cancelled`] if `cancel`
/// fires first.
async fn unless_cancelled<F: Future>(
    cancel: Option<&CancellationToken>,
    fut: F,
) -> Result<F::Output, TransferError> {
    let Some(token) = cancel else {
        return Ok(fut.await);
    };
    tokio::select! {
        _ = token.cancelled() => {
            debug!("remote call abandoned on cancellation");
            Err(TransferError::Cancelled)
        }
        out = fut => Ok(out),
    }
}

fn call_failure(method: &str, err: CallError) -> TransferError {
    match err {
        CallError::Rpc(source) => TransferError::Remote {
            method: method.to_string(),
            source,
        },
        CallError::Transport(message) => TransferError::Transport {
            method: method.to_string(),
            message,
        },
    }
}
