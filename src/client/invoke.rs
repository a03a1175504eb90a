//! Call execution: constant calls, state-changing calls and the status poll loop.

use crate::client::core::{request_headers, GatewayClient};
use crate::client::types::{status_path, CallHandle, CallProgress, CallResult, CallStats, Invocation};
use crate::transport::GatewayRequest;
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

impl GatewayClient {
    /// Call a constant (read-only) function and return the gateway's JSON
    /// answer unchanged.
    pub async fn call_constant(&self, function_name: &str, params: Value) -> Result<Value> {
        let invocation = Invocation::with_params_value(function_name, params)?;
        self.invoke_constant(&invocation).await
    }

    /// Constant call from a prepared [`Invocation`]. A sender, if present, is
    /// forwarded in the `wallet` header.
    pub async fn invoke_constant(&self, invocation: &Invocation) -> Result<Value> {
        invocation.validate()?;
        let request_id = Uuid::new_v4().to_string();
        let path = self.session.target().function_path(&invocation.function);
        let request = GatewayRequest::post(path.clone(), Value::Object(invocation.params.clone()))
            .with_headers(request_headers(
                &self.session,
                invocation.sender.as_deref(),
                &request_id,
            ));

        let start = Instant::now();
        let envelope = self.transport.execute(request).await?;
        info!(
            http_status = envelope.status,
            endpoint = path.as_str(),
            request_id = request_id.as_str(),
            duration_ms = start.elapsed().as_millis(),
            "constant call completed"
        );
        envelope.into_result()
    }

    /// Call a state-changing function and wait for its terminal status.
    ///
    /// `sender` is the wallet address or name the gateway attributes the
    /// transaction to.
    pub async fn call_function(
        &self,
        sender: Option<&str>,
        function_name: &str,
        params: Value,
    ) -> Result<CallResult> {
        Ok(self
            .call_function_with_stats(sender, function_name, params)
            .await?
            .0)
    }

    /// Like [`call_function`](Self::call_function), also returning per-call stats.
    pub async fn call_function_with_stats(
        &self,
        sender: Option<&str>,
        function_name: &str,
        params: Value,
    ) -> Result<(CallResult, CallStats)> {
        let mut invocation = Invocation::with_params_value(function_name, params)?;
        invocation.sender = sender.map(|s| s.to_string());
        self.invoke_function_with_stats(&invocation).await
    }

    pub async fn invoke_function(&self, invocation: &Invocation) -> Result<CallResult> {
        Ok(self.invoke_function_with_stats(invocation).await?.0)
    }

    pub async fn invoke_function_with_stats(
        &self,
        invocation: &Invocation,
    ) -> Result<(CallResult, CallStats)> {
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let handle = self.submit_with_request_id(invocation, &request_id).await?;
        let (result, status_checks) = self.poll_until_terminal(&handle, &request_id).await?;

        let stats = CallStats {
            call_id: handle.call_id,
            function: invocation.function.clone(),
            client_request_id: request_id,
            status_checks,
            duration_ms: start.elapsed().as_millis(),
        };
        info!(
            call_id = stats.call_id.as_str(),
            function = stats.function.as_str(),
            status = result.status.as_str(),
            status_checks = stats.status_checks,
            duration_ms = stats.duration_ms,
            "function call reached terminal status"
        );
        Ok((result, stats))
    }

    /// Submit a state-changing call without waiting for it.
    ///
    /// The returned handle means "accepted", not "completed".
    pub async fn submit_function(&self, invocation: &Invocation) -> Result<CallHandle> {
        let request_id = Uuid::new_v4().to_string();
        self.submit_with_request_id(invocation, &request_id).await
    }

    async fn submit_with_request_id(
        &self,
        invocation: &Invocation,
        request_id: &str,
    ) -> Result<CallHandle> {
        invocation.validate()?;
        let path = self.session.target().function_path(&invocation.function);
        let request = GatewayRequest::post(path.clone(), Value::Object(invocation.params.clone()))
            .with_headers(request_headers(
                &self.session,
                invocation.sender.as_deref(),
                request_id,
            ));

        let envelope = self.transport.execute(request).await?;
        info!(
            http_status = envelope.status,
            endpoint = path.as_str(),
            request_id = request_id,
            "function call submitted"
        );
        let json = envelope.into_result()?;

        let call_id = match json.get("callId") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(Error::invalid_response_with_context(
                    "submission accepted without a callId",
                    ErrorContext::new()
                        .with_field_path("callId")
                        .with_details(format!("function {}", invocation.function))
                        .with_source("call_invoker"),
                ))
            }
        };
        Ok(CallHandle::new(call_id))
    }

    /// One status check for `handle`.
    pub async fn call_status(&self, handle: &CallHandle) -> Result<CallProgress> {
        let request_id = Uuid::new_v4().to_string();
        self.status_once(handle, &request_id).await
    }

    async fn status_once(&self, handle: &CallHandle, request_id: &str) -> Result<CallProgress> {
        let request = GatewayRequest::get(status_path(&handle.call_id))
            .with_headers(request_headers(&self.session, None, request_id));
        let json = self.transport.execute(request).await?.into_result()?;
        let status = json.get("status").and_then(|s| s.as_str());
        Ok(self.poll.classify(status))
    }

    /// Poll until `handle` reaches a terminal status or the policy's timeout
    /// expires.
    pub async fn wait_for_call(&self, handle: &CallHandle) -> Result<CallResult> {
        let request_id = Uuid::new_v4().to_string();
        Ok(self.poll_until_terminal(handle, &request_id).await?.0)
    }

    /// Returns the terminal result and the number of status requests issued.
    ///
    /// The budget also bounds each status request: one still in flight at the
    /// deadline is dropped and reported as `CallTimeout`.
    async fn poll_until_terminal(
        &self,
        handle: &CallHandle,
        request_id: &str,
    ) -> Result<(CallResult, u32)> {
        let policy = &self.poll;
        let started = Instant::now();
        let deadline = started + policy.timeout;
        let mut checks: u32 = 0;
        let mut attempt: u32 = 0;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let progress =
                match tokio::time::timeout(remaining, self.status_once(handle, request_id)).await {
                    Ok(progress) => progress?,
                    Err(_) => {
                        debug!(
                            call_id = handle.call_id.as_str(),
                            check = checks + 1,
                            "status request outlived the poll budget"
                        );
                        return Err(call_timeout(handle, started));
                    }
                };
            checks = checks.saturating_add(1);

            let pending_status = match progress {
                CallProgress::Terminal(result) => return Ok((result, checks)),
                CallProgress::Pending { status } => status,
            };

            let elapsed = started.elapsed();
            if elapsed >= policy.timeout {
                return Err(call_timeout(handle, started));
            }

            let delay = policy
                .backoff_delay(attempt)
                .min(policy.timeout - elapsed);
            debug!(
                call_id = handle.call_id.as_str(),
                status = pending_status.as_deref().unwrap_or(""),
                check = checks,
                delay_ms = delay.as_millis(),
                "call still pending"
            );
            tokio::time::sleep(delay).await;
            attempt = attempt.saturating_add(1);
        }
    }
}

fn call_timeout(handle: &CallHandle, started: Instant) -> Error {
    Error::CallTimeout {
        call_id: handle.call_id.clone(),
        elapsed_ms: started.elapsed().as_millis(),
    }
}
