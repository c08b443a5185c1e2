//! Request execution with an optional warm-up delay

use std::time::Duration;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::common::Result;

/// Sends exactly one request per call, never retrying
pub struct RequestExecutor<T> {
    transport: T,
}

impl<T: HttpTransport> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Wait `delay`, then dispatch
    pub async fn execute(&self, request: &HttpRequest, delay: Duration) -> Result<HttpResponse> {
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, url = %request.url, "Delaying request");
            tokio::time::sleep(delay).await;
        }

        tracing::debug!(method = %request.method, url = %request.url, "Sending request");
        let response = self.transport.send(request).await?;
        tracing::debug!(status = response.status, url = %request.url, "Received response");

        Ok(response)
    }
}
