//! Liveness probe trait and HTTP implementation.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Errors from a liveness probe.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbeError {
    /// The request could not be made or timed out.
    #[error("liveness request failed: {0}")]
    Http(String),

    /// The endpoint answered with a non-success status.
    #[error("liveness endpoint returned status {0}")]
    Status(u16),
}

/// A lightweight reachability check against the backend.
///
/// Only success or failure is meaningful; the response body is ignored.
pub trait LivenessProbe: Send + Sync {
    fn check(&self) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Probe that GETs a status URL with a fixed timeout.
#[derive(Clone)]
pub struct HttpLivenessProbe {
    http: reqwest::Client,
    url: String,
}

impl HttpLivenessProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

impl LivenessProbe for HttpLivenessProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

impl<T: LivenessProbe> LivenessProbe for std::sync::Arc<T> {
    fn check(&self) -> impl Future<Output = Result<(), ProbeError>> + Send {
        (**self).check()
    }
}
