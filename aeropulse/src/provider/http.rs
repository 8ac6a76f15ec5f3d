//! HTTP client abstraction for testability.

use std::future::Future;
use std::time::Duration;

use super::error::ProviderError;

/// Trait for asynchronous HTTP GET operations.
///
/// This abstraction allows dependency injection of mock clients in
/// tests; the only real implementation is [`ReqwestClient`].
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request with query parameters.
    ///
    /// Returns the response body as bytes, or an error for transport
    /// failures and non-success status codes.
    fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
///
/// Uses a reusable `reqwest::Client` with connection pooling and a
/// fixed request timeout.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Mock HTTP client with scripted responses.
    ///
    /// Responses are served in order; once the script is exhausted the
    /// last response repeats. Recorded queries let tests assert on the
    /// parameters a provider built.
    pub struct MockHttpClient {
        script: Mutex<VecDeque<Result<Vec<u8>, ProviderError>>>,
        last: Mutex<Result<Vec<u8>, ProviderError>>,
        pub calls: AtomicUsize,
        pub queries: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl MockHttpClient {
        pub fn new(responses: Vec<Result<Vec<u8>, ProviderError>>) -> Self {
            let last = responses
                .last()
                .cloned()
                .unwrap_or(Err(ProviderError::Http("mock script empty".into())));
            Self {
                script: Mutex::new(responses.into()),
                last: Mutex::new(last),
                calls: AtomicUsize::new(0),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn always(response: Result<Vec<u8>, ProviderError>) -> Self {
            Self::new(vec![response])
        }
    }

    impl AsyncHttpClient for MockHttpClient {
        async fn get(
            &self,
            _url: &str,
            query: &[(&str, String)],
        ) -> Result<Vec<u8>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            );
            match self.script.lock().unwrap().pop_front() {
                Some(response) => {
                    *self.last.lock().unwrap() = response.clone();
                    response
                }
                None => self.last.lock().unwrap().clone(),
            }
        }
    }

    #[tokio::test]
    async fn mock_serves_script_then_repeats_last() {
        let mock = MockHttpClient::new(vec![
            Ok(b"first".to_vec()),
            Err(ProviderError::Http("down".into())),
        ]);

        assert_eq!(mock.get("u", &[]).await, Ok(b"first".to_vec()));
        assert!(mock.get("u", &[]).await.is_err());
        assert!(mock.get("u", &[]).await.is_err());
        assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
    }
}
