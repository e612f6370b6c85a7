//! HTTP client abstraction for testability

use super::types::FetchError;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests. Implementations must be safe
/// to share across the worker pool.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    ///
    /// A non-2xx status is an error; the body is only returned for
    /// successful responses.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with a custom timeout in seconds.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: format!("failed to read response body: {}", e),
            })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock HTTP client for testing.
    ///
    /// Serves queued responses first, then falls back to a default
    /// response, counting every call.
    pub struct MockHttpClient {
        queued: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
        default: Result<Vec<u8>, FetchError>,
        calls: AtomicUsize,
    }

    impl MockHttpClient {
        /// Mock that always produces the same response.
        pub fn always(response: Result<Vec<u8>, FetchError>) -> Self {
            Self {
                queued: Mutex::new(VecDeque::new()),
                default: response,
                calls: AtomicUsize::new(0),
            }
        }

        /// Mock that serves `queued` responses in order, then `default`.
        pub fn sequence(
            queued: Vec<Result<Vec<u8>, FetchError>>,
            default: Result<Vec<u8>, FetchError>,
        ) -> Self {
            Self {
                queued: Mutex::new(queued.into()),
                default,
                calls: AtomicUsize::new(0),
            }
        }

        /// Number of `get` calls made so far.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.queued.lock().unwrap().pop_front() {
                Some(response) => response,
                None => self.default.clone(),
            }
        }
    }

    #[test]
    fn test_mock_client_success() {
        let mock = MockHttpClient::always(Ok(vec![1, 2, 3, 4]));

        let result = mock.get("http://example.com");
        assert_eq!(result.unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_mock_client_sequence_then_default() {
        let mock = MockHttpClient::sequence(
            vec![Err(FetchError::Status {
                status: 500,
                url: "http://example.com".to_string(),
            })],
            Ok(vec![9]),
        );

        assert!(mock.get("http://example.com").is_err());
        assert_eq!(mock.get("http://example.com").unwrap(), vec![9]);
        assert_eq!(mock.get("http://example.com").unwrap(), vec![9]);
        assert_eq!(mock.call_count(), 3);
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new().is_ok());
        assert!(ReqwestClient::with_timeout(5).is_ok());
    }
}
