//! Tile fetch worker.
//!
//! Downloads one tile's bytes from the remote service, absorbing transient
//! failures with backoff-and-jitter retries. With the default policy a
//! fetch blocks until it succeeds; errors are logged as diagnostics, not
//! surfaced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use tracing::warn;

use super::http::HttpClient;
use super::retry::RetryPolicy;
use super::types::FetchError;
use crate::tile::TileRequest;

/// Default tile service endpoint the URL template is anchored to.
pub const DEFAULT_ENDPOINT: &str = "https://tile.mapzen.com/mapzen/vector/v1";

/// Flag for fetches that should never be interrupted.
static NEVER_CANCELLED: AtomicBool = AtomicBool::new(false);

/// Fetches single tiles over HTTP with resilient retry.
///
/// Safe to share across the worker pool behind an `Arc`; all state is
/// immutable after construction and retry bookkeeping is local to each
/// `fetch` call.
pub struct TileFetcher<C: HttpClient> {
    client: C,
    endpoint: String,
    policy: RetryPolicy,
}

impl<C: HttpClient> TileFetcher<C> {
    /// Creates a fetcher against the default endpoint with the default
    /// (unbounded) retry policy.
    pub fn new(client: C) -> Self {
        Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            policy: RetryPolicy::default(),
        }
    }

    /// Overrides the service endpoint (scheme, host, and vendor path).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the remote URL for a request.
    ///
    /// Template: `{endpoint}/{layer}/{zoom}/{x}/{y}.{format}?api_key={key}`.
    /// An empty credential is substituted verbatim.
    pub fn tile_url(&self, request: &TileRequest) -> String {
        let coord = request.coord();
        format!(
            "{}/{}/{}/{}/{}.{}?api_key={}",
            self.endpoint,
            request.layer(),
            coord.zoom,
            coord.x,
            coord.y,
            request.format(),
            request.api_key()
        )
    }

    /// Fetches one tile, retrying per the policy until it succeeds.
    ///
    /// With the default unbounded policy this only returns `Ok`; a
    /// configured attempt cap surfaces [`FetchError::RetriesExhausted`].
    pub fn fetch(&self, request: &TileRequest) -> Result<Vec<u8>, FetchError> {
        self.fetch_cancellable(request, &NEVER_CANCELLED)
    }

    /// Fetches one tile, giving up with [`FetchError::Cancelled`] when the
    /// shutdown flag is raised between attempts.
    ///
    /// The flag is only consulted between attempts; an in-flight request or
    /// backoff sleep completes first.
    pub fn fetch_cancellable(
        &self,
        request: &TileRequest,
        shutdown: &AtomicBool,
    ) -> Result<Vec<u8>, FetchError> {
        let url = self.tile_url(request);
        let mut failures = 0u32;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                return Err(FetchError::Cancelled);
            }

            match self.client.get(&url) {
                Ok(bytes) => return Ok(bytes),
                Err(err) => {
                    failures += 1;
                    let delay = match self.policy.delay_for_retry(failures) {
                        Some(delay) => delay,
                        None => {
                            return Err(FetchError::RetriesExhausted {
                                url,
                                attempts: failures,
                            })
                        }
                    };

                    warn!(
                        error = %err,
                        url = %url,
                        retry = failures,
                        delay_secs = delay.as_secs_f64(),
                        "tile fetch failed, retrying"
                    );
                    thread::sleep(delay);
                }
            }
        }
    }
}
