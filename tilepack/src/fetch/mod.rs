//! Tile fetching over HTTP
//!
//! This module provides the networking half of the acquisition pipeline:
//! an [`HttpClient`] abstraction (with a real reqwest implementation), the
//! [`RetryPolicy`] controlling backoff and jitter, and the [`TileFetcher`]
//! worker that turns a [`TileRequest`](crate::tile::TileRequest) into tile
//! bytes, absorbing transient failures.

mod http;
mod retry;
mod types;
mod worker;

pub use http::{HttpClient, ReqwestClient};
pub use retry::{
    RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_JITTER_RANGE,
    DEFAULT_MAX_DELAY_SECS,
};
pub use types::FetchError;
pub use worker::{TileFetcher, DEFAULT_ENDPOINT};

#[cfg(test)]
pub use http::tests::MockHttpClient;
