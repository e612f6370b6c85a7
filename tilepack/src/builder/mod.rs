//! Package build orchestration
//!
//! Drives the full acquisition pipeline: enumerate the tile coverage for
//! every zoom level, fetch each tile through a bounded worker pool, and
//! fan every result out to all active output sinks. Results are consumed
//! in arrival order on the orchestrating thread, so sinks see a single
//! writer and tile bytes live only between receipt and hand-off.
//!
//! Cleanup is guaranteed on every path: the pool is shut down and joined,
//! and every sink is closed exactly once, whether the build completes or a
//! sink/fetch failure aborts it partway.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::coord::{cover_bounding_box, GeoBoundingBox, ZoomRange};
use crate::fetch::{FetchError, HttpClient, TileFetcher};
use crate::sink::{SinkError, SinkRegistry, TileSink};
use crate::tile::TileRequest;

/// Worker pool size as a multiple of available parallelism. Fetch workers
/// spend almost all their time blocked on the network, so the pool is
/// oversubscribed well past the core count.
const POOL_SIZE_MULTIPLIER: usize = 10;

/// Errors that can abort a package build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Sink configuration or write failure.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// A fetch worker gave up (only possible with a capped retry policy,
    /// or when teardown cancelled an in-flight retry loop).
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Everything one build run needs.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Region to cover.
    pub bbox: GeoBoundingBox,
    /// Inclusive zoom levels to cover.
    pub zoom_range: ZoomRange,
    /// Vector tile layer to request.
    pub layer: String,
    /// Tile format extension to request.
    pub tile_format: String,
    /// Base name shared by all package artifacts.
    pub output_basename: String,
    /// Output format names resolved against the sink registry.
    pub output_formats: Vec<String>,
    /// API credential; may be empty.
    pub api_key: String,
}

/// Result of a completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Tiles fetched and written to every package.
    pub tile_count: usize,
    /// Packages written.
    pub package_count: usize,
}

/// Orchestrates tile package builds.
///
/// Owns the fetcher shared by the worker pool and the registry that maps
/// output format names to sinks. One builder can run any number of builds.
pub struct PackageBuilder<C: HttpClient + 'static> {
    fetcher: Arc<TileFetcher<C>>,
    registry: SinkRegistry,
    pool_size: usize,
}

impl<C: HttpClient + 'static> PackageBuilder<C> {
    /// Creates a builder with the default pool size
    /// (10 × available parallelism).
    pub fn new(fetcher: TileFetcher<C>, registry: SinkRegistry) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            registry,
            pool_size: default_pool_size(),
        }
    }

    /// Overrides the worker pool size (minimum 1).
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Builds one package per requested output format.
    ///
    /// Unknown output formats abort before any network or file I/O. On
    /// every other path, including sink write failures, the worker pool is
    /// drained and each sink is closed exactly once.
    pub fn build(&self, config: &BuildConfig) -> Result<BuildSummary, BuildError> {
        let requests = enumerate_requests(config);

        // Resolve formats before any I/O so a typo cannot cost a download.
        let mut sinks = self.create_sinks(config)?;

        info!(
            tiles = requests.len(),
            packages = sinks.len(),
            pool_size = self.pool_size,
            bounds = %config.bbox,
            "starting package build"
        );

        let run_result = self.run(&mut sinks, requests, config);
        let close_result = close_all(&mut sinks);

        let tile_count = run_result?;
        close_result?;
        let summary = BuildSummary {
            tile_count,
            package_count: sinks.len(),
        };

        info!(
            tiles = summary.tile_count,
            packages = summary.package_count,
            "package build complete"
        );
        Ok(summary)
    }

    /// Resolves one sink per distinct requested format, preserving request
    /// order. No file is created here; sinks touch disk at `open`.
    fn create_sinks(&self, config: &BuildConfig) -> Result<Vec<Box<dyn TileSink>>, BuildError> {
        let mut seen: Vec<&str> = Vec::new();
        let mut sinks = Vec::new();

        for format in &config.output_formats {
            if seen.contains(&format.as_str()) {
                continue;
            }
            seen.push(format.as_str());
            sinks.push(self.registry.create(format, &config.output_basename)?);
        }

        Ok(sinks)
    }

    /// Opens the sinks, runs the worker pool over the request set, and fans
    /// results out. Returns the number of tiles written. The pool is fully
    /// torn down before this returns, on success and failure alike; sink
    /// closing stays with the caller.
    fn run(
        &self,
        sinks: &mut [Box<dyn TileSink>],
        requests: Vec<TileRequest>,
        config: &BuildConfig,
    ) -> Result<usize, BuildError> {
        for sink in sinks.iter_mut() {
            sink.open()?;
        }

        // Metadata lands in every package before the first tile.
        for (name, value) in package_metadata(config) {
            for sink in sinks.iter_mut() {
                sink.add_metadata(name, &value)?;
            }
        }

        let total = requests.len();
        let queue = Arc::new(Mutex::new(VecDeque::from(requests)));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (result_tx, result_rx) = mpsc::channel();

        let worker_count = self.pool_size.min(total.max(1));
        let workers: Vec<_> = (0..worker_count)
            .map(|_| {
                let fetcher = Arc::clone(&self.fetcher);
                let queue = Arc::clone(&queue);
                let shutdown = Arc::clone(&shutdown);
                let result_tx = result_tx.clone();

                thread::spawn(move || {
                    loop {
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                        let request = queue.lock().unwrap().pop_front();
                        let Some(request) = request else { break };

                        let outcome = fetcher.fetch_cancellable(&request, &shutdown);
                        // A closed channel means the consumer has aborted.
                        if result_tx.send((request, outcome)).is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(result_tx);

        // Consume in arrival order; any failure breaks out to teardown.
        let mut written = 0usize;
        let mut failure: Option<BuildError> = None;

        'consume: for (request, outcome) in result_rx.iter() {
            match outcome {
                Ok(data) => {
                    for sink in sinks.iter_mut() {
                        if let Err(err) = sink.add_tile(&request, &data) {
                            failure = Some(err.into());
                            break 'consume;
                        }
                    }
                    written += 1;
                    debug!(tile = %request.coord(), written, total, "tile stored");
                }
                Err(err) => {
                    failure = Some(err.into());
                    break 'consume;
                }
            }
        }

        // Teardown runs on both paths: stop future fetch attempts, unblock
        // senders, then wait for every worker to finish.
        shutdown.store(true, Ordering::Relaxed);
        drop(result_rx);
        for worker in workers {
            let _ = worker.join();
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }
}

/// Materializes the full request set: every covered tile at every zoom
/// level, in deterministic zoom-then-row-major order.
fn enumerate_requests(config: &BuildConfig) -> Vec<TileRequest> {
    let mut requests = Vec::new();
    for zoom in config.zoom_range.levels() {
        for coord in cover_bounding_box(&config.bbox, zoom) {
            requests.push(TileRequest::new(
                coord,
                config.layer.clone(),
                config.tile_format.clone(),
                config.api_key.clone(),
            ));
        }
    }
    requests
}

/// The package metadata pairs written to every sink, in order.
fn package_metadata(config: &BuildConfig) -> Vec<(&'static str, String)> {
    vec![
        ("name", config.output_basename.clone()),
        ("format", content_type(&config.tile_format).to_string()),
        ("bounds", config.bbox.to_string()),
        ("minzoom", config.zoom_range.min.to_string()),
        ("maxzoom", config.zoom_range.max.to_string()),
    ]
}

/// Maps a tile format extension to the content-format metadata value.
fn content_type(tile_format: &str) -> &str {
    match tile_format {
        "mvt" => "application/vnd.mapbox-vector-tile",
        "json" | "geojson" | "topojson" => "application/json",
        other => other,
    }
}

/// Closes every sink, continuing past failures so each gets its close.
/// Returns the first error encountered.
fn close_all(sinks: &mut [Box<dyn TileSink>]) -> Result<(), BuildError> {
    let mut first_error = None;

    for sink in sinks.iter_mut() {
        if let Err(err) = sink.close() {
            warn!(path = %sink.path().display(), error = %err, "failed to finalize package");
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn default_pool_size() -> usize {
    let cores = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores * POOL_SIZE_MULTIPLIER
}
