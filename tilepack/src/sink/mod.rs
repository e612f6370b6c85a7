//! Output sinks for tile packages
//!
//! A sink is a writable package container: tiles and metadata stream in,
//! one portable artifact comes out. The orchestrator holds every active
//! sink behind [`TileSink`] trait objects and fans each fetched tile out to
//! all of them, so new package formats only need a trait implementation
//! and a [`SinkRegistry`] entry.
//!
//! # Lifecycle
//!
//! `open` → `add_metadata`* → `add_tile`* → `close`, exactly once each way.
//! A sink must not be used after `close`. Sinks are single-writer: the
//! orchestrating thread serializes every call, and implementations are not
//! designed for concurrent writers.

mod archive;
mod mbtiles;
mod registry;

pub use archive::ArchiveSink;
pub use mbtiles::MbtilesSink;
pub use registry::{SinkFactory, SinkRegistry};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::tile::TileRequest;

/// Errors that can occur while writing a tile package.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The requested output format has no registered sink.
    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    /// A sink operation was attempted outside the open/close window.
    #[error("package {} is not open", .path.display())]
    NotOpen { path: PathBuf },

    /// The package database rejected an operation.
    #[error("package database error for {}: {source}", .path.display())]
    Database {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// Archive or filesystem I/O failed.
    #[error("package I/O error for {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The metadata entry could not be encoded.
    #[error("failed to encode package metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// A writable tile package.
///
/// Implementations store tiles keyed by coordinate plus a set of package
/// metadata pairs. Tiles may arrive in any order (sinks must not assume
/// zoom-ascending or row-major sequences), and re-adding a coordinate must
/// upsert rather than fail.
pub trait TileSink {
    /// Prepares the package for writing. Called exactly once, before any
    /// metadata or tiles.
    fn open(&mut self) -> Result<(), SinkError>;

    /// Records one metadata pair. All metadata is written before the first
    /// tile, though implementations may tolerate either order.
    fn add_metadata(&mut self, name: &str, value: &str) -> Result<(), SinkError>;

    /// Stores one tile's bytes under the request's coordinate.
    fn add_tile(&mut self, request: &TileRequest, data: &[u8]) -> Result<(), SinkError>;

    /// Flushes and finalizes the package (commits the transaction, writes
    /// the archive footer). Runs even when an earlier `add_tile` failed so
    /// a partially written artifact is never silently left half-flushed.
    /// Closing a sink that was never opened is a no-op.
    fn close(&mut self) -> Result<(), SinkError>;

    /// Location of the package artifact this sink writes.
    fn path(&self) -> &Path;
}
