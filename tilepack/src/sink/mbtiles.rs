//! MBTiles package sink.
//!
//! Writes tiles into an SQLite container in the MBTiles layout: a
//! `metadata` name/value table and a `tiles` table keyed by
//! `(zoom_level, tile_column, tile_row)` with a unique index. The whole
//! build runs inside a single transaction, committed at `close`.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use tracing::debug;

use super::{SinkError, TileSink};
use crate::tile::TileRequest;

/// Schema for a fresh MBTiles container.
const SCHEMA: &str = "\
    CREATE TABLE IF NOT EXISTS metadata (name TEXT, value TEXT);\n\
    CREATE TABLE IF NOT EXISTS tiles (\n\
        zoom_level INTEGER,\n\
        tile_column INTEGER,\n\
        tile_row INTEGER,\n\
        tile_data BLOB\n\
    );\n\
    CREATE UNIQUE INDEX IF NOT EXISTS tile_index\n\
        ON tiles (zoom_level, tile_column, tile_row);";

/// Indexed package variant backed by SQLite (MBTiles).
///
/// Single-writer: all calls happen on the orchestrating thread.
pub struct MbtilesSink {
    path: PathBuf,
    conn: Option<Connection>,
}

impl MbtilesSink {
    /// Creates a sink writing to `<basename>.mbtiles`.
    pub fn from_basename(basename: &str) -> Self {
        Self {
            path: PathBuf::from(format!("{}.mbtiles", basename)),
            conn: None,
        }
    }

    fn db_err(&self, source: rusqlite::Error) -> SinkError {
        SinkError::Database {
            path: self.path.clone(),
            source,
        }
    }

    fn conn(&self) -> Result<&Connection, SinkError> {
        self.conn.as_ref().ok_or_else(|| SinkError::NotOpen {
            path: self.path.clone(),
        })
    }
}

impl TileSink for MbtilesSink {
    fn open(&mut self) -> Result<(), SinkError> {
        // A leftover artifact from an earlier run would shadow this build's
        // tiles, so start from an empty container.
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| SinkError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let conn = Connection::open(&self.path).map_err(|e| self.db_err(e))?;
        conn.execute_batch(SCHEMA).map_err(|e| self.db_err(e))?;
        conn.execute_batch("BEGIN").map_err(|e| self.db_err(e))?;

        debug!(path = %self.path.display(), "opened mbtiles package");
        self.conn = Some(conn);
        Ok(())
    }

    fn add_metadata(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        self.conn()?
            .execute(
                "INSERT INTO metadata (name, value) VALUES (?1, ?2)",
                params![name, value],
            )
            .map_err(|e| self.db_err(e))?;
        Ok(())
    }

    fn add_tile(&mut self, request: &TileRequest, data: &[u8]) -> Result<(), SinkError> {
        let coord = request.coord();
        // MBTiles stores rows in TMS order (row 0 at the south edge).
        let tms_row = (1u32 << coord.zoom) - 1 - coord.y;

        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO tiles \
                 (zoom_level, tile_column, tile_row, tile_data) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![coord.zoom, coord.x, tms_row, data],
            )
            .map_err(|e| self.db_err(e))?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        conn.execute_batch("COMMIT")
            .map_err(|e| self.db_err(e))?;
        conn.close().map_err(|(_, e)| self.db_err(e))?;

        debug!(path = %self.path.display(), "finalized mbtiles package");
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
