//! Compressed archive package sink.
//!
//! Writes tiles as individually named entries in a gzip'd tar archive,
//! using the `{z}/{x}/{y}.{format}` path convention, plus one
//! `metadata.json` entry summarizing the package metadata pairs. The
//! archive footer and gzip stream are finalized at `close`.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;

use super::{SinkError, TileSink};
use crate::tile::TileRequest;

/// Entry name of the metadata summary inside the archive.
const METADATA_ENTRY: &str = "metadata.json";

/// Archive package variant backed by a gzip'd tar file.
///
/// Single-writer: all calls happen on the orchestrating thread.
pub struct ArchiveSink {
    path: PathBuf,
    builder: Option<tar::Builder<GzEncoder<File>>>,
    metadata: Vec<(String, String)>,
}

impl ArchiveSink {
    /// Creates a sink writing to `<basename>.tar.gz`.
    pub fn from_basename(basename: &str) -> Self {
        Self {
            path: PathBuf::from(format!("{}.tar.gz", basename)),
            builder: None,
            metadata: Vec::new(),
        }
    }

    fn io_err(&self, source: io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn append_entry(&mut self, entry_path: &str, data: &[u8]) -> Result<(), SinkError> {
        let builder = self.builder.as_mut().ok_or_else(|| SinkError::NotOpen {
            path: self.path.clone(),
        })?;

        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();

        builder
            .append_data(&mut header, entry_path, data)
            .map_err(|e| SinkError::Io {
                path: self.path.clone(),
                source: e,
            })
    }
}

impl TileSink for ArchiveSink {
    fn open(&mut self) -> Result<(), SinkError> {
        let file = File::create(&self.path).map_err(|e| self.io_err(e))?;
        let encoder = GzEncoder::new(file, Compression::default());
        self.builder = Some(tar::Builder::new(encoder));

        debug!(path = %self.path.display(), "opened archive package");
        Ok(())
    }

    fn add_metadata(&mut self, name: &str, value: &str) -> Result<(), SinkError> {
        if self.builder.is_none() {
            return Err(SinkError::NotOpen {
                path: self.path.clone(),
            });
        }
        self.metadata.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn add_tile(&mut self, request: &TileRequest, data: &[u8]) -> Result<(), SinkError> {
        let coord = request.coord();
        let entry_path = format!(
            "{}/{}/{}.{}",
            coord.zoom,
            coord.x,
            coord.y,
            request.format()
        );
        self.append_entry(&entry_path, data)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if self.builder.is_none() {
            return Ok(());
        }

        let mut summary = serde_json::Map::new();
        for (name, value) in &self.metadata {
            summary.insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        let encoded = serde_json::to_vec_pretty(&serde_json::Value::Object(summary))?;
        self.append_entry(METADATA_ENTRY, &encoded)?;

        // Safe to take now: append_entry above required the builder.
        let builder = self.builder.take().expect("builder checked above");
        let encoder = builder.into_inner().map_err(|e| self.io_err(e))?;
        encoder.finish().map_err(|e| self.io_err(e))?;

        debug!(path = %self.path.display(), "finalized archive package");
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use flate2::read::GzDecoder;
    use std::collections::HashMap;
    use std::io::Read;
    use tempfile::TempDir;

    fn request(x: u32, y: u32, zoom: u8) -> TileRequest {
        TileRequest::new(TileCoord { x, y, zoom }, "all", "mvt", "")
    }

    fn sink_in(dir: &TempDir) -> ArchiveSink {
        let base = dir.path().join("test-package");
        ArchiveSink::from_basename(base.to_str().unwrap())
    }

    /// Reads every entry of a finished archive into name -> bytes.
    fn read_entries(path: &Path) -> HashMap<String, Vec<u8>> {
        let file = File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));

        let mut entries = HashMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            entries.insert(name, data);
        }
        entries
    }

    #[test]
    fn test_path_has_tar_gz_extension() {
        let sink = ArchiveSink::from_basename("london");
        assert_eq!(sink.path(), Path::new("london.tar.gz"));
    }

    #[test]
    fn test_add_tile_before_open_errors() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir);

        let err = sink.add_tile(&request(0, 0, 0), b"data").unwrap_err();
        assert!(matches!(err, SinkError::NotOpen { .. }));
    }

    #[test]
    fn test_entries_follow_zxy_convention() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.add_tile(&request(0, 0, 0), b"root").unwrap();
        sink.add_tile(&request(511, 340, 10), b"london").unwrap();
        sink.close().unwrap();

        let entries = read_entries(sink.path());
        assert_eq!(entries.get("0/0/0.mvt").map(Vec::as_slice), Some(&b"root"[..]));
        assert_eq!(
            entries.get("10/511/340.mvt").map(Vec::as_slice),
            Some(&b"london"[..])
        );
    }

    #[test]
    fn test_metadata_entry_written_at_close() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.add_metadata("name", "test-package").unwrap();
        sink.add_metadata("minzoom", "0").unwrap();
        sink.add_metadata("maxzoom", "2").unwrap();
        sink.close().unwrap();

        let entries = read_entries(sink.path());
        let raw = entries.get("metadata.json").expect("metadata entry");
        let parsed: serde_json::Value = serde_json::from_slice(raw).unwrap();

        assert_eq!(parsed["name"], "test-package");
        assert_eq!(parsed["minzoom"], "0");
        assert_eq!(parsed["maxzoom"], "2");
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir);
        assert!(sink.close().is_ok());
        assert!(!sink.path().exists());
    }

    #[test]
    fn test_archive_with_no_tiles_is_still_valid() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.add_metadata("name", "empty").unwrap();
        sink.close().unwrap();

        let entries = read_entries(sink.path());
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("metadata.json"));
    }

    #[test]
    fn test_tiles_accepted_in_any_order() {
        let dir = TempDir::new().unwrap();
        let mut sink = sink_in(&dir);

        sink.open().unwrap();
        sink.add_tile(&request(3, 1, 2), b"later-zoom-first").unwrap();
        sink.add_tile(&request(0, 0, 0), b"root").unwrap();
        sink.close().unwrap();

        let entries = read_entries(sink.path());
        assert!(entries.contains_key("2/3/1.mvt"));
        assert!(entries.contains_key("0/0/0.mvt"));
    }
}
