//! Output format registry.
//!
//! Maps output format names to sink factories. The registry is plain data
//! injected into the package builder at construction time, so callers (and
//! tests) can swap or extend the available formats without any global
//! state.

use super::{ArchiveSink, MbtilesSink, SinkError, TileSink};

/// Factory producing a sink for a given output base name.
pub type SinkFactory = Box<dyn Fn(&str) -> Box<dyn TileSink> + Send + Sync>;

/// Registry of output format names to sink factories.
pub struct SinkRegistry {
    factories: Vec<(String, SinkFactory)>,
}

impl SinkRegistry {
    /// Creates a registry with no formats registered.
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Registers a factory under a format name, replacing any existing
    /// registration for that name.
    pub fn register(&mut self, format: impl Into<String>, factory: SinkFactory) {
        let format = format.into();
        self.factories.retain(|(name, _)| *name != format);
        self.factories.push((format, factory));
    }

    /// Creates a sink for the named format, or fails with
    /// [`SinkError::UnknownFormat`] before any I/O happens.
    pub fn create(&self, format: &str, basename: &str) -> Result<Box<dyn TileSink>, SinkError> {
        self.factories
            .iter()
            .find(|(name, _)| name == format)
            .map(|(_, factory)| factory(basename))
            .ok_or_else(|| SinkError::UnknownFormat(format.to_string()))
    }

    /// The registered format names, in registration order.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }
}

impl Default for SinkRegistry {
    /// Registers the built-in package variants: `mbtiles` (indexed SQLite
    /// container) and `archive` (gzip'd tar archive).
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "mbtiles",
            Box::new(|basename| Box::new(MbtilesSink::from_basename(basename))),
        );
        registry.register(
            "archive",
            Box::new(|basename| Box::new(ArchiveSink::from_basename(basename))),
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_formats() {
        let registry = SinkRegistry::default();
        let formats: Vec<&str> = registry.formats().collect();
        assert_eq!(formats, vec!["mbtiles", "archive"]);
    }

    #[test]
    fn test_create_known_formats() {
        let registry = SinkRegistry::default();

        let mbtiles = registry.create("mbtiles", "pkg").unwrap();
        assert_eq!(mbtiles.path(), Path::new("pkg.mbtiles"));

        let archive = registry.create("archive", "pkg").unwrap();
        assert_eq!(archive.path(), Path::new("pkg.tar.gz"));
    }

    #[test]
    fn test_unknown_format_fails_fast() {
        let registry = SinkRegistry::default();
        let err = registry.create("foo", "pkg").err().unwrap();

        match err {
            SinkError::UnknownFormat(name) => assert_eq!(name, "foo"),
            other => panic!("expected UnknownFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_register_replaces_existing_entry() {
        let mut registry = SinkRegistry::default();
        registry.register(
            "archive",
            Box::new(|basename| Box::new(MbtilesSink::from_basename(basename))),
        );

        let formats: Vec<&str> = registry.formats().collect();
        assert_eq!(formats.iter().filter(|f| **f == "archive").count(), 1);

        // The replacement factory now backs the name.
        let sink = registry.create("archive", "pkg").unwrap();
        assert_eq!(sink.path(), Path::new("pkg.mbtiles"));
    }

    #[test]
    fn test_custom_format_registration() {
        let mut registry = SinkRegistry::empty();
        registry.register(
            "indexed",
            Box::new(|basename| Box::new(MbtilesSink::from_basename(basename))),
        );

        assert!(registry.create("indexed", "pkg").is_ok());
        assert!(registry.create("mbtiles", "pkg").is_err());
    }
}
