use crate::{dlis::PhysicalFile, walker::FileTag};
use std::{fmt::Display, path::Path};
use tracing::{debug, warn};

/// Opens one discovered file through a format library.
pub trait Loader {
    /// The opened file; iterating it yields its logical files.
    type Physical: IntoIterator;
    type Error: Display;

    fn load(&self, path: &Path) -> Result<Self::Physical, Self::Error>;
}

pub struct DlisLoader;

impl Loader for DlisLoader {
    type Physical = PhysicalFile;
    type Error = crate::dlis::Error;

    fn load(&self, path: &Path) -> Result<PhysicalFile, Self::Error> {
        PhysicalFile::open(path)
    }
}

/// Outcome of opening one file. Holds either the opened file or the
/// rendered error, never both.
#[derive(Debug)]
pub struct LoadResult<P> {
    file_name: String,
    well: Option<String>,
    size: u64,
    outcome: Result<P, String>,
}

impl<P> LoadResult<P> {
    pub fn new(
        file_name: impl Into<String>,
        well: Option<String>,
        size: u64,
        outcome: Result<P, String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            well,
            size,
            outcome,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn well(&self) -> Option<&str> {
        self.well.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn physical(&self) -> Option<&P> {
        self.outcome.as_ref().ok()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    pub fn into_outcome(self) -> Result<P, String> {
        self.outcome
    }
}

/// Attempts to open `tag`'s file. A failure is captured in the result and
/// never returned as an error, so one bad file cannot stop a run.
pub fn load_file<L: Loader>(loader: &L, tag: &FileTag) -> LoadResult<L::Physical> {
    let outcome = loader.load(tag.path()).map_err(|e| {
        let message = e.to_string();
        if message.is_empty() {
            "unknown error".to_owned()
        } else {
            message
        }
    });

    match &outcome {
        Ok(_) => debug!(path = %tag.path().display(), "loaded"),
        Err(e) => warn!(path = %tag.path().display(), error = %e, "failed to load"),
    }

    LoadResult::new(
        tag.file_name(),
        Some(tag.well().to_owned()),
        tag.size(),
        outcome,
    )
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::dlis::encode::Writer;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn capture_parse_failures() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.dlis");
        fs::write(&path, b"definitely not a storage unit label").unwrap();

        let result = load_file(&DlisLoader, &FileTag::new("W", &path, 35));

        assert!(result.is_error());
        assert!(result.physical().is_none());
        assert!(!result.error_message().unwrap().is_empty());
        assert_eq!(result.file_name(), "broken.dlis");
        assert_eq!(result.well(), Some("W"));
    }

    #[test]
    fn keep_opened_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good.dlis");
        let mut writer = Writer::new("GOOD");
        writer.file_header(1, "ONE").unwrap();
        fs::write(&path, writer.finish()).unwrap();

        let result = load_file(&DlisLoader, &FileTag::new("W", &path, 0));

        assert!(!result.is_error());
        assert!(result.error_message().is_none());
        assert_eq!(result.physical().unwrap().logical_files().len(), 1);
    }

    #[test]
    fn capture_missing_files() {
        let result = load_file(&DlisLoader, &FileTag::new("W", "/nonexistent/x.dlis", 0));
        assert!(result.is_error());
    }
}
