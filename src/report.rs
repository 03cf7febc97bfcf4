use crate::{
    loader::{load_file, LoadResult, Loader},
    progress::ProgressSink,
    size::format_size,
    walker::{file_tags, Extensions},
    Result,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

pub const PROGRESS_TITLE: &str = "Dlis General Info";

/// One row of the report. An errored file always has a message and zero
/// logical files; a loaded file always has an empty message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRecord {
    file: String,
    well: String,
    size: String,
    error: bool,
    error_message: String,
    logical_files: usize,
}

impl SummaryRecord {
    /// Builds the record, consuming the load result. The opened file is
    /// exhausted to count its logical files and dropped afterwards.
    pub fn from_load<P: IntoIterator>(result: LoadResult<P>) -> Self {
        let file = result.file_name().to_owned();
        let well = result.well().unwrap_or_default().to_owned();
        let size = format_size(result.size());

        let (error, error_message, logical_files) = match result.into_outcome() {
            Ok(physical) => (false, String::new(), physical.into_iter().count()),
            Err(message) => (true, message, 0),
        };

        Self {
            file,
            well,
            size,
            error,
            error_message,
            logical_files,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn well(&self) -> &str {
        &self.well
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn logical_files(&self) -> usize {
        self.logical_files
    }
}

/// Walks `root`, opens every matching file in ascending size order and
/// builds one record per file. Only walking errors abort the run.
pub fn build_report<L: Loader>(
    root: &Path,
    extensions: &Extensions,
    loader: &L,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<SummaryRecord>> {
    let tags = file_tags(root, extensions)?;
    let mut records = Vec::with_capacity(tags.len());

    progress.start(tags.len(), PROGRESS_TITLE);
    for tag in &tags {
        let record = SummaryRecord::from_load(load_file(loader, tag));
        progress.advance(record.file());
        records.push(record);
    }
    progress.finish();

    let failed = records.iter().filter(|r| r.error()).count();
    info!(
        root = %root.display(),
        files = records.len(),
        failed,
        "report built"
    );

    Ok(records)
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::progress::Silent;
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    /// Pretends every file holds as many logical files as its size says,
    /// and fails on empty files.
    struct FakeLoader;

    impl Loader for FakeLoader {
        type Physical = Vec<()>;
        type Error = String;

        fn load(&self, path: &Path) -> std::result::Result<Vec<()>, String> {
            let len = fs::metadata(path).map_err(|e| e.to_string())?.len();
            if len == 0 {
                return Err("empty file".into());
            }
            Ok(vec![(); len as usize])
        }
    }

    #[derive(Default)]
    struct Recorder {
        total: usize,
        advanced: Vec<String>,
        finished: bool,
    }

    impl ProgressSink for Recorder {
        fn start(&mut self, total: usize, _title: &str) {
            self.total = total;
        }

        fn advance(&mut self, message: &str) {
            self.advanced.push(message.to_owned());
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    fn tree() -> TempDir {
        let root = TempDir::new().unwrap();
        let well = root.path().join("WELL-1");
        fs::create_dir(&well).unwrap();
        fs::write(well.join("b.dlis"), [0u8; 3]).unwrap();
        fs::write(well.join("a.dlis"), b"").unwrap();
        root
    }

    #[test]
    fn record_failures_without_stopping() {
        let root = tree();

        let records =
            build_report(root.path(), &Extensions::default(), &FakeLoader, &mut Silent).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].file(), "a.dlis");
        assert!(records[0].error());
        assert_eq!(records[0].error_message(), "empty file");
        assert_eq!(records[0].logical_files(), 0);

        assert_eq!(records[1].file(), "b.dlis");
        assert!(!records[1].error());
        assert_eq!(records[1].error_message(), "");
        assert_eq!(records[1].logical_files(), 3);
        assert_eq!(records[1].size(), "3 bytes");
        assert_eq!(records[1].well(), "WELL-1");
    }

    #[test]
    fn drive_progress_sink() {
        let root = tree();
        let mut recorder = Recorder::default();

        build_report(root.path(), &Extensions::default(), &FakeLoader, &mut recorder).unwrap();

        assert_eq!(recorder.total, 2);
        assert_eq!(recorder.advanced, vec!["a.dlis", "b.dlis"]);
        assert!(recorder.finished);
    }

    #[test]
    fn propagate_invalid_root() {
        let missing = PathBuf::from("/definitely/not/here");
        assert!(build_report(&missing, &Extensions::default(), &FakeLoader, &mut Silent).is_err());
    }

    #[test]
    fn serialize_with_report_keys() {
        let record = SummaryRecord::from_load(LoadResult::new(
            "x.dlis",
            Some("W".into()),
            2048,
            Ok(vec![1, 2]),
        ));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "file": "x.dlis",
                "well": "W",
                "size": "2.0 KB",
                "error": false,
                "error_message": "",
                "logical_files": 2
            })
        );
    }
}
