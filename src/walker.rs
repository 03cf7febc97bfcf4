//! Discovery of log files below a root of well folders.
//!
//! The root holds one folder per well; every matching file directly inside
//! such a folder is tagged with the folder's name.

use crate::error::{Error, Result};
use std::{
    collections::HashMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_EXTENSIONS: [&str; 2] = [".dlis", ".DLIS"];

/// A discovered file and the well folder it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileTag {
    well: String,
    path: PathBuf,
    size: u64,
}

impl FileTag {
    pub fn new(well: impl Into<String>, path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            well: well.into(),
            path: path.into(),
            size,
        }
    }

    pub fn well(&self) -> &str {
        &self.well
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size on disk at discovery time.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Validated, case-sensitive set of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extensions(Vec<String>);

impl Extensions {
    /// Accepts tokens with or without the leading dot. Fails on an empty
    /// list, an empty token or a token holding a path separator or inner dot.
    pub fn new<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            let ext = token.strip_prefix('.').unwrap_or(token);

            if ext.is_empty() {
                return Err(Error::InvalidExtensions(format!("empty extension {token:?}")));
            }
            if ext.contains(|c: char| matches!(c, '/' | '\\' | '.')) {
                return Err(Error::InvalidExtensions(format!(
                    "{token:?} is not a single extension"
                )));
            }

            if !extensions.iter().any(|e| e == ext) {
                extensions.push(ext.to_owned());
            }
        }

        if extensions.is_empty() {
            return Err(Error::InvalidExtensions("no extensions given".into()));
        }

        Ok(Self(extensions))
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.0.iter().any(|e| e == ext))
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self(DEFAULT_EXTENSIONS.iter().map(|e| e[1..].to_owned()).collect())
    }
}

fn walk_error(path: &Path, source: walkdir::Error) -> Error {
    Error::Walk {
        path: path.to_owned(),
        source,
    }
}

/// Entries directly inside `dir`, in file name order. Failing to read `dir`
/// itself is an error; entries that cannot be inspected are logged and
/// skipped.
fn children(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(e) if e.depth() == 0 => return Err(walk_error(dir, e)),
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipping unreadable entry"),
        }
    }

    Ok(entries)
}

/// Immediate subdirectories of `root`, in file name order.
pub fn folders(root: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(root).map_err(|e| Error::io(root, e))?;
    if !meta.is_dir() {
        return Err(Error::NotADirectory(root.to_owned()));
    }

    let mut folders = Vec::new();
    for entry in children(root)? {
        if entry.file_type().is_dir() {
            folders.push(entry.into_path());
        }
    }

    Ok(folders)
}

/// Files directly inside `folder` whose extension matches, with their sizes.
pub fn search_extensions(folder: &Path, extensions: &Extensions) -> Result<Vec<(PathBuf, u64)>> {
    let mut files = Vec::new();

    for entry in children(folder)? {
        if !entry.file_type().is_file() || !extensions.matches(entry.path()) {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => files.push((entry.into_path(), meta.len())),
            Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping unreadable file"),
        }
    }

    Ok(files)
}

/// Tags every matching file of every well folder below `root`, sorted by
/// ascending size. Files of equal size keep folder/file name order.
pub fn file_tags(root: &Path, extensions: &Extensions) -> Result<Vec<FileTag>> {
    let mut tags = Vec::new();

    for folder in folders(root)? {
        let well = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let files = match search_extensions(&folder, extensions) {
            Ok(files) => files,
            Err(e) => {
                warn!(well = %well, error = %e, "skipping unreadable well folder");
                continue;
            }
        };
        debug!(well = %well, files = files.len(), "searched well folder");

        tags.extend(
            files
                .into_iter()
                .map(|(path, size)| FileTag::new(well.clone(), path, size)),
        );
    }

    tags.sort_by_key(FileTag::size);
    Ok(tags)
}

/// Tags whose well occurs more than once, in input order.
pub fn find_duplicate_tags(tags: &[FileTag]) -> Vec<&FileTag> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for tag in tags {
        *counts.entry(tag.well()).or_default() += 1;
    }

    tags.iter().filter(|t| counts[t.well()] > 1).collect()
}
