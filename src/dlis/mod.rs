//! Reader for RP66 v1 (DLIS) physical files.
//!
//! Decodes the envelope (storage unit label, visible records, logical
//! record segments), splits the file into logical files at every
//! FILE-HEADER and decodes explicitly formatted records lazily on request.
//! Frame data is never decoded.

use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};
use thiserror::Error;

mod eflr;
pub mod encode;
mod objects;
mod reader;
pub mod repr;

pub use eflr::{Attribute, Object, Set};
pub use objects::{Channel, FileHeader, Frame, Origin};
pub use reader::{LogicalRecord, StorageUnitLabel};
pub use repr::{ObName, Value};

pub const FILE_HEADER_RECORD: u8 = 0;
pub const ORIGIN_RECORD: u8 = 1;
pub const CHANNEL_RECORD: u8 = 3;
pub const FRAME_RECORD: u8 = 4;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("no storage unit label in the first bytes of the file")]
    MissingStorageLabel,

    #[error("invalid storage unit label: {0}")]
    InvalidLabel(String),

    #[error("truncated {what} at byte {offset}")]
    Truncated { what: &'static str, offset: u64 },

    #[error("invalid visible record at byte {offset}: {reason}")]
    InvalidVisibleRecord { offset: u64, reason: String },

    #[error("invalid logical record segment at byte {offset}: {reason}")]
    InvalidSegment { offset: u64, reason: String },

    #[error("invalid explicitly formatted record at byte {offset}: {reason}")]
    InvalidEflr { offset: u64, reason: String },

    #[error("invalid value for representation code {code} at byte {offset}")]
    InvalidValue { code: u8, offset: u64 },

    #[error("unknown representation code {0}")]
    UnknownRepresentationCode(u8),

    #[error("representation code {code} cannot be encoded from this value")]
    Unencodable { code: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;

/// One logical file: the records from a FILE-HEADER up to the next one.
#[derive(Debug, Clone)]
pub struct LogicalFile {
    records: Vec<LogicalRecord>,
}

impl LogicalFile {
    pub fn records(&self) -> &[LogicalRecord] {
        &self.records
    }

    fn starts_with_header(&self) -> bool {
        self.records.first().is_some_and(is_file_header)
    }

    /// Decodes every readable explicitly formatted record. Encrypted records
    /// are skipped.
    pub fn sets(&self) -> Result<Vec<Set>> {
        self.records
            .iter()
            .filter(|r| r.is_decodable())
            .map(|r| {
                Set::parse(&r.body).map_err(|e| match e {
                    Error::InvalidEflr { offset, reason } => Error::InvalidEflr {
                        offset: r.offset + offset,
                        reason,
                    },
                    other => other,
                })
            })
            .collect()
    }

    pub fn header(&self) -> Result<Option<FileHeader>> {
        if !self.starts_with_header() {
            return Ok(None);
        }

        let set = Set::parse(&self.records[0].body)?;
        Ok(set.objects.first().map(FileHeader::from_object))
    }

    /// The FILE-HEADER id, used as the logical file's display name.
    pub fn id(&self) -> Result<Option<String>> {
        Ok(self.header()?.and_then(|h| h.id))
    }

    pub fn origins(&self) -> Result<Vec<Origin>> {
        let sets = self.sets()?;
        Ok(objects::objects_of(&sets, "ORIGIN")
            .map(Origin::from_object)
            .collect())
    }

    pub fn channels(&self) -> Result<Vec<Channel>> {
        let sets = self.sets()?;
        Ok(objects::objects_of(&sets, "CHANNEL")
            .map(Channel::from_object)
            .collect())
    }

    /// Every FRAME with its channel references resolved.
    pub fn frames(&self) -> Result<Vec<Frame>> {
        let sets = self.sets()?;
        let channels: Vec<Channel> = objects::objects_of(&sets, "CHANNEL")
            .map(Channel::from_object)
            .collect();

        Ok(objects::objects_of(&sets, "FRAME")
            .map(|object| Frame::from_object(object, &channels))
            .collect())
    }
}

fn is_file_header(record: &LogicalRecord) -> bool {
    record.is_decodable() && record.record_type == FILE_HEADER_RECORD
}

/// An opened physical file. Iterating yields its logical files in order.
#[derive(Debug, Clone)]
pub struct PhysicalFile {
    label: StorageUnitLabel,
    logical_files: Vec<LogicalFile>,
}

impl PhysicalFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::read(BufReader::new(File::open(path)?))
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::read(bytes)
    }

    /// Streams the file visible record by visible record. Only the bodies
    /// of decodable records are kept.
    pub fn read(mut input: impl Read) -> Result<Self> {
        let (label, rest, base) = reader::read_label(&mut input)?;
        let records = reader::read_logical_records(rest.as_slice().chain(input), base)?;

        let mut logical_files: Vec<LogicalFile> = Vec::new();
        for record in records {
            match logical_files.last_mut() {
                Some(current) if !is_file_header(&record) => current.records.push(record),
                _ => logical_files.push(LogicalFile {
                    records: vec![record],
                }),
            }
        }

        Ok(Self {
            label,
            logical_files,
        })
    }

    pub fn label(&self) -> &StorageUnitLabel {
        &self.label
    }

    pub fn logical_files(&self) -> &[LogicalFile] {
        &self.logical_files
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogicalFile> {
        self.logical_files.iter()
    }
}

impl IntoIterator for PhysicalFile {
    type Item = LogicalFile;
    type IntoIter = std::vec::IntoIter<LogicalFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.logical_files.into_iter()
    }
}

impl<'a> IntoIterator for &'a PhysicalFile {
    type Item = &'a LogicalFile;
    type IntoIter = std::slice::Iter<'a, LogicalFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.logical_files.iter()
    }
}
