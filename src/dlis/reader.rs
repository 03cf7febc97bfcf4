use super::{Error, Result};
use std::io::{self, Read};

pub const LABEL_LEN: usize = 80;
const LABEL_SEARCH_WINDOW: usize = 200;
const STRUCTURE: &[u8] = b"RECORD";
const STRUCTURE_OFFSET: usize = 9;

const VISIBLE_HEADER_LEN: usize = 4;
const SEGMENT_HEADER_LEN: usize = 4;

// Segment attribute bits, most significant first.
pub const EXPLICIT: u8 = 0b1000_0000;
pub const PREDECESSOR: u8 = 0b0100_0000;
pub const SUCCESSOR: u8 = 0b0010_0000;
pub const ENCRYPTED: u8 = 0b0001_0000;
pub const ENCRYPTION_PACKET: u8 = 0b0000_1000;
pub const CHECKSUM: u8 = 0b0000_0100;
pub const TRAILING_LENGTH: u8 = 0b0000_0010;
pub const PADDING: u8 = 0b0000_0001;

/// The 80 byte Storage Unit Label opening every physical file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUnitLabel {
    pub sequence: u32,
    pub version: String,
    pub structure: String,
    pub max_record_length: u32,
    pub storage_set: String,
}

impl StorageUnitLabel {
    /// Locates and parses the label, returning it together with the offset
    /// of the first byte after it.
    pub fn find(bytes: &[u8]) -> Result<(Self, usize)> {
        let window = &bytes[..bytes.len().min(LABEL_SEARCH_WINDOW)];
        let start = window
            .windows(STRUCTURE.len())
            .position(|w| w == STRUCTURE)
            .and_then(|pos| pos.checked_sub(STRUCTURE_OFFSET))
            .ok_or(Error::MissingStorageLabel)?;

        let raw = bytes
            .get(start..start + LABEL_LEN)
            .ok_or(Error::MissingStorageLabel)?;

        Ok((Self::parse(raw)?, start + LABEL_LEN))
    }

    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < LABEL_LEN {
            return Err(Error::MissingStorageLabel);
        }

        let field = |range: std::ops::Range<usize>| {
            String::from_utf8_lossy(&raw[range]).trim().to_owned()
        };
        let number = |range: std::ops::Range<usize>, name: &str| {
            let text = field(range);
            text.parse::<u32>()
                .map_err(|_| Error::InvalidLabel(format!("{name} is not a number: {text:?}")))
        };

        let version = field(4..9);
        if !version.starts_with("V1.") {
            return Err(Error::InvalidLabel(format!(
                "unsupported version {version:?}"
            )));
        }

        Ok(Self {
            sequence: number(0..4, "sequence number")?,
            version,
            structure: field(9..15),
            max_record_length: number(15..20, "maximum record length")?,
            storage_set: field(20..80),
        })
    }
}

/// One logical record, reassembled from its segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    pub explicit: bool,
    pub encrypted: bool,
    pub record_type: u8,
    pub offset: u64,
    /// Empty unless [`is_decodable`](Self::is_decodable).
    pub body: Vec<u8>,
}

impl LogicalRecord {
    /// Explicitly formatted and unencrypted.
    pub fn is_decodable(&self) -> bool {
        self.explicit && !self.encrypted
    }
}

struct Segment<'a> {
    attributes: u8,
    record_type: u8,
    body: &'a [u8],
}

/// Splits one segment off the front of `bytes`, the body of a visible
/// record. `base` is the file offset of `bytes`.
fn segment(bytes: &[u8], offset: usize, base: u64) -> Result<(Segment<'_>, usize)> {
    let at = base + offset as u64;
    let invalid = |reason: &str| Error::InvalidSegment {
        offset: at,
        reason: reason.to_owned(),
    };

    let header = bytes
        .get(offset..offset + SEGMENT_HEADER_LEN)
        .ok_or(Error::Truncated {
            what: "segment header",
            offset: at,
        })?;

    let length = u16::from_be_bytes([header[0], header[1]]) as usize;
    let attributes = header[2];
    let record_type = header[3];

    if length < SEGMENT_HEADER_LEN {
        return Err(invalid("length shorter than its header"));
    }
    if offset + length > bytes.len() {
        return Err(invalid("length runs past its visible record"));
    }

    let body = &bytes[offset + SEGMENT_HEADER_LEN..offset + length];
    let mut end = body.len();

    if attributes & TRAILING_LENGTH != 0 {
        end = end
            .checked_sub(2)
            .ok_or_else(|| invalid("too short for trailing length"))?;
    }
    if attributes & CHECKSUM != 0 {
        end = end
            .checked_sub(2)
            .ok_or_else(|| invalid("too short for checksum"))?;
    }
    if attributes & PADDING != 0 {
        let pad = *body[..end]
            .last()
            .ok_or_else(|| invalid("padding flag set on empty body"))? as usize;
        end = end
            .checked_sub(pad)
            .ok_or_else(|| invalid("pad count exceeds body"))?;
    }

    Ok((
        Segment {
            attributes,
            record_type,
            body: &body[..end],
        },
        offset + length,
    ))
}

fn strip_encryption_packet(body: &[u8], offset: u64) -> Result<&[u8]> {
    let len = body
        .get(..2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]) as usize)
        .ok_or(Error::Truncated {
            what: "encryption packet",
            offset,
        })?;

    body.get(len..).ok_or(Error::Truncated {
        what: "encryption packet",
        offset,
    })
}

/// Reads into `buf` until it is full or the input ends, returning how many
/// bytes were read.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(filled)
}

/// Reads the storage unit label off the front of `reader`. Returns the
/// label, the bytes read past it and the file offset those bytes start at.
pub fn read_label(reader: &mut impl Read) -> Result<(StorageUnitLabel, Vec<u8>, u64)> {
    let mut head = vec![0; LABEL_SEARCH_WINDOW + LABEL_LEN];
    let len = read_up_to(reader, &mut head)?;
    head.truncate(len);

    let (label, end) = StorageUnitLabel::find(&head)?;
    Ok((label, head.split_off(end), end as u64))
}

/// Reads visible records until the input ends and reassembles their
/// segments into logical records. `base` is the file offset of the first
/// byte of `reader`.
///
/// Only explicitly formatted, unencrypted records keep their body; the
/// others keep type and offset only, so frame data is never held in memory.
/// At most one visible record is buffered at a time.
pub fn read_logical_records(mut reader: impl Read, base: u64) -> Result<Vec<LogicalRecord>> {
    let mut records = Vec::new();
    let mut open: Option<LogicalRecord> = None;
    let mut visible = Vec::new();
    let mut pos = base;

    loop {
        let mut header = [0; VISIBLE_HEADER_LEN];
        match read_up_to(&mut reader, &mut header)? {
            0 => break,
            VISIBLE_HEADER_LEN => {}
            _ => {
                return Err(Error::Truncated {
                    what: "visible record header",
                    offset: pos,
                })
            }
        }

        let length = u16::from_be_bytes([header[0], header[1]]) as usize;
        if header[2] != 0xFF || header[3] != 0x01 {
            return Err(Error::InvalidVisibleRecord {
                offset: pos,
                reason: format!("bad marker {:#04x} {:#04x}", header[2], header[3]),
            });
        }
        if length < VISIBLE_HEADER_LEN {
            return Err(Error::InvalidVisibleRecord {
                offset: pos,
                reason: format!("length {length} shorter than its header"),
            });
        }

        visible.resize(length - VISIBLE_HEADER_LEN, 0);
        if read_up_to(&mut reader, &mut visible)? < visible.len() {
            return Err(Error::Truncated {
                what: "visible record",
                offset: pos,
            });
        }

        let body_base = pos + VISIBLE_HEADER_LEN as u64;
        let mut cursor = 0;
        while cursor < visible.len() {
            let segment_offset = body_base + cursor as u64;
            let (segment, next) = segment(&visible, cursor, body_base)?;
            cursor = next;

            let mut body = segment.body;
            if segment.attributes & PREDECESSOR == 0 {
                if open.is_some() {
                    return Err(Error::InvalidSegment {
                        offset: segment_offset,
                        reason: "new record started before the previous one ended".into(),
                    });
                }

                let encrypted = segment.attributes & ENCRYPTED != 0;
                if encrypted && segment.attributes & ENCRYPTION_PACKET != 0 {
                    body = strip_encryption_packet(body, segment_offset)?;
                }

                open = Some(LogicalRecord {
                    explicit: segment.attributes & EXPLICIT != 0,
                    encrypted,
                    record_type: segment.record_type,
                    offset: segment_offset,
                    body: Vec::new(),
                });
            }

            let record = open.as_mut().ok_or_else(|| Error::InvalidSegment {
                offset: segment_offset,
                reason: "continuation segment without a record to continue".into(),
            })?;
            if record.is_decodable() {
                record.body.extend_from_slice(body);
            }

            if segment.attributes & SUCCESSOR == 0 {
                records.extend(open.take());
            }
        }

        pos += length as u64;
    }

    if let Some(record) = open {
        return Err(Error::Truncated {
            what: "logical record",
            offset: record.offset,
        });
    }

    Ok(records)
}
