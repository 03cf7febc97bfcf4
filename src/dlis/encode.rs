//! Minimal DLIS writer.
//!
//! Produces well-formed physical files out of explicitly formatted sets so
//! fixtures never have to be checked in. Frame data is not written.

use super::eflr::{
    descriptor, ABSATR, ATTRIB, ATTR_COUNT, ATTR_LABEL, ATTR_REPR, ATTR_UNITS, ATTR_VALUE, OBJECT,
    OBJECT_NAME, SET, SET_TYPE,
};
use super::reader::{EXPLICIT, PADDING, PREDECESSOR, SUCCESSOR};
use super::repr::*;
use super::{Error, Result, CHANNEL_RECORD, FILE_HEADER_RECORD, FRAME_RECORD, ORIGIN_RECORD};

const MIN_SEGMENT_LEN: usize = 16;
const DEFAULT_SEGMENT_BODY: usize = 4000;
const MAX_RECORD_LEN: u32 = 8192;

/// One attribute component, either in a template or overriding one.
#[derive(Debug, Clone)]
pub struct Attr {
    label: Option<String>,
    repr: u8,
    units: Option<String>,
    values: Vec<Value>,
}

impl Attr {
    /// Template attribute with a label and optional default values.
    pub fn new(label: impl Into<String>, repr: u8, values: Vec<Value>) -> Self {
        Self {
            label: Some(label.into()),
            repr,
            units: None,
            values,
        }
    }

    /// Object attribute replacing the template's values.
    pub fn value(repr: u8, values: Vec<Value>) -> Self {
        Self {
            label: None,
            repr,
            units: None,
            values,
        }
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}

fn put_uvari(out: &mut Vec<u8>, value: u32) {
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.extend_from_slice(&(value as u16 | 0x8000).to_be_bytes());
    } else {
        out.extend_from_slice(&((value & 0x3FFF_FFFF) | 0xC000_0000).to_be_bytes());
    }
}

fn put_ident(out: &mut Vec<u8>, text: &str) {
    let bytes = &text.as_bytes()[..text.len().min(u8::MAX as usize)];
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
}

fn put_ascii(out: &mut Vec<u8>, text: &str) {
    put_uvari(out, text.len() as u32);
    out.extend_from_slice(text.as_bytes());
}

fn put_obname(out: &mut Vec<u8>, name: &ObName) {
    put_uvari(out, name.origin);
    out.push(name.copy);
    put_ident(out, &name.id);
}

fn put_value(out: &mut Vec<u8>, repr: u8, value: &Value) -> Result<()> {
    match (repr, value) {
        (FSINGL, Value::Float(f)) => out.extend_from_slice(&(*f as f32).to_be_bytes()),
        (FDOUBL, Value::Float(f)) => out.extend_from_slice(&f.to_be_bytes()),
        (SSHORT, Value::Int(i)) => out.push(*i as i8 as u8),
        (SNORM, Value::Int(i)) => out.extend_from_slice(&(*i as i16).to_be_bytes()),
        (SLONG, Value::Int(i)) => out.extend_from_slice(&(*i as i32).to_be_bytes()),
        (USHORT | STATUS, Value::Int(i)) => out.push(*i as u8),
        (UNORM, Value::Int(i)) => out.extend_from_slice(&(*i as u16).to_be_bytes()),
        (ULONG, Value::Int(i)) => out.extend_from_slice(&(*i as u32).to_be_bytes()),
        (UVARI | ORIGIN, Value::Int(i)) => put_uvari(out, *i as u32),
        (IDENT | UNITS, Value::Text(text)) => put_ident(out, text),
        (ASCII, Value::Text(text)) => put_ascii(out, text),
        (DTIME, Value::DateTime(dt)) => {
            out.push((dt.year() - 1900) as u8);
            out.push(u8::from(dt.month()));
            out.extend_from_slice(&[dt.day(), dt.hour(), dt.minute(), dt.second()]);
            out.extend_from_slice(&dt.millisecond().to_be_bytes());
        }
        (OBNAME, Value::ObName(name)) => put_obname(out, name),
        (OBJREF, Value::ObjRef(set_type, name)) => {
            put_ident(out, set_type);
            put_obname(out, name);
        }
        _ => return Err(Error::Unencodable { code: repr }),
    }

    Ok(())
}

fn put_attribute(out: &mut Vec<u8>, attr: &Attr, in_template: bool) -> Result<()> {
    let with_value = !in_template || !attr.values.is_empty();

    let mut flags = ATTR_REPR;
    if attr.label.is_some() {
        flags |= ATTR_LABEL;
    }
    if with_value {
        flags |= ATTR_COUNT | ATTR_VALUE;
    }
    if attr.units.is_some() {
        flags |= ATTR_UNITS;
    }
    out.push(descriptor(ATTRIB, flags));

    if let Some(label) = &attr.label {
        put_ident(out, label);
    }
    if with_value {
        put_uvari(out, attr.values.len() as u32);
    }
    out.push(attr.repr);
    if let Some(units) = &attr.units {
        put_ident(out, units);
    }
    if with_value {
        for value in &attr.values {
            put_value(out, attr.repr, value)?;
        }
    }

    Ok(())
}

/// Encodes a set body. Each object lists its attributes in template order;
/// `None` marks an absent attribute, missing trailing entries inherit the
/// template.
pub fn set(
    set_type: &str,
    template: &[Attr],
    objects: &[(ObName, Vec<Option<Attr>>)],
) -> Result<Vec<u8>> {
    let mut out = vec![descriptor(SET, SET_TYPE)];
    put_ident(&mut out, set_type);

    for attr in template {
        put_attribute(&mut out, attr, true)?;
    }

    for (name, attributes) in objects {
        out.push(descriptor(OBJECT, OBJECT_NAME));
        put_obname(&mut out, name);

        for attr in attributes {
            match attr {
                Some(attr) => put_attribute(&mut out, attr, false)?,
                None => out.push(descriptor(ABSATR, 0)),
            }
        }
    }

    Ok(out)
}

fn text(value: &str) -> Vec<Value> {
    vec![Value::Text(value.into())]
}

struct Record {
    explicit: bool,
    record_type: u8,
    body: Vec<u8>,
}

/// Accumulates logical records and lays them out into a physical file.
pub struct Writer {
    storage_set: String,
    segment_body: usize,
    origin: u32,
    records: Vec<Record>,
}

impl Writer {
    pub fn new(storage_set: impl Into<String>) -> Self {
        Self {
            storage_set: storage_set.into(),
            segment_body: DEFAULT_SEGMENT_BODY,
            origin: 1,
            records: Vec::new(),
        }
    }

    /// Caps segment bodies, forcing longer records to span visible records.
    pub fn segment_body(mut self, len: usize) -> Self {
        self.segment_body = len.max(2);
        self
    }

    pub fn record(&mut self, explicit: bool, record_type: u8, body: Vec<u8>) -> &mut Self {
        self.records.push(Record {
            explicit,
            record_type,
            body,
        });
        self
    }

    /// Starts a new logical file.
    pub fn file_header(&mut self, sequence: u32, id: &str) -> Result<&mut Self> {
        let body = set(
            "FILE-HEADER",
            &[
                Attr::new("SEQUENCE-NUMBER", ASCII, vec![]),
                Attr::new("ID", ASCII, vec![]),
            ],
            &[(
                ObName::new(self.origin, 0, "0"),
                vec![
                    Some(Attr::value(ASCII, text(&sequence.to_string()))),
                    Some(Attr::value(ASCII, text(id))),
                ],
            )],
        )?;
        Ok(self.record(true, FILE_HEADER_RECORD, body))
    }

    pub fn origin(&mut self, well: &str, field: &str, company: &str) -> Result<&mut Self> {
        let body = set(
            "ORIGIN",
            &[
                Attr::new("FILE-ID", ASCII, vec![]),
                Attr::new("WELL-NAME", ASCII, vec![]),
                Attr::new("FIELD-NAME", ASCII, vec![]),
                Attr::new("COMPANY", ASCII, vec![]),
            ],
            &[(
                ObName::new(self.origin, 0, "DLIS_DEFINING_ORIGIN"),
                vec![
                    Some(Attr::value(ASCII, text(&self.storage_set))),
                    Some(Attr::value(ASCII, text(well))),
                    Some(Attr::value(ASCII, text(field))),
                    Some(Attr::value(ASCII, text(company))),
                ],
            )],
        )?;
        Ok(self.record(true, ORIGIN_RECORD, body))
    }

    /// Writes one CHANNEL set holding `(name, units)` channels.
    pub fn channels(&mut self, channels: &[(&str, &str)]) -> Result<&mut Self> {
        let objects: Vec<_> = channels
            .iter()
            .map(|(name, units)| {
                (
                    ObName::new(self.origin, 0, *name),
                    vec![
                        Some(Attr::value(ASCII, text(name))),
                        Some(Attr::value(UNITS, text(units))),
                        Some(Attr::value(USHORT, vec![Value::Int(i64::from(FSINGL))])),
                    ],
                )
            })
            .collect();

        let body = set(
            "CHANNEL",
            &[
                Attr::new("LONG-NAME", ASCII, vec![]),
                Attr::new("UNITS", UNITS, vec![]),
                Attr::new("REPRESENTATION-CODE", USHORT, vec![]),
                Attr::new("DIMENSION", UVARI, vec![Value::Int(1)]),
            ],
            &objects,
        )?;
        Ok(self.record(true, CHANNEL_RECORD, body))
    }

    pub fn frame(&mut self, name: &str, channels: &[&str], index: (f64, f64)) -> Result<&mut Self> {
        let refs = channels
            .iter()
            .map(|channel| Value::ObName(ObName::new(self.origin, 0, *channel)))
            .collect();

        let body = set(
            "FRAME",
            &[
                Attr::new("CHANNELS", OBNAME, vec![]),
                Attr::new("INDEX-TYPE", IDENT, vec![]),
                Attr::new("DIRECTION", IDENT, vec![]),
                Attr::new("INDEX-MIN", FDOUBL, vec![]),
                Attr::new("INDEX-MAX", FDOUBL, vec![]),
            ],
            &[(
                ObName::new(self.origin, 0, name),
                vec![
                    Some(Attr::value(OBNAME, refs)),
                    Some(Attr::value(IDENT, text("BOREHOLE-DEPTH"))),
                    Some(Attr::value(IDENT, text("INCREASING"))),
                    Some(Attr::value(FDOUBL, vec![Value::Float(index.0)])),
                    Some(Attr::value(FDOUBL, vec![Value::Float(index.1)])),
                ],
            )],
        )?;
        Ok(self.record(true, FRAME_RECORD, body))
    }

    fn label(&self) -> Vec<u8> {
        let storage_set: String = self
            .storage_set
            .chars()
            .map(|c| if c.is_ascii() { c } else { '?' })
            .take(60)
            .collect();

        format!("{:>4}V1.00RECORD{:>5}{:<60}", 1, MAX_RECORD_LEN, storage_set).into_bytes()
    }

    /// Lays every record out as one or more segments, one segment per
    /// visible record.
    pub fn finish(&self) -> Vec<u8> {
        let mut out = self.label();

        for record in &self.records {
            let chunks: Vec<&[u8]> = if record.body.is_empty() {
                vec![&record.body[..]]
            } else {
                record.body.chunks(self.segment_body).collect()
            };
            let last = chunks.len() - 1;

            for (i, chunk) in chunks.into_iter().enumerate() {
                let mut attributes = 0;
                if record.explicit {
                    attributes |= EXPLICIT;
                }
                if i > 0 {
                    attributes |= PREDECESSOR;
                }
                if i < last {
                    attributes |= SUCCESSOR;
                }

                let mut len = 4 + chunk.len();
                let mut pad = MIN_SEGMENT_LEN.saturating_sub(len);
                if (len + pad) % 2 != 0 {
                    pad += 1;
                }
                if pad > 0 {
                    attributes |= PADDING;
                }
                len += pad;

                out.extend_from_slice(&((len + 4) as u16).to_be_bytes());
                out.extend_from_slice(&[0xFF, 0x01]);
                out.extend_from_slice(&(len as u16).to_be_bytes());
                out.extend_from_slice(&[attributes, record.record_type]);
                out.extend_from_slice(chunk);
                if pad > 0 {
                    out.extend(std::iter::repeat(0).take(pad - 1));
                    out.push(pad as u8);
                }
            }
        }

        out
    }
}

/// A physical file with `runs` logical files, each describing one depth
/// frame of `DEPT` and `GR` for `well`.
pub fn logged_well(well: &str, runs: u32) -> Result<Vec<u8>> {
    let mut writer = Writer::new(format!("{well} LOGS"));

    for run in 1..=runs {
        let top = 1000.0 * f64::from(run);
        writer
            .file_header(run, &format!("RUN {run}"))?
            .origin(well, "DEMO FIELD", "DEMO")?
            .channels(&[("DEPT", "m"), ("GR", "gAPI")])?
            .frame("MAIN", &["DEPT", "GR"], (top, top + 500.0))?;
    }

    Ok(writer.finish())
}
