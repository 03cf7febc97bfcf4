use super::{Error, Result};
use serde::Serialize;
use std::fmt;
use time::{Date, Month, PrimitiveDateTime, Time};

pub const FSHORT: u8 = 1;
pub const FSINGL: u8 = 2;
pub const FSING1: u8 = 3;
pub const FSING2: u8 = 4;
pub const ISINGL: u8 = 5;
pub const VSINGL: u8 = 6;
pub const FDOUBL: u8 = 7;
pub const FDOUB1: u8 = 8;
pub const FDOUB2: u8 = 9;
pub const CSINGL: u8 = 10;
pub const CDOUBL: u8 = 11;
pub const SSHORT: u8 = 12;
pub const SNORM: u8 = 13;
pub const SLONG: u8 = 14;
pub const USHORT: u8 = 15;
pub const UNORM: u8 = 16;
pub const ULONG: u8 = 17;
pub const UVARI: u8 = 18;
pub const IDENT: u8 = 19;
pub const ASCII: u8 = 20;
pub const DTIME: u8 = 21;
pub const ORIGIN: u8 = 22;
pub const OBNAME: u8 = 23;
pub const OBJREF: u8 = 24;
pub const ATTREF: u8 = 25;
pub const STATUS: u8 = 26;
pub const UNITS: u8 = 27;

/// Object name: the (origin, copy number, identifier) triple every DLIS
/// object is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObName {
    pub origin: u32,
    pub copy: u8,
    pub id: String,
}

impl ObName {
    pub fn new(origin: u32, copy: u8, id: impl Into<String>) -> Self {
        Self {
            origin,
            copy,
            id: id.into(),
        }
    }
}

impl fmt::Display for ObName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.origin, self.copy, self.id)
    }
}

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Text(String),
    DateTime(PrimitiveDateTime),
    ObName(ObName),
    ObjRef(String, ObName),
    AttRef(String, ObName, String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_obname(&self) -> Option<&ObName> {
        match self {
            Value::ObName(name) => Some(name),
            Value::ObjRef(_, name) => Some(name),
            _ => None,
        }
    }
}

/// Bounds-checked reader over a logical record body.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(Error::Truncated {
                what: "attribute value",
                offset: self.pos as u64,
            })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn uvari(&mut self) -> Result<u32> {
        let first = self.peek().ok_or(Error::Truncated {
            what: "UVARI",
            offset: self.pos as u64,
        })?;

        match first >> 6 {
            0b00 | 0b01 => Ok(u32::from(self.u8()?)),
            0b10 => Ok(u32::from(self.u16()? & 0x3FFF)),
            _ => Ok(self.u32()? & 0x3FFF_FFFF),
        }
    }

    pub fn ident(&mut self) -> Result<String> {
        let len = self.u8()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    pub fn ascii(&mut self) -> Result<String> {
        let len = self.uvari()? as usize;
        Ok(String::from_utf8_lossy(self.take(len)?).into_owned())
    }

    pub fn obname(&mut self) -> Result<ObName> {
        let origin = self.uvari()?;
        let copy = self.u8()?;
        let id = self.ident()?;
        Ok(ObName { origin, copy, id })
    }

    fn f32(&mut self) -> Result<f64> {
        Ok(f64::from(f32::from_be_bytes(self.array()?)))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.array()?))
    }

    fn dtime(&mut self) -> Result<PrimitiveDateTime> {
        let offset = self.pos as u64;
        let [year, tz_month, day, hour, minute, second] = self.array()?;
        let millis = self.u16()?;
        let invalid = |_| Error::InvalidValue {
            code: DTIME,
            offset,
        };

        let month = Month::try_from(tz_month & 0x0F).map_err(invalid)?;
        let date = Date::from_calendar_date(1900 + i32::from(year), month, day).map_err(invalid)?;
        let time = Time::from_hms_milli(hour, minute, second, millis).map_err(invalid)?;
        Ok(PrimitiveDateTime::new(date, time))
    }

    /// Reads a single value of the given representation code.
    pub fn value(&mut self, code: u8) -> Result<Value> {
        let value = match code {
            FSHORT => Value::Float(fshort(self.u16()?)),
            FSINGL => Value::Float(self.f32()?),
            FSING1 => {
                let value = self.f32()?;
                self.f32()?;
                Value::Float(value)
            }
            FSING2 => {
                let value = self.f32()?;
                self.take(8)?;
                Value::Float(value)
            }
            ISINGL => Value::Float(isingl(self.array()?)),
            VSINGL => Value::Float(vsingl(self.array()?)),
            FDOUBL => Value::Float(self.f64()?),
            FDOUB1 => {
                let value = self.f64()?;
                self.f64()?;
                Value::Float(value)
            }
            FDOUB2 => {
                let value = self.f64()?;
                self.take(16)?;
                Value::Float(value)
            }
            CSINGL => Value::Complex(self.f32()?, self.f32()?),
            CDOUBL => Value::Complex(self.f64()?, self.f64()?),
            SSHORT => Value::Int(i64::from(self.u8()? as i8)),
            SNORM => Value::Int(i64::from(self.u16()? as i16)),
            SLONG => Value::Int(i64::from(self.u32()? as i32)),
            USHORT | STATUS => Value::Int(i64::from(self.u8()?)),
            UNORM => Value::Int(i64::from(self.u16()?)),
            ULONG => Value::Int(i64::from(self.u32()?)),
            UVARI | ORIGIN => Value::Int(i64::from(self.uvari()?)),
            IDENT | UNITS => Value::Text(self.ident()?),
            ASCII => Value::Text(self.ascii()?),
            DTIME => Value::DateTime(self.dtime()?),
            OBNAME => Value::ObName(self.obname()?),
            OBJREF => Value::ObjRef(self.ident()?, self.obname()?),
            ATTREF => Value::AttRef(self.ident()?, self.obname()?, self.ident()?),
            other => return Err(Error::UnknownRepresentationCode(other)),
        };

        Ok(value)
    }
}

/// Low precision float: 12 bit two's complement fraction, 4 bit exponent.
fn fshort(raw: u16) -> f64 {
    let exponent = i32::from(raw & 0x000F);
    let mut fraction = i32::from(raw >> 4);
    if fraction & 0x0800 != 0 {
        fraction -= 0x1000;
    }
    f64::from(fraction) / 2048.0 * 2f64.powi(exponent)
}

/// IBM System/360 single precision: base 16 exponent, excess 64.
fn isingl(bytes: [u8; 4]) -> f64 {
    let raw = u32::from_be_bytes(bytes);
    let sign = if raw & 0x8000_0000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((raw >> 24) & 0x7F) as i32 - 64;
    let fraction = f64::from(raw & 0x00FF_FFFF) / f64::from(1u32 << 24);
    sign * fraction * 16f64.powi(exponent)
}

/// VAX F-floating, stored as two little-endian 16 bit words.
fn vsingl(bytes: [u8; 4]) -> f64 {
    let raw = u32::from_be_bytes([bytes[1], bytes[0], bytes[3], bytes[2]]);
    let exponent = ((raw >> 23) & 0xFF) as i32;
    if exponent == 0 {
        return 0.0;
    }
    let sign = if raw & 0x8000_0000 != 0 { -1.0 } else { 1.0 };
    let fraction = 0.5 + f64::from(raw & 0x007F_FFFF) / f64::from(1u32 << 24);
    sign * fraction * 2f64.powi(exponent - 128)
}

#[cfg(test)]
mod does {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn read_uvari_in_all_widths() {
        let bytes = [0x7F, 0x80, 0x80, 0xC0, 0x00, 0x01, 0x00];
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.uvari().unwrap(), 0x7F);
        assert_eq!(cursor.uvari().unwrap(), 0x80);
        assert_eq!(cursor.uvari().unwrap(), 0x100);
        assert!(cursor.is_empty());
    }

    #[test]
    fn decode_foreign_floats() {
        // 0.5 * 2^1
        assert_eq!(fshort(0x4001), 1.0);
        assert_eq!(fshort(0xC001), -1.0);
        // 0x41 -> 16^1, fraction 0x100000 / 2^24 = 1/16
        assert_eq!(isingl([0x41, 0x10, 0x00, 0x00]), 1.0);
        assert_eq!(isingl([0xC1, 0x10, 0x00, 0x00]), -1.0);
        // VAX 1.0 is 0x40800000 with the 16 bit words swapped
        assert_eq!(vsingl([0x80, 0x40, 0x00, 0x00]), 1.0);
        assert_eq!(vsingl([0x00, 0x00, 0x00, 0x00]), 0.0);
    }

    #[test]
    fn decode_text_and_names() {
        let bytes = [
            0x04, b'D', b'E', b'P', b'T', // IDENT
            0x02, 0x00, 0x03, b'T', b'V', b'D', // OBNAME
        ];
        let mut cursor = Cursor::new(&bytes);

        assert_eq!(cursor.value(IDENT).unwrap(), Value::Text("DEPT".into()));
        assert_eq!(
            cursor.value(OBNAME).unwrap(),
            Value::ObName(ObName::new(2, 0, "TVD"))
        );
    }

    #[test]
    fn decode_dtime() {
        // 1987-04-19 21:20:15.620
        let bytes = [87, 0x14, 19, 21, 20, 15, 0x02, 0x6C];
        let value = Cursor::new(&bytes).value(DTIME).unwrap();

        assert_eq!(value, Value::DateTime(datetime!(1987-04-19 21:20:15.620)));
    }

    #[test]
    fn reject_truncated_and_unknown() {
        assert!(matches!(
            Cursor::new(&[0x00, 0x01]).value(FSINGL),
            Err(Error::Truncated { .. })
        ));
        assert!(matches!(
            Cursor::new(&[0x00]).value(66),
            Err(Error::UnknownRepresentationCode(66))
        ));
    }
}
