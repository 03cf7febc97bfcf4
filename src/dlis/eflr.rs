use super::repr::{Cursor, ObName, Value, IDENT};
use super::{Error, Result};
use std::sync::Arc;

// Component roles, stored in the top three bits of the descriptor.
pub(super) const ABSATR: u8 = 0b000;
pub(super) const ATTRIB: u8 = 0b001;
const INVATR: u8 = 0b010;
pub(super) const OBJECT: u8 = 0b011;
const RDSET: u8 = 0b101;
const RSET: u8 = 0b110;
pub(super) const SET: u8 = 0b111;

pub(super) const SET_TYPE: u8 = 0b1_0000;
const SET_NAME: u8 = 0b0_1000;
pub(super) const OBJECT_NAME: u8 = 0b1_0000;
pub(super) const ATTR_LABEL: u8 = 0b1_0000;
pub(super) const ATTR_COUNT: u8 = 0b0_1000;
pub(super) const ATTR_REPR: u8 = 0b0_0100;
pub(super) const ATTR_UNITS: u8 = 0b0_0010;
pub(super) const ATTR_VALUE: u8 = 0b0_0001;

fn role(descriptor: u8) -> u8 {
    descriptor >> 5
}

pub(super) const fn descriptor(role: u8, flags: u8) -> u8 {
    role << 5 | flags
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub label: String,
    pub count: u32,
    pub repr: u8,
    pub units: String,
    /// Shared with the template when an object inherits it.
    pub values: Arc<[Value]>,
}

impl Default for Attribute {
    fn default() -> Self {
        Self {
            label: String::new(),
            count: 1,
            repr: IDENT,
            units: String::new(),
            values: Arc::from(Vec::new()),
        }
    }
}

impl Attribute {
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub name: ObName,
    pub attributes: Vec<Attribute>,
}

impl Object {
    pub fn attribute(&self, label: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.label == label)
    }

    pub fn text(&self, label: &str) -> Option<String> {
        self.attribute(label)?
            .first()?
            .as_str()
            .map(|s| s.trim().to_owned())
    }

    pub fn number(&self, label: &str) -> Option<f64> {
        self.attribute(label)?.first()?.as_f64()
    }
}

/// An explicitly formatted logical record: one set of same-typed objects.
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub set_type: String,
    pub name: Option<String>,
    pub template: Vec<Attribute>,
    pub objects: Vec<Object>,
}

fn attribute(cursor: &mut Cursor, descriptor: u8, base: &Attribute) -> Result<Attribute> {
    let mut attr = base.clone();

    if descriptor & ATTR_LABEL != 0 {
        attr.label = cursor.ident()?;
    }
    if descriptor & ATTR_COUNT != 0 {
        attr.count = cursor.uvari()?;
    }
    if descriptor & ATTR_REPR != 0 {
        attr.repr = cursor.u8()?;
    }
    if descriptor & ATTR_UNITS != 0 {
        attr.units = cursor.ident()?;
    }
    if descriptor & ATTR_VALUE != 0 {
        attr.values = (0..attr.count)
            .map(|_| cursor.value(attr.repr))
            .collect::<Result<Vec<_>>>()?
            .into();
    }

    Ok(attr)
}

impl Set {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(body);
        let invalid = |cursor: &Cursor, reason: String| Error::InvalidEflr {
            offset: cursor.position() as u64,
            reason,
        };

        let descriptor = cursor.u8()?;
        if !matches!(role(descriptor), SET | RSET | RDSET) {
            return Err(invalid(
                &cursor,
                format!("expected a set component, got {descriptor:#010b}"),
            ));
        }

        let set_type = if descriptor & SET_TYPE != 0 {
            cursor.ident()?
        } else {
            return Err(invalid(&cursor, "set without a type".into()));
        };
        let name = if descriptor & SET_NAME != 0 {
            Some(cursor.ident()?)
        } else {
            None
        };

        let mut template = Vec::new();
        while let Some(descriptor) = cursor.peek() {
            match role(descriptor) {
                OBJECT => break,
                ATTRIB | INVATR => {
                    cursor.u8()?;
                    template.push(attribute(&mut cursor, descriptor, &Attribute::default())?);
                }
                _ => {
                    return Err(invalid(
                        &cursor,
                        format!("unexpected component {descriptor:#010b} in template"),
                    ))
                }
            }
        }

        let mut objects = Vec::new();
        while !cursor.is_empty() {
            let descriptor = cursor.u8()?;
            if role(descriptor) != OBJECT || descriptor & OBJECT_NAME == 0 {
                return Err(invalid(
                    &cursor,
                    format!("expected a named object, got {descriptor:#010b}"),
                ));
            }

            let name = cursor.obname()?;
            let mut attributes = Vec::with_capacity(template.len());

            for base in &template {
                match cursor.peek().map(role) {
                    None | Some(OBJECT) => attributes.push(base.clone()),
                    Some(ABSATR) => {
                        cursor.u8()?;
                    }
                    Some(ATTRIB) | Some(INVATR) => {
                        let descriptor = cursor.u8()?;
                        attributes.push(attribute(&mut cursor, descriptor, base)?);
                    }
                    Some(_) => {
                        return Err(invalid(
                            &cursor,
                            format!("unexpected component in object {name}"),
                        ))
                    }
                }
            }

            objects.push(Object { name, attributes });
        }

        Ok(Set {
            set_type,
            name,
            template,
            objects,
        })
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::dlis::encode::{self, Attr};
    use crate::dlis::repr::{ASCII, FSINGL};

    #[test]
    fn inherit_template_defaults() {
        let body = encode::set(
            "CHANNEL",
            &[
                Attr::new("LONG-NAME", ASCII, vec![]),
                Attr::new("UNITS", IDENT, vec![Value::Text("m".into())]),
            ],
            &[(
                ObName::new(1, 0, "GR"),
                vec![Some(Attr::value(ASCII, vec![Value::Text("Gamma Ray".into())]))],
            )],
        )
        .unwrap();

        let set = Set::parse(&body).unwrap();
        let gr = &set.objects[0];

        assert_eq!(set.set_type, "CHANNEL");
        assert_eq!(gr.name, ObName::new(1, 0, "GR"));
        assert_eq!(gr.text("LONG-NAME").as_deref(), Some("Gamma Ray"));
        assert_eq!(gr.text("UNITS").as_deref(), Some("m"));
        assert!(Arc::ptr_eq(
            &set.template[1].values,
            &gr.attribute("UNITS").unwrap().values
        ));
    }

    #[test]
    fn drop_absent_attributes() {
        let body = encode::set(
            "FRAME",
            &[
                Attr::new("INDEX-MIN", FSINGL, vec![]),
                Attr::new("INDEX-MAX", FSINGL, vec![]),
            ],
            &[(
                ObName::new(1, 0, "MAIN"),
                vec![
                    None,
                    Some(Attr::value(FSINGL, vec![Value::Float(2.5)]).units("m")),
                ],
            )],
        )
        .unwrap();

        let set = Set::parse(&body).unwrap();
        let frame = &set.objects[0];

        assert!(frame.attribute("INDEX-MIN").is_none());
        assert_eq!(frame.number("INDEX-MAX"), Some(2.5));
        assert_eq!(frame.attribute("INDEX-MAX").map(|a| a.units.as_str()), Some("m"));
    }

    #[test]
    fn reject_non_set_records() {
        assert!(matches!(
            Set::parse(&[0b0110_0000]),
            Err(Error::InvalidEflr { .. })
        ));
    }
}
