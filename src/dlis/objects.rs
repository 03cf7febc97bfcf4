use super::eflr::{Object, Set};
use super::repr::{ObName, Value};
use serde::Serialize;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileHeader {
    pub name: ObName,
    pub sequence_number: Option<String>,
    pub id: Option<String>,
}

impl FileHeader {
    pub fn from_object(object: &Object) -> Self {
        Self {
            name: object.name.clone(),
            sequence_number: object.text("SEQUENCE-NUMBER"),
            id: object.text("ID"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Origin {
    pub name: ObName,
    pub file_id: Option<String>,
    pub file_set_name: Option<String>,
    pub well_name: Option<String>,
    pub field_name: Option<String>,
    pub company: Option<String>,
    pub creation_time: Option<PrimitiveDateTime>,
}

impl Origin {
    pub fn from_object(object: &Object) -> Self {
        let creation_time = object
            .attribute("CREATION-TIME")
            .and_then(|a| a.first())
            .and_then(|v| match v {
                Value::DateTime(dt) => Some(*dt),
                _ => None,
            });

        Self {
            name: object.name.clone(),
            file_id: object.text("FILE-ID"),
            file_set_name: object.text("FILE-SET-NAME"),
            well_name: object.text("WELL-NAME"),
            field_name: object.text("FIELD-NAME"),
            company: object.text("COMPANY"),
            creation_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub name: ObName,
    pub long_name: Option<String>,
    pub units: Option<String>,
    pub repr: Option<i64>,
    pub dimension: Vec<i64>,
}

impl Channel {
    pub fn from_object(object: &Object) -> Self {
        let dimension = object
            .attribute("DIMENSION")
            .map(|a| a.values.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default();

        Self {
            name: object.name.clone(),
            long_name: object.text("LONG-NAME"),
            units: object.text("UNITS"),
            repr: object
                .attribute("REPRESENTATION-CODE")
                .and_then(|a| a.first())
                .and_then(Value::as_i64),
            dimension,
        }
    }

    /// Stands in for a frame reference with no CHANNEL object behind it.
    pub fn unresolved(name: ObName) -> Self {
        Self {
            name,
            long_name: None,
            units: None,
            repr: None,
            dimension: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub name: ObName,
    pub index_type: Option<String>,
    pub direction: Option<String>,
    pub spacing: Option<f64>,
    pub index_min: Option<f64>,
    pub index_max: Option<f64>,
    /// Channels in frame order. References without a matching CHANNEL
    /// object in the same logical file keep their slot as
    /// [`Channel::unresolved`].
    pub channels: Vec<Channel>,
}

impl Frame {
    pub fn from_object(object: &Object, channels: &[Channel]) -> Self {
        let channels = object
            .attribute("CHANNELS")
            .map(|a| {
                a.values
                    .iter()
                    .filter_map(Value::as_obname)
                    .map(|name| {
                        channels
                            .iter()
                            .find(|c| &c.name == name)
                            .cloned()
                            .unwrap_or_else(|| Channel::unresolved(name.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: object.name.clone(),
            index_type: object.text("INDEX-TYPE"),
            direction: object.text("DIRECTION"),
            spacing: object.number("SPACING"),
            index_min: object.number("INDEX-MIN"),
            index_max: object.number("INDEX-MAX"),
            channels,
        }
    }
}

/// Objects of every set of the given type, in record order.
pub(super) fn objects_of<'a>(sets: &'a [Set], set_type: &'a str) -> impl Iterator<Item = &'a Object> {
    sets.iter()
        .filter(move |s| s.set_type == set_type)
        .flat_map(|s| s.objects.iter())
}
