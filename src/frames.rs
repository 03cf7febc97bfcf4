//! Per-frame summaries of an opened physical file.

use crate::dlis::{self, Frame, PhysicalFile};
use serde::Serialize;

/// Marker in the first channel name identifying a generic index channel.
pub const INDEX_CHANNEL_MARKER: &str = "INDEX";
/// Name such an index channel is reported under.
pub const DEPTH_CHANNEL: &str = "DEPT";

/// Renames a generic index channel leading the list to `DEPT`.
///
/// Returns whether a rename happened. Lists that are empty or start with
/// any other channel are left as they are.
pub fn rename_index_channel(channels: &mut [String]) -> bool {
    match channels.first_mut() {
        Some(first) if first.contains(INDEX_CHANNEL_MARKER) => {
            *first = DEPTH_CHANNEL.to_owned();
            true
        }
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub file_name: String,
    pub well_name: Option<String>,
    pub logical_file: Option<String>,
    pub frame: String,
    pub channels: Vec<String>,
    pub index_min: Option<f64>,
    pub index_max: Option<f64>,
    #[serde(skip)]
    pub units: Vec<String>,
    pub index_units: Option<String>,
}

impl FrameSummary {
    pub fn new(
        frame: &Frame,
        logical_file: Option<String>,
        file_name: &str,
        well_name: Option<&str>,
    ) -> Self {
        let mut channels: Vec<String> = frame.channels.iter().map(|c| c.name.id.clone()).collect();
        rename_index_channel(&mut channels);

        let units: Vec<String> = frame
            .channels
            .iter()
            .map(|c| c.units.clone().unwrap_or_default())
            .collect();

        Self {
            file_name: file_name.to_owned(),
            well_name: well_name.map(str::to_owned),
            logical_file,
            frame: frame.name.id.clone(),
            channels,
            index_min: frame.index_min,
            index_max: frame.index_max,
            index_units: frame.channels.first().and_then(|c| c.units.clone()),
            units,
        }
    }
}

/// Every frame summary of one physical file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFrames {
    pub file_name: String,
    pub frames: Vec<FrameSummary>,
}

impl FileFrames {
    pub fn from_physical(
        physical: &PhysicalFile,
        file_name: &str,
        well_name: Option<&str>,
    ) -> dlis::Result<Self> {
        let mut frames = Vec::new();

        for logical in physical {
            let id = logical.id()?;
            for frame in logical.frames()? {
                frames.push(FrameSummary::new(&frame, id.clone(), file_name, well_name));
            }
        }

        Ok(Self {
            file_name: file_name.to_owned(),
            frames,
        })
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::dlis::encode::Writer;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rename_leading_index_channel() {
        let mut channels = strings(&["TDEP_INDEX", "GR"]);
        assert!(rename_index_channel(&mut channels));
        assert_eq!(channels, strings(&["DEPT", "GR"]));
    }

    #[test]
    fn leave_other_channels_alone() {
        let mut channels = strings(&["TIME", "INDEX"]);
        assert!(!rename_index_channel(&mut channels));
        assert_eq!(channels, strings(&["TIME", "INDEX"]));

        let mut empty: Vec<String> = Vec::new();
        assert!(!rename_index_channel(&mut empty));
    }

    #[test]
    fn summarize_every_frame() {
        let mut writer = Writer::new("FRAMES");
        writer
            .file_header(1, "MAIN LOG")
            .unwrap()
            .channels(&[("INDEX", "0.1 in"), ("GR", "gAPI")])
            .unwrap()
            .frame("60B", &["INDEX", "GR"], (1000.0, 2000.0))
            .unwrap();
        writer
            .file_header(2, "REPEAT")
            .unwrap()
            .channels(&[("DEPTH", "m")])
            .unwrap()
            .frame("10B", &["DEPTH"], (5.0, 6.0))
            .unwrap();
        let physical = PhysicalFile::parse(&writer.finish()).unwrap();

        let summary = FileFrames::from_physical(&physical, "a.dlis", Some("W-1")).unwrap();

        assert_eq!(summary.frames.len(), 2);

        let first = &summary.frames[0];
        assert_eq!(first.logical_file.as_deref(), Some("MAIN LOG"));
        assert_eq!(first.frame, "60B");
        assert_eq!(first.channels, strings(&["DEPT", "GR"]));
        assert_eq!(first.units, strings(&["0.1 in", "gAPI"]));
        assert_eq!(first.index_units.as_deref(), Some("0.1 in"));
        assert_eq!(first.index_min, Some(1000.0));
        assert_eq!(first.well_name.as_deref(), Some("W-1"));

        let second = &summary.frames[1];
        assert_eq!(second.logical_file.as_deref(), Some("REPEAT"));
        assert_eq!(second.channels, strings(&["DEPTH"]));

        let json = serde_json::to_value(first).unwrap();
        assert!(json.get("units").is_none());
        assert_eq!(json["index_units"], "0.1 in");
    }

    #[test]
    fn keep_positions_of_undefined_channels() {
        let mut writer = Writer::new("PARTIAL");
        writer
            .file_header(1, "PARTIAL")
            .unwrap()
            .channels(&[("GR", "gAPI"), ("RHOB", "g/cm3")])
            .unwrap()
            .frame("MAIN", &["TDEP_INDEX", "GR", "NPHI", "RHOB"], (0.0, 1.0))
            .unwrap();
        let physical = PhysicalFile::parse(&writer.finish()).unwrap();

        let summary = FileFrames::from_physical(&physical, "p.dlis", None).unwrap();
        let frame = &summary.frames[0];

        assert_eq!(frame.channels, strings(&["DEPT", "GR", "NPHI", "RHOB"]));
        assert_eq!(frame.units, strings(&["", "gAPI", "", "g/cm3"]));
        assert_eq!(frame.index_units, None);
    }
}
