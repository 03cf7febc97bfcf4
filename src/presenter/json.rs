use super::Presenter;
use crate::{error::Error, report::SummaryRecord};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

/// Writes `value` as pretty JSON. The data lands in a sibling temporary
/// file first and is renamed over `path` once complete.
pub fn write_json(path: &Path, value: &impl Serialize) -> crate::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let file = File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| Error::io(&tmp, e))?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

pub struct JsonWriter(pub PathBuf);

impl Presenter for JsonWriter {
    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn std::error::Error>> {
        write_json(&self.0, &records)?;
        info!(path = %self.0.display(), records = records.len(), "wrote JSON report");
        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::presenter::testing::records;
    use tempfile::TempDir;

    #[test]
    fn write_record_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.json");

        JsonWriter(path.clone()).present(&records()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let rows = json.as_array().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["error"], true);
        assert_eq!(rows[0]["logical_files"], 0);
        assert_eq!(rows[1]["well"], "1-ABC-1-RJS");
        assert_eq!(rows[1]["size"], "3.0 MB");
        assert_eq!(rows[1]["logical_files"], 4);
        assert!(!dir.path().join("output.json.tmp").exists());
    }

    #[test]
    fn fail_on_unwritable_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("output.json");

        assert!(JsonWriter(path).present(&records()).is_err());
    }
}
