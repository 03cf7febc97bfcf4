use super::Presenter;
use crate::report::SummaryRecord;
use std::{error::Error, path::PathBuf};
use tracing::info;

/// Writes the records as CSV with a header row.
pub struct CsvWriter(pub PathBuf);

impl Presenter for CsvWriter {
    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn Error>> {
        let mut writer = csv::Writer::from_path(&self.0)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        info!(path = %self.0.display(), records = records.len(), "wrote CSV report");
        Ok(())
    }
}
