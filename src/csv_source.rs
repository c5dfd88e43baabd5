use camino::Utf8PathBuf;
use tracing::debug;

use crate::error::HerbariumError;
use crate::source::{MetadataSource, RawRow};

/// Reads a headerless delimited export. Field meaning comes from the
/// configured `RowSchema`, so variant exports with a different column order
/// only need a config change.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: Utf8PathBuf,
}

impl CsvSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl MetadataSource for CsvSource {
    fn rows(&self) -> Result<Vec<RawRow>, HerbariumError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(self.path.as_std_path())
            .map_err(|err| HerbariumError::SourceQuery(format!("open csv {}: {err}", self.path)))?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|err| {
                HerbariumError::SourceQuery(format!("read csv {}: {err}", self.path))
            })?;
            rows.push(RawRow::new(
                record.iter().map(|field| field.trim().to_string()).collect(),
            ));
        }

        debug!("csv export {} yielded {} rows", self.path, rows.len());
        Ok(rows)
    }
}
