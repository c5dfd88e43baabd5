use camino::Utf8PathBuf;
use rusqlite::Connection;
use tracing::info;

use crate::error::HerbariumError;
use crate::source::{MetadataSource, RawRow};

/// One determination row per attached photo object, ordered by name so the
/// per-species sample counter numbers contiguous runs. Columns come back in
/// the canonical order the default `RowSchema` expects.
const SELECT_SPECIMEN_PHOTOS: &str = "
    SELECT d.name,
        d.family,
        d.classification_id,
        o.stored_path,
        o.object_name
    FROM determination AS d
        INNER JOIN specimen_object AS r ON r.specimen_id = d.specimen_id
        INNER JOIN external_object AS o ON o.object_id = r.object_id
    ORDER BY d.name;
";

/// Queries a SQLite specimen catalog for photo metadata.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    path: Utf8PathBuf,
}

impl CatalogSource {
    pub fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }
}

impl MetadataSource for CatalogSource {
    fn rows(&self) -> Result<Vec<RawRow>, HerbariumError> {
        let conn = Connection::open(self.path.as_std_path()).map_err(|err| {
            HerbariumError::SourceQuery(format!("open catalog {}: {err}", self.path))
        })?;

        let mut statement = conn
            .prepare(SELECT_SPECIMEN_PHOTOS)
            .map_err(|err| HerbariumError::SourceQuery(err.to_string()))?;

        let mapped = statement
            .query_map([], |row| {
                Ok(RawRow::new(vec![
                    row.get::<_, String>(0)?.trim().to_string(),
                    row.get::<_, String>(1)?.trim().to_string(),
                    row.get::<_, i64>(2)?.to_string(),
                    row.get::<_, String>(3)?.trim().to_string(),
                    row.get::<_, String>(4)?.trim().to_string(),
                ]))
            })
            .map_err(|err| HerbariumError::SourceQuery(err.to_string()))?;

        let rows = mapped
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| HerbariumError::SourceQuery(err.to_string()))?;

        info!("catalog query returned {} rows", rows.len());
        Ok(rows)
    }
}
