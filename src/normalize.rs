use camino::Utf8PathBuf;

use crate::config::{ResolvedConfig, RowSchema};
use crate::domain::{PrefixPolicy, SpecimenRecord};
use crate::error::HerbariumError;
use crate::source::RawRow;

/// Converts raw metadata rows into canonical `SpecimenRecord`s. Fail-fast:
/// a row that cannot be normalized aborts the batch before any filesystem
/// side effect.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    schema: RowSchema,
    common_prefix: Option<String>,
    prefix_policy: PrefixPolicy,
    name_delimiter: Option<String>,
}

impl RecordNormalizer {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self {
            schema: config.csv_schema.clone(),
            common_prefix: config.common_prefix.clone(),
            prefix_policy: config.prefix_policy,
            name_delimiter: config.name_delimiter.clone(),
        }
    }

    /// Normalizes every row, numbering rows from 1 for error context.
    pub fn normalize_all(&self, rows: &[RawRow]) -> Result<Vec<SpecimenRecord>, HerbariumError> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.normalize(row, idx + 1))
            .collect()
    }

    pub fn normalize(
        &self,
        row: &RawRow,
        row_number: usize,
    ) -> Result<SpecimenRecord, HerbariumError> {
        if row.fields.len() < self.schema.min_fields() {
            return Err(HerbariumError::MalformedRecord {
                row: row_number,
                reason: format!(
                    "expected at least {} fields, found {}",
                    self.schema.min_fields(),
                    row.fields.len()
                ),
            });
        }

        let display_name = self.extract_name(self.field(row, self.schema.name), row_number)?;
        let family = self.field(row, self.schema.family).to_string();
        if family.is_empty() {
            return Err(HerbariumError::MalformedRecord {
                row: row_number,
                reason: "family field is empty".to_string(),
            });
        }

        let raw_classification = self.field(row, self.schema.classification);
        let classification_id =
            raw_classification
                .parse::<i64>()
                .map_err(|_| HerbariumError::MalformedRecord {
                    row: row_number,
                    reason: format!("classification id {raw_classification:?} is not numeric"),
                })?;

        let relative_source_path =
            self.relative_path(self.field(row, self.schema.path), row_number)?;

        let original_filename = self.field(row, self.schema.filename).to_string();
        if original_filename.is_empty() {
            return Err(HerbariumError::MalformedRecord {
                row: row_number,
                reason: "filename field is empty".to_string(),
            });
        }

        Ok(SpecimenRecord {
            display_name,
            classification_id,
            family,
            relative_source_path,
            original_filename,
        })
    }

    fn field<'a>(&self, row: &'a RawRow, index: usize) -> &'a str {
        row.get(index).unwrap_or("").trim()
    }

    /// Composite name fields carry extra determination detail after a
    /// delimiter; the canonical name is the part before its first occurrence.
    fn extract_name(&self, raw: &str, row_number: usize) -> Result<String, HerbariumError> {
        let name = match &self.name_delimiter {
            Some(delimiter) => match raw.split_once(delimiter.as_str()) {
                Some((head, _)) => head.trim(),
                None => raw,
            },
            None => raw,
        };
        if name.is_empty() {
            return Err(HerbariumError::MalformedRecord {
                row: row_number,
                reason: format!("name field {raw:?} is empty after normalization"),
            });
        }
        Ok(name.to_string())
    }

    /// Strips the configured common prefix plus one leading separator, and
    /// normalizes backslashes (the exports originate on Windows). A raw path
    /// that lacks the configured prefix is a normalization error under the
    /// default policy; the `keep` policy uses it with all leading separators
    /// removed, so the result is never ambiguous with an absolute path.
    fn relative_path(&self, raw: &str, row_number: usize) -> Result<Utf8PathBuf, HerbariumError> {
        let relative = match &self.common_prefix {
            Some(prefix) => match raw.strip_prefix(prefix.as_str()) {
                Some(rest) => {
                    let mut chars = rest.chars();
                    match chars.next() {
                        Some('/') | Some('\\') => chars.as_str(),
                        _ => rest,
                    }
                }
                None => match self.prefix_policy {
                    PrefixPolicy::Reject => {
                        return Err(HerbariumError::MalformedRecord {
                            row: row_number,
                            reason: format!(
                                "source path {raw:?} does not start with configured prefix {prefix:?}"
                            ),
                        });
                    }
                    PrefixPolicy::Keep => raw.trim_start_matches(['/', '\\']),
                },
            },
            None => raw.trim_start_matches(['/', '\\']),
        };

        Ok(Utf8PathBuf::from(relative.replace('\\', "/")))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::config::{Config, ConfigLoader};

    fn normalizer(config: Config) -> RecordNormalizer {
        RecordNormalizer::new(&ConfigLoader::resolve_config(config).unwrap())
    }

    fn row(fields: &[&str]) -> RawRow {
        RawRow::new(fields.iter().map(|f| f.to_string()).collect())
    }

    #[test]
    fn normalize_plain_row() {
        let normalizer = normalizer(Config::default());
        let record = normalizer
            .normalize(&row(&["Rosa canina", "Rosaceae", "9", "sub", "img1.jpg"]), 1)
            .unwrap();
        assert_eq!(record.display_name, "Rosa canina");
        assert_eq!(record.family, "Rosaceae");
        assert_eq!(record.classification_id, 9);
        assert_eq!(record.relative_source_path, Utf8PathBuf::from("sub"));
        assert_eq!(record.original_filename, "img1.jpg");
    }

    #[test]
    fn trims_whitespace_from_fields() {
        let normalizer = normalizer(Config::default());
        let record = normalizer
            .normalize(
                &row(&["  Rosa canina ", " Rosaceae", "9", " sub ", " img1.jpg "]),
                1,
            )
            .unwrap();
        assert_eq!(record.display_name, "Rosa canina");
        assert_eq!(record.family, "Rosaceae");
        assert_eq!(record.original_filename, "img1.jpg");
    }

    #[test]
    fn extracts_name_before_delimiter() {
        let normalizer = normalizer(Config::default());
        let record = normalizer
            .normalize(
                &row(&["Rosa canina - det. 1987", "Rosaceae", "9", "sub", "a.jpg"]),
                1,
            )
            .unwrap();
        assert_eq!(record.display_name, "Rosa canina");
    }

    #[test]
    fn strips_common_prefix_and_leading_separator() {
        let config: Config =
            serde_json::from_str(r#"{ "common_prefix": "Pictures\\Field" }"#).unwrap();
        let normalizer = normalizer(config);
        let record = normalizer
            .normalize(
                &row(&[
                    "Rosa",
                    "Rosaceae",
                    "9",
                    "Pictures\\Field\\2019\\rosa",
                    "a.jpg",
                ]),
                1,
            )
            .unwrap();
        assert_eq!(record.relative_source_path, Utf8PathBuf::from("2019/rosa"));
    }

    #[test]
    fn missing_prefix_rejected_by_default() {
        let config: Config = serde_json::from_str(r#"{ "common_prefix": "Pictures" }"#).unwrap();
        let normalizer = normalizer(config);
        let err = normalizer
            .normalize(&row(&["Rosa", "Rosaceae", "9", "Elsewhere\\rosa", "a.jpg"]), 4)
            .unwrap_err();
        assert_matches!(err, HerbariumError::MalformedRecord { row: 4, .. });
    }

    #[test]
    fn missing_prefix_kept_under_keep_policy() {
        let config: Config = serde_json::from_str(
            r#"{ "common_prefix": "Pictures", "prefix_policy": "keep" }"#,
        )
        .unwrap();
        let normalizer = normalizer(config);
        let record = normalizer
            .normalize(
                &row(&["Rosa", "Rosaceae", "9", "\\Elsewhere\\rosa", "a.jpg"]),
                1,
            )
            .unwrap();
        assert_eq!(
            record.relative_source_path,
            Utf8PathBuf::from("Elsewhere/rosa")
        );
    }

    #[test]
    fn no_prefix_configured_uses_raw_path() {
        let normalizer = normalizer(Config::default());
        let record = normalizer
            .normalize(&row(&["Rosa", "Rosaceae", "9", "\\2019\\rosa", "a.jpg"]), 1)
            .unwrap();
        assert_eq!(record.relative_source_path, Utf8PathBuf::from("2019/rosa"));
    }

    #[test]
    fn short_row_is_malformed() {
        let normalizer = normalizer(Config::default());
        let err = normalizer
            .normalize(&row(&["Rosa", "Rosaceae", "9"]), 2)
            .unwrap_err();
        assert_matches!(err, HerbariumError::MalformedRecord { row: 2, .. });
    }

    #[test]
    fn non_numeric_classification_is_malformed() {
        let normalizer = normalizer(Config::default());
        let err = normalizer
            .normalize(&row(&["Rosa", "Rosaceae", "family", "sub", "a.jpg"]), 3)
            .unwrap_err();
        assert_matches!(err, HerbariumError::MalformedRecord { row: 3, .. });
    }

    #[test]
    fn empty_name_is_malformed() {
        let normalizer = normalizer(Config::default());
        let err = normalizer
            .normalize(&row(&[" - det. 1987", "Rosaceae", "9", "sub", "a.jpg"]), 1)
            .unwrap_err();
        assert_matches!(err, HerbariumError::MalformedRecord { row: 1, .. });
    }

    #[test]
    fn normalize_all_numbers_rows_from_one() {
        let normalizer = normalizer(Config::default());
        let rows = vec![
            row(&["Rosa", "Rosaceae", "9", "sub", "a.jpg"]),
            row(&["Rosa", "Rosaceae", "bad", "sub", "b.jpg"]),
        ];
        let err = normalizer.normalize_all(&rows).unwrap_err();
        assert_matches!(err, HerbariumError::MalformedRecord { row: 2, .. });
    }

    #[test]
    fn custom_schema_reorders_columns() {
        let config: Config = serde_json::from_str(
            r#"{ "csv_schema": { "classification": 0, "name": 1, "family": 2, "path": 3, "filename": 4 } }"#,
        )
        .unwrap();
        let normalizer = normalizer(config);
        let record = normalizer
            .normalize(&row(&["9", "Rosa", "Rosaceae", "sub", "a.jpg"]), 1)
            .unwrap();
        assert_eq!(record.classification_id, 9);
        assert_eq!(record.display_name, "Rosa");
    }
}
