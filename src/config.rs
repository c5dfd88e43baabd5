use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{FamilyPolicy, FamilyRule, PrefixPolicy};
use crate::error::HerbariumError;

pub const DEFAULT_CONFIG_FILE: &str = "herbarium-ro.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub common_prefix: Option<String>,
    #[serde(default)]
    pub prefix_policy: Option<PrefixPolicy>,
    #[serde(default)]
    pub family_policy: Option<FamilyPolicy>,
    #[serde(default)]
    pub family_sentinel: Option<i64>,
    #[serde(default)]
    pub fallback_folder: Option<String>,
    #[serde(default)]
    pub name_delimiter: Option<String>,
    #[serde(default)]
    pub csv_schema: Option<RowSchema>,
    #[serde(default)]
    pub debug_limit: Option<usize>,
    #[serde(default)]
    pub auto_sort: Option<bool>,
}

/// Column indexes assigning meaning to the fields of a raw row. The default
/// matches the canonical export order; CSV variants with a different column
/// layout override it per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RowSchema {
    pub name: usize,
    pub family: usize,
    pub classification: usize,
    pub path: usize,
    pub filename: usize,
}

impl RowSchema {
    pub fn min_fields(&self) -> usize {
        [
            self.name,
            self.family,
            self.classification,
            self.path,
            self.filename,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

impl Default for RowSchema {
    fn default() -> Self {
        Self {
            name: 0,
            family: 1,
            classification: 2,
            path: 3,
            filename: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub common_prefix: Option<String>,
    pub prefix_policy: PrefixPolicy,
    pub family_rule: FamilyRule,
    pub name_delimiter: Option<String>,
    pub csv_schema: RowSchema,
    pub debug_limit: usize,
    pub auto_sort: bool,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves configuration from an explicit path, from the default config
    /// file when present, or from built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HerbariumError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HerbariumError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HerbariumError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HerbariumError> {
        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            common_prefix: config.common_prefix.filter(|prefix| !prefix.is_empty()),
            prefix_policy: config.prefix_policy.unwrap_or(PrefixPolicy::Reject),
            family_rule: FamilyRule {
                policy: config.family_policy.unwrap_or(FamilyPolicy::Strict),
                sentinel: config.family_sentinel.unwrap_or(9),
                fallback_folder: config
                    .fallback_folder
                    .unwrap_or_else(|| "NoFamily".to_string()),
            },
            name_delimiter: match config.name_delimiter {
                Some(delimiter) if delimiter.is_empty() => None,
                Some(delimiter) => Some(delimiter),
                None => Some("-".to_string()),
            },
            csv_schema: config.csv_schema.unwrap_or_default(),
            debug_limit: config.debug_limit.unwrap_or(30),
            auto_sort: config.auto_sort.unwrap_or(false),
        })
    }
}
