use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// One cataloged photo of a specimen, normalized from a raw metadata row.
/// Immutable once constructed; consumed exactly once by the batch driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecimenRecord {
    pub display_name: String,
    pub classification_id: i64,
    pub family: String,
    pub relative_source_path: Utf8PathBuf,
    pub original_filename: String,
}

/// Destination layout computed for a single record. Ephemeral; discarded
/// after the placement decision executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementPlan {
    pub family_folder_path: Utf8PathBuf,
    pub species_folder_path: Utf8PathBuf,
    pub destination_filename: String,
    pub sample_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementOutcome {
    Copied,
    SkippedExisting,
    SkippedMissing,
    Simulated,
}

impl PlacementOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementOutcome::Copied => "copied",
            PlacementOutcome::SkippedExisting => "skipped-existing",
            PlacementOutcome::SkippedMissing => "skipped-missing",
            PlacementOutcome::Simulated => "simulated",
        }
    }
}

/// Observed deployments disagree on whether the classification id gates the
/// family folder, so the policy is configuration rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyPolicy {
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixPolicy {
    Reject,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyRule {
    pub policy: FamilyPolicy,
    pub sentinel: i64,
    pub fallback_folder: String,
}

impl FamilyRule {
    pub fn accepts(&self, record: &SpecimenRecord) -> bool {
        match self.policy {
            FamilyPolicy::Strict => record.classification_id == self.sentinel,
            FamilyPolicy::Lenient => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(classification_id: i64) -> SpecimenRecord {
        SpecimenRecord {
            display_name: "Rosa canina".to_string(),
            classification_id,
            family: "Rosaceae".to_string(),
            relative_source_path: Utf8PathBuf::from("sub"),
            original_filename: "img1.jpg".to_string(),
        }
    }

    #[test]
    fn strict_rule_requires_sentinel() {
        let rule = FamilyRule {
            policy: FamilyPolicy::Strict,
            sentinel: 9,
            fallback_folder: "NoFamily".to_string(),
        };
        assert!(rule.accepts(&record(9)));
        assert!(!rule.accepts(&record(3)));
    }

    #[test]
    fn lenient_rule_accepts_any_id() {
        let rule = FamilyRule {
            policy: FamilyPolicy::Lenient,
            sentinel: 9,
            fallback_folder: "NoFamily".to_string(),
        };
        assert!(rule.accepts(&record(3)));
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(PlacementOutcome::Copied.as_str(), "copied");
        assert_eq!(
            PlacementOutcome::SkippedExisting.as_str(),
            "skipped-existing"
        );
    }
}
