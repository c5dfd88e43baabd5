use camino::Utf8Path;
use tracing::warn;

use crate::domain::{FamilyRule, PlacementPlan, SpecimenRecord};

/// Computes the destination layout for one record. Deterministic and free of
/// filesystem I/O; the only side effect is the warning event for records the
/// strict family policy rejects.
pub fn resolve(
    record: &SpecimenRecord,
    sample_index: u32,
    destination_root: &Utf8Path,
    rule: &FamilyRule,
) -> PlacementPlan {
    let family_folder_path = if rule.accepts(record) {
        destination_root.join(&record.family)
    } else {
        warn!(
            "{} seems not to be a family because it has an id of {}, placing it under {}",
            record.display_name, record.classification_id, rule.fallback_folder
        );
        destination_root.join(&rule.fallback_folder)
    };

    let species_folder_path = family_folder_path.join(&record.display_name);
    let destination_filename = format!(
        "{} - {}{}",
        record.display_name,
        sample_index,
        extension_of(&record.original_filename)
    );

    PlacementPlan {
        family_folder_path,
        species_folder_path,
        destination_filename,
        sample_index,
    }
}

/// Extension including the leading dot, exact case preserved; empty when the
/// filename has none.
fn extension_of(filename: &str) -> String {
    Utf8Path::new(filename)
        .extension()
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}
