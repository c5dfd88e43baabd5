use camino::Utf8Path;
use tracing::{debug, error, info};

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{PlacementOutcome, PlacementPlan, SpecimenRecord};
use crate::error::HerbariumError;
use crate::fs_util::FileOps;

#[derive(Debug, Clone, Copy)]
pub struct PlaceOptions {
    pub dry_run: bool,
    pub overwrite: bool,
    pub skip_missing: bool,
}

/// Executes the placement decision for one record: ensures the destination
/// folders, decides copy/skip/simulate, and delegates the byte copy to the
/// `FileOps` capability.
pub struct PlacementEngine<F: FileOps> {
    fs: F,
}

impl<F: FileOps> PlacementEngine<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub fn place(
        &self,
        plan: &PlacementPlan,
        record: &SpecimenRecord,
        source_root: &Utf8Path,
        options: &PlaceOptions,
        sink: &dyn ProgressSink,
    ) -> Result<PlacementOutcome, HerbariumError> {
        self.ensure_folder(&plan.family_folder_path, options.dry_run)?;
        self.ensure_folder(&plan.species_folder_path, options.dry_run)?;

        let destination = plan.species_folder_path.join(&plan.destination_filename);

        // Skip-existing is the idempotence mechanism enabling safe re-runs.
        if self.fs.exists(&destination) && !options.overwrite {
            info!("skipping, we already have a file at {destination}");
            sink.event(ProgressEvent {
                message: format!("phase=Place; skip-existing {destination}"),
            });
            return Ok(PlacementOutcome::SkippedExisting);
        }

        let source = source_root
            .join(&record.relative_source_path)
            .join(&record.original_filename);

        if options.dry_run {
            info!("write switch is off, simulating copy of {source} to {destination}");
            sink.event(ProgressEvent {
                message: format!("phase=Place; copy {source} -> {destination}"),
            });
            return Ok(PlacementOutcome::Simulated);
        }

        if !self.fs.exists(&source) {
            if options.skip_missing {
                error!("source file missing, skipping record: {source}");
                sink.event(ProgressEvent {
                    message: format!("phase=Place; skip-missing {source}"),
                });
                return Ok(PlacementOutcome::SkippedMissing);
            }
            return Err(HerbariumError::SourceNotFound(source));
        }

        info!("copying {source} to {destination}");
        sink.event(ProgressEvent {
            message: format!("phase=Place; copy {source} -> {destination}"),
        });
        self.fs.copy_file(&source, &destination)?;
        Ok(PlacementOutcome::Copied)
    }

    /// Root preparation for the batch driver; same dry-run semantics as the
    /// per-record folders.
    pub fn prepare_root(&self, root: &Utf8Path, dry_run: bool) -> Result<(), HerbariumError> {
        self.ensure_folder(root, dry_run)
    }

    fn ensure_folder(&self, path: &Utf8Path, dry_run: bool) -> Result<(), HerbariumError> {
        if dry_run {
            if !self.fs.exists(path) {
                debug!("would create folder {path}");
            }
            return Ok(());
        }
        if self.fs.ensure_dir(path)? {
            info!("created folder {path}");
        }
        Ok(())
    }
}
