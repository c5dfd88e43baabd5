use std::collections::HashSet;
use std::time::Instant;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ResolvedConfig;
use crate::domain::{PlacementOutcome, SpecimenRecord};
use crate::error::HerbariumError;
use crate::fs_util::FileOps;
use crate::normalize::RecordNormalizer;
use crate::place::{PlaceOptions, PlacementEngine};
use crate::resolve::resolve;
use crate::sequence::SequenceTracker;
use crate::source::MetadataSource;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source_root: Utf8PathBuf,
    pub destination_root: Utf8PathBuf,
    pub dry_run: bool,
    pub overwrite: bool,
    pub skip_missing: bool,
    /// Truncates the batch after this many records without error; set by the
    /// CLI's debug mode for manual verification runs.
    pub debug_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub copied: usize,
    pub skipped_existing: usize,
    pub skipped_missing: usize,
    pub simulated: usize,
    pub started_at: String,
    pub elapsed_ms: u64,
}

impl BatchReport {
    fn new(started_at: String) -> Self {
        Self {
            total: 0,
            copied: 0,
            skipped_existing: 0,
            skipped_missing: 0,
            simulated: 0,
            started_at,
            elapsed_ms: 0,
        }
    }

    fn tally(&mut self, outcome: PlacementOutcome) {
        self.total += 1;
        match outcome {
            PlacementOutcome::Copied => self.copied += 1,
            PlacementOutcome::SkippedExisting => self.skipped_existing += 1,
            PlacementOutcome::SkippedMissing => self.skipped_missing += 1,
            PlacementOutcome::Simulated => self.simulated += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<S: MetadataSource, F: FileOps> {
    source: S,
    engine: PlacementEngine<F>,
    config: ResolvedConfig,
}

impl<S: MetadataSource, F: FileOps> App<S, F> {
    pub fn new(source: S, fs: F, config: ResolvedConfig) -> Self {
        Self {
            source,
            engine: PlacementEngine::new(fs),
            config,
        }
    }

    /// Runs the full batch: acquire rows, normalize fail-fast, then place
    /// records strictly in order. Fatal placement errors abort the remaining
    /// records; side effects already applied stay on disk.
    pub fn run(
        &self,
        options: &RunOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BatchReport, HerbariumError> {
        info!("organizing specimen photos");
        sink.event(ProgressEvent {
            message: "phase=Acquire; reading metadata rows".to_string(),
        });

        let rows = self.source.rows()?;
        let normalizer = RecordNormalizer::new(&self.config);
        let mut records = normalizer.normalize_all(&rows)?;

        if self.config.auto_sort {
            records.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        } else {
            warn_if_unsorted(&records);
        }

        let total = records.len();
        info!("{total} records to place");

        self.engine
            .prepare_root(&options.destination_root, options.dry_run)?;

        let place_options = PlaceOptions {
            dry_run: options.dry_run,
            overwrite: options.overwrite,
            skip_missing: options.skip_missing,
        };

        let clock = Instant::now();
        let mut report = BatchReport::new(chrono::Local::now().to_rfc3339());
        let mut tracker = SequenceTracker::new();

        for (idx, record) in records.iter().enumerate() {
            let number = idx + 1;
            info!("progress: {number}/{total}");
            sink.event(ProgressEvent {
                message: format!("phase=Place; record {number}/{total}"),
            });

            let sample_index = tracker.next(&record.display_name);
            let plan = resolve(
                record,
                sample_index,
                &options.destination_root,
                &self.config.family_rule,
            );
            let outcome =
                self.engine
                    .place(&plan, record, &options.source_root, &place_options, sink)?;
            report.tally(outcome);

            if let Some(limit) = options.debug_limit
                && number >= limit
            {
                info!("terminating early after {limit} records (debug mode)");
                break;
            }
        }

        report.elapsed_ms = clock.elapsed().as_millis() as u64;
        info!("DONE");
        sink.event(ProgressEvent {
            message: "phase=Done".to_string(),
        });
        Ok(report)
    }
}

/// The sample counter only numbers correctly when records arrive grouped by
/// display name; callers own the ordering. This flags silent mis-numbering
/// when a name recurs after a different name intervened.
fn warn_if_unsorted(records: &[SpecimenRecord]) {
    let mut seen = HashSet::new();
    let mut last: Option<&str> = None;
    for record in records {
        let name = record.display_name.as_str();
        if last != Some(name) {
            if !seen.insert(name) {
                warn!(
                    "records are not grouped by name ({name} reappears); sample numbering restarts at 1 for the repeat run"
                );
                return;
            }
            last = Some(name);
        }
    }
}
