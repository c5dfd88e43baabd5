use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use herbarium_reorganizer::app::{App, BatchReport, RunOptions};
use herbarium_reorganizer::catalog::CatalogSource;
use herbarium_reorganizer::config::{ConfigLoader, ResolvedConfig};
use herbarium_reorganizer::csv_source::CsvSource;
use herbarium_reorganizer::error::HerbariumError;
use herbarium_reorganizer::fs_util::SystemFileOps;
use herbarium_reorganizer::output::JsonOutput;
use herbarium_reorganizer::source::MetadataSource;

#[derive(Parser)]
#[command(name = "herbarium-ro")]
#[command(about = "Reorganizes herbarium specimen photos into a family/species folder tree")]
#[command(version, author)]
struct Cli {
    /// Folder from which to read the original pictures.
    #[arg(long, short)]
    source: Utf8PathBuf,

    /// Root of the reorganized tree (defaults to a folder in the user profile).
    #[arg(long, short)]
    destination: Option<Utf8PathBuf>,

    /// Delimited metadata export to read.
    #[arg(long, value_name = "FILE")]
    csv: Option<Utf8PathBuf>,

    /// SQLite specimen catalog to query.
    #[arg(long, value_name = "FILE")]
    catalog: Option<Utf8PathBuf>,

    /// JSON config file (defaults to herbarium-ro.json when present).
    #[arg(long)]
    config: Option<String>,

    /// Caps the processed-record count and raises log verbosity.
    #[arg(long)]
    debug: bool,

    /// Actually writes to disk; without it every copy is simulated.
    #[arg(long, short)]
    write: bool,

    /// Re-copies over existing destination files.
    #[arg(long, short)]
    overwrite: bool,

    /// Skips records whose source file is missing instead of aborting.
    #[arg(long)]
    skip: bool,

    /// Prints the final report as JSON.
    #[arg(long)]
    json: bool,

    /// Append-mode log file.
    #[arg(long, default_value = "herbarium-ro.log")]
    log_file: Utf8PathBuf,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(herbarium) = report.downcast_ref::<HerbariumError>() {
            return ExitCode::from(map_exit_code(herbarium));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HerbariumError) -> u8 {
    match error {
        HerbariumError::SourceNotFound(_) => 2,
        HerbariumError::ConfigRead(_) | HerbariumError::ConfigParse(_) => 2,
        HerbariumError::SourceQuery(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug, &cli.log_file)?;

    info!("******* Herbarium Photo Reorganizer *******");
    debug!("debug logging enabled");

    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;

    let destination_root = match &cli.destination {
        Some(path) => path.clone(),
        None => default_destination().into_diagnostic()?,
    };

    let options = RunOptions {
        source_root: cli.source.clone(),
        destination_root,
        dry_run: !cli.write,
        overwrite: cli.overwrite,
        skip_missing: cli.skip,
        debug_limit: cli.debug.then_some(config.debug_limit),
    };

    let report = match (&cli.csv, &cli.catalog) {
        (Some(path), None) => run_batch(CsvSource::new(path.clone()), config, &options)?,
        (None, Some(path)) => run_batch(CatalogSource::new(path.clone()), config, &options)?,
        _ => {
            return Err(miette::Report::msg(
                "exactly one of --csv or --catalog is required",
            ));
        }
    };

    if cli.json {
        JsonOutput::print_report(&report).into_diagnostic()?;
    } else {
        print_summary(&report, options.dry_run);
    }
    Ok(())
}

fn run_batch<S: MetadataSource>(
    source: S,
    config: ResolvedConfig,
    options: &RunOptions,
) -> miette::Result<BatchReport> {
    let app = App::new(source, SystemFileOps, config);
    app.run(options, &JsonOutput).into_diagnostic()
}

fn default_destination() -> Result<Utf8PathBuf, HerbariumError> {
    directories::BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().join("Herbarium")).ok())
        .ok_or_else(|| HerbariumError::Filesystem("unable to resolve home directory".to_string()))
}

fn init_logging(debug: bool, log_file: &Utf8PathBuf) -> miette::Result<()> {
    let filter = |debug: bool| {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }))
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file.as_std_path())
        .into_diagnostic()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter(debug)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(filter(debug)),
        )
        .init();

    Ok(())
}

fn print_summary(report: &BatchReport, dry_run: bool) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}herbarium-ro summary{reset}");
    if dry_run {
        println!("{yellow}simulation only; re-run with --write to copy{reset}");
    }
    println!("{green}processed: {}{reset}", report.total);
    println!("{green}copied: {}{reset}", report.copied);
    println!("{green}simulated: {}{reset}", report.simulated);
    println!("{yellow}skipped (existing): {}{reset}", report.skipped_existing);
    println!("{yellow}skipped (missing): {}{reset}", report.skipped_missing);
    println!("{cyan}elapsed: {} ms{reset}", report.elapsed_ms);
}
