use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use directories::BaseDirs;
use miette::IntoDiagnostic;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crunchy_downloader::app::{App, RunOptions, RunSummary};
use crunchy_downloader::archive::ArchiveHttpClient;
use crunchy_downloader::cancel::{self, CancelToken};
use crunchy_downloader::config::ConfigLoader;
use crunchy_downloader::domain::AudioFilter;
use crunchy_downloader::error::CrunchyError;
use crunchy_downloader::store::IdentifierStore;

#[derive(Parser)]
#[command(name = "crunchy")]
#[command(about = "Download the latest shows from Archive.org for configured collections")]
#[command(version, author)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: Utf8PathBuf,

    /// Base directory for downloads
    #[arg(short, long, default_value = "~/Music/live-music")]
    download_dir: Utf8PathBuf,

    /// Maximum shows to download per collection
    #[arg(short = 'n', long, default_value_t = 1)]
    max_shows: usize,

    /// Number of parallel download workers
    #[arg(short, long, default_value_t = 2)]
    workers: usize,

    /// Identifier store file (defaults to a per-user data directory)
    #[arg(long)]
    store_file: Option<Utf8PathBuf>,

    /// Directory for per-run log files
    #[arg(long)]
    log_dir: Option<Utf8PathBuf>,

    /// Audio file extension that counts as a completed download
    #[arg(long, default_value = "mp3")]
    audio_ext: String,

    /// Report candidates without downloading or updating the store
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(summary) => {
            if summary.interrupted {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> miette::Result<RunSummary> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_dir.as_deref())?;

    let collections = ConfigLoader::resolve(&cli.config).into_diagnostic()?;
    tracing::info!(
        config = %cli.config,
        collections = collections.len(),
        "loaded configuration"
    );

    let download_root = expand_home(&cli.download_dir).into_diagnostic()?;
    let store_path = match cli.store_file {
        Some(path) => expand_home(&path).into_diagnostic()?,
        None => IdentifierStore::default_path().into_diagnostic()?,
    };

    let store = IdentifierStore::load(store_path);
    let client = ArchiveHttpClient::new().into_diagnostic()?;

    let cancel = CancelToken::new();
    cancel::install_sigint(&cancel);

    let options = RunOptions {
        download_root,
        max_shows: cli.max_shows,
        workers: cli.workers,
        retries: 3,
        dry_run: cli.dry_run,
        audio_filter: AudioFilter::new(&cli.audio_ext),
    };

    let mut app = App::new(store, client);
    let summary = app.run(&collections, &options, &cancel);
    print_summary(&summary);
    Ok(summary)
}

fn init_logging(verbose: bool, log_dir: Option<&Utf8Path>) -> miette::Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir.as_std_path()).into_diagnostic()?;
            let file_name = format!(
                "crunchy_{}.log",
                chrono::Utc::now().format("%Y%m%d_%H%M%S")
            );
            let file = File::create(dir.join(file_name).as_std_path()).into_diagnostic()?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
        }
    }
    Ok(())
}

fn expand_home(path: &Utf8Path) -> Result<Utf8PathBuf, CrunchyError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_owned());
    };
    let home = BaseDirs::new()
        .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().to_path_buf()).ok())
        .ok_or_else(|| {
            CrunchyError::Filesystem("unable to resolve home directory".to_string())
        })?;
    Ok(home.join(rest))
}

fn print_summary(summary: &RunSummary) {
    println!("Download summary:");
    println!("  discovered: {}", summary.discovered);
    println!("  succeeded:  {}", summary.succeeded);
    println!("  skipped:    {}", summary.skipped);
    println!("  failed:     {}", summary.failed);
    println!("  elapsed:    {:.1}s", summary.duration.as_secs_f64());
    if summary.failed > 0 {
        println!("  {} downloads failed, check the log for details", summary.failed);
    }
    if summary.interrupted {
        println!("  run was interrupted before completion");
    }
}
