//! mirror - Command-line interface for the sync engine.
//!
//! A thin front end for manual runs. It maps arguments onto `SyncOptions`
//! and prints per-entry lines and a summary to stderr.

use clap::Parser;
use log::debug;
use mirror::{
    ChecksumAlgorithm, EntryOutcome, EntryState, FileEntry, SyncError, SyncObserver, SyncOptions,
    SyncReport, Syncer, DEFAULT_PORT,
};
use std::path::PathBuf;
use std::time::Instant;

/// mirror - one-way file synchronization, locally or over SSH
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(version)]
#[command(about = "Mirror a file or directory to a local or remote destination")]
struct Args {
    /// Source location: PATH or [USER@]HOST:PATH
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Destination location: PATH or [USER@]HOST:PATH
    #[arg(value_name = "DESTINATION")]
    destination: String,

    /// SSH port of the remote endpoint
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Login name for the remote endpoint
    #[arg(short, long, env = "MIRROR_SSH_USER")]
    username: Option<String>,

    /// Password for the remote endpoint (takes precedence over keys)
    #[arg(short = 'P', long, env = "MIRROR_SSH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Private key file for the remote endpoint
    #[arg(short, long, value_name = "PATH", env = "MIRROR_SSH_KEY")]
    key_file: Option<PathBuf>,

    /// Compare file sizes instead of content hashes
    #[arg(long)]
    size_only: bool,

    /// Report what would change without touching the destination
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Content hash: md5, sha256 or blake3
    #[arg(long, value_name = "ALGORITHM", default_value = "md5")]
    hash: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// CLI implementation of SyncObserver
struct CliObserver {
    verbose: bool,
    start_time: Instant,
}

impl CliObserver {
    fn new(verbose: bool) -> Self {
        CliObserver {
            verbose,
            start_time: Instant::now(),
        }
    }

    fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let mins = secs / 60;
        let secs = secs % 60;

        if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}.{:01}s", secs, elapsed.subsec_millis() / 100)
        }
    }
}

impl SyncObserver for CliObserver {
    fn on_sync_started(&self, report: &SyncReport) {
        eprintln!("Syncing {} -> {}", report.source, report.destination);
        if self.verbose {
            eprintln!("  Destination root: {}", report.destination_root);
            eprintln!("  Run: {}", report.id);
        }
        if report.dry_run {
            eprintln!("  Dry run: nothing will be written");
        }
    }

    fn on_entry_started(&self, entry: &FileEntry) {
        if self.verbose {
            eprintln!("  checking {}", entry.relative);
        }
    }

    fn on_entry_completed(&self, outcome: &EntryOutcome) {
        let label = match outcome.state {
            EntryState::Done => "sent",
            EntryState::Planned => "would send",
            EntryState::Skipped => "same",
            EntryState::Failed => "FAILED",
            EntryState::Pending => return,
        };

        if outcome.state == EntryState::Failed {
            eprintln!(
                "  {}: {} ({})",
                label,
                outcome.entry.relative,
                outcome.error_message.as_deref().unwrap_or("unknown error")
            );
        } else if self.verbose || outcome.state != EntryState::Skipped {
            match outcome.decision {
                Some(decision) => eprintln!("  {}: {} ({})", label, outcome.entry.relative, decision),
                None => eprintln!("  {}: {}", label, outcome.entry.relative),
            }
        }
    }

    fn on_sync_completed(&self, report: &SyncReport) {
        eprintln!();
        eprintln!(
            "Summary: {} created, {} updated, {} unchanged, {} failed",
            report.created(),
            report.updated(),
            report.skipped(),
            report.failed()
        );
        eprintln!("Bytes sent: {}", Self::format_bytes(report.bytes_transferred()));
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));
    }
}

/// Parse arguments, install the logger, then run the sync
fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Map arguments onto options and run one sync - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    let algorithm: ChecksumAlgorithm = args.hash.parse()?;

    let mut options = SyncOptions::new()
        .port(args.port)
        .size_only(args.size_only)
        .recursive(args.recursive)
        .dry_run(args.dry_run)
        .checksum_algorithm(algorithm);
    options.username = args.username.clone();
    options.password = args.password.clone();
    options.key_file = args.key_file.clone();

    debug!(
        "options: port={} user={:?} password={} key_file={:?} recursive={} dry_run={} comparison={}",
        options.port,
        options.username,
        if options.password.is_some() { "set" } else { "unset" },
        options.key_file,
        options.recursive,
        options.dry_run,
        if options.compare_by_size_only {
            "size".to_string()
        } else {
            options.checksum_algorithm.to_string()
        }
    );

    let observer = CliObserver::new(args.verbose);
    let result = Syncer::new(&options)
        .with_observer(&observer)
        .sync(&args.source, &args.destination);

    match result {
        Ok(_) => Ok(()),
        Err(SyncError::Incomplete { failed, attempted, .. }) => Err(format!(
            "{} of {} entries failed to sync",
            failed, attempted
        )),
        Err(e) => Err(e.to_string()),
    }
}
