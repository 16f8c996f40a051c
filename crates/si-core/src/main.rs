//! Sockinv - listening-socket inventory from lsof/ps sweep snapshots.
//!
//! Parses per-host `lsof` and `ps` snapshot files in parallel, joins the
//! two sources by (host, pid), and prints the resulting (host, port)
//! service table as JSON on stdout. Progress and warnings go to stderr.

use clap::Parser;
use si_common::{Error, Result};
use si_core::exit_codes::ExitCode;
use si_core::pipeline::{run_inventory, InventoryOptions};
use si_core::{acquire, logging, output};
use std::path::PathBuf;

/// Join lsof and ps sweep snapshots into a listening-socket table.
#[derive(Parser)]
#[command(name = "sockinv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing per-host snapshot files
    results_dir: PathBuf,

    /// Completion-marker suffix identifying finished acquisitions
    #[arg(long, default_value = acquire::DEFAULT_EXTENSION)]
    extension: String,

    /// Worker count (defaults to the number of logical CPUs)
    #[arg(long, env = "SI_WORKERS")]
    workers: Option<usize>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => std::process::exit(ExitCode::Clean.as_i32()),
        Err(err) => {
            // The log filter may silence the binary's own target, so the
            // terminal error bypasses tracing and goes straight to stderr.
            eprintln!("sockinv: {err}");
            std::process::exit(ExitCode::from_error(&err).as_i32());
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.workers == Some(0) {
        return Err(Error::Args("worker count must be at least 1".to_string()));
    }

    let report = run_inventory(&InventoryOptions {
        results_dir: cli.results_dir.clone(),
        extension: cli.extension.clone(),
        workers: cli.workers,
    })?;

    let rendered = output::render_services(&report.services, cli.pretty)?;
    println!("{rendered}");
    Ok(())
}
