//! yeeflow CLI - run a Yee-scheme FDTD network from the command line.
//!
//! ```bash
//! # 10x10x10 grid, 100 steps, default strategies
//! yeeflow 10 10 10 100
//!
//! # One thread per kernel over lock-free queues, no field dump
//! yeeflow 32 32 32 50 --partition per-kernel --lock-free --silent
//!
//! # Shared worker pool of 4 over growable queues, debug logging
//! yeeflow 16 16 16 20 --pool --workers 4 --dynamic -v
//! ```
//!
//! Final fields go to stdout, one line per component in the order
//! `Hx Hy Hz Ex Ey Ez`. Logs go to stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use yeeflow::kernels::Simulation;

mod args;

use args::Cli;

fn setup_logging(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let network = match cli.network() {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let out = match Simulation::run(network, cli.engine_config()) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        wall_ms = out.report.wall_time.as_millis() as u64,
        activations = out.report.total_activations(),
        units = out.report.units,
        "simulation complete"
    );

    let mut stdout = io::stdout().lock();
    for grid in out.grids.values() {
        if let Err(e) = writeln!(stdout, "{grid}") {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
