mod orchestrator;
mod plan;
mod shutdown;


use clap::Parser;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::TaskState;
use crate::infra::preflight::Capabilities;
use crate::support::args::{Cli, Mode};
use crate::support::cancel::CancellationFlag;
use crate::support::console::Console;
use crate::support::constants::BIN_NAME;
use crate::support::logging::init_logging;
use crate::support::report::RunReport;
use crate::support::run::timestamp_now;
use crate::support::services::{load_services, InventoryError};

use orchestrator::Orchestrator;
use plan::{describe_output_dir, plan_bust, plan_snmp, PlanSettings};
use shutdown::{ShutdownCoordinator, ShutdownOutcome};

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    match run_inner(cli) {
        Ok(code) => exit_code_from_i32(code),
        Err(err) => {
            eprintln!("[{BIN_NAME}] {}", error_chain(&err));
            ExitCode::from(err.exit_code())
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("budget must be at least 1")]
    InvalidBudget,
    #[error("output directory {path} does not exist or is not a directory")]
    OutputDir { path: PathBuf },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error("failed to start worker pool")]
    Pool(#[source] io::Error),
}

impl AppError {
    fn exit_code(&self) -> u8 {
        match self {
            AppError::Pool(_) => 1,
            _ => 2,
        }
    }
}

/// `err` followed by each of its sources, separated by `: `.
pub(crate) fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn run_inner(cli: Cli) -> Result<i32, AppError> {
    if cli.budget == 0 {
        return Err(AppError::InvalidBudget);
    }
    if !cli.output_dir.is_dir() {
        return Err(AppError::OutputDir {
            path: cli.output_dir.clone(),
        });
    }
    let settings = PlanSettings {
        budget: cli.budget,
        output_dir: cli.output_dir.clone(),
        skip_existing: cli.skip_existing,
    };

    let tasks = match &cli.command {
        Mode::Bust(args) => {
            let services = load_services(&args.services)?;
            info!(
                inventory = %args.services.display(),
                services = services.len(),
                "service inventory loaded"
            );
            plan_bust(&services, args, &settings)
        }
        Mode::Snmp(args) => {
            let capabilities = if args.assume_mibs {
                Capabilities::all()
            } else {
                Capabilities::detect()
            };
            plan_snmp(args, capabilities, &settings)
        }
    };
    if tasks.is_empty() {
        warn!("nothing to scan");
    }

    let console = Console::detect(!cli.no_color);
    let started_at = timestamp_now();
    let capacity = cli.budget.min(tasks.len()).max(1);
    let orchestrator =
        Orchestrator::start(capacity, CancellationFlag::new(), console).map_err(AppError::Pool)?;
    let control = orchestrator.control();
    let coordinator = Arc::new(ShutdownCoordinator::new(control.clone()));
    setup_signals(&coordinator);

    info!(
        tasks = tasks.len(),
        workers = capacity,
        output_dir = %describe_output_dir(&cli.output_dir),
        "dispatching scans"
    );
    for task in tasks {
        if !orchestrator.submit(task) {
            break;
        }
    }

    let outcomes = orchestrator.wait();
    let report = RunReport {
        started_at,
        finished_at: timestamp_now(),
        cancelled: control.cancel_flag().is_cancelled(),
        tasks: outcomes,
    };
    summarize(&report);
    if let Some(path) = cli.report.as_deref() {
        match report.write(path) {
            Ok(()) => info!(report = %path.display(), "run report written"),
            Err(err) => warn!(report = %path.display(), error = %err, "failed to write run report"),
        }
    }

    Ok(coordinator.exit_status().unwrap_or(0))
}

fn setup_signals(coordinator: &Arc<ShutdownCoordinator>) {
    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            let coordinator = coordinator.clone();
            thread::spawn(move || {
                for signal in signals.forever() {
                    if coordinator.handle_signal(signal) == ShutdownOutcome::Stuck {
                        std::process::exit(coordinator.exit_status().unwrap_or(1));
                    }
                }
            });
        }
        Err(err) => warn!(error = %err, "signal handlers unavailable"),
    }
}

fn summarize(report: &RunReport) {
    let completed = report.count(TaskState::Completed);
    let aborted = report.count(TaskState::Aborted);
    let failed_exits = report.failed_exits();
    if report.cancelled {
        warn!(completed, aborted, failed_exits, "run stopped by shutdown");
    } else if failed_exits > 0 {
        warn!(completed, failed_exits, "all tasks finished, some scanners exited unsuccessfully");
    } else {
        info!(completed, "all tasks completed successfully");
    }
}

fn exit_code_from_i32(code: i32) -> ExitCode {
    let code = u8::try_from(code).unwrap_or(1);
    ExitCode::from(code)
}

#[cfg(test)]
mod tests {
    use super::{error_chain, AppError};
    use crate::support::services::InventoryError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn chain_includes_every_source() {
        let err = AppError::Inventory(InventoryError::Read {
            path: PathBuf::from("hosts.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        });
        let message = error_chain(&err);
        assert!(message.contains("hosts.json"), "{message}");
        assert!(message.ends_with(": gone"), "{message}");
    }

    #[test]
    fn input_errors_exit_with_two() {
        assert_eq!(AppError::InvalidBudget.exit_code(), 2);
        assert_eq!(AppError::Pool(io::Error::other("no threads")).exit_code(), 1);
    }
}
