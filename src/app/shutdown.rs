use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::app::orchestrator::PoolControl;
use crate::support::constants::{DRAIN_DEADLINE, KILL_GRACE};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ShutdownOutcome {
    AlreadyHandled,
    Drained,
    Forced { killed: usize },
    /// Workers did not settle even after the kill; the process has to exit.
    Stuck,
}

/// Turns a termination signal into cancel, drain, and if needed kill.
pub(crate) struct ShutdownCoordinator {
    control: PoolControl,
    exit_code: AtomicI32,
    deadline: Duration,
    grace: Duration,
}

impl ShutdownCoordinator {
    pub(crate) fn new(control: PoolControl) -> Self {
        Self::with_deadlines(control, DRAIN_DEADLINE, KILL_GRACE)
    }

    pub(crate) fn with_deadlines(control: PoolControl, deadline: Duration, grace: Duration) -> Self {
        Self {
            control,
            exit_code: AtomicI32::new(0),
            deadline,
            grace,
        }
    }

    /// Status the process should exit with, once a signal was handled.
    pub(crate) fn exit_status(&self) -> Option<i32> {
        match self.exit_code.load(Ordering::SeqCst) {
            0 => None,
            code => Some(code),
        }
    }

    pub(crate) fn handle_signal(&self, signal: i32) -> ShutdownOutcome {
        if !self.control.cancel_flag().cancel() {
            return ShutdownOutcome::AlreadyHandled;
        }
        self.exit_code.store(128 + signal, Ordering::SeqCst);
        warn!(signal, "received termination signal, initiating graceful shutdown");

        if self.control.drain_and_wait(self.deadline) {
            info!("all tasks stopped");
            return ShutdownOutcome::Drained;
        }

        let unfinished = self.control.unfinished();
        warn!(
            deadline_secs = self.deadline.as_secs_f64(),
            tasks = ?unfinished,
            "tasks still running after deadline, forcing shutdown"
        );
        let killed = self.control.force_kill();
        if self.control.wait_idle(self.grace) {
            return ShutdownOutcome::Forced { killed };
        }
        error!(
            running = self.control.running_processes(),
            "workers did not stop after forced kill"
        );
        ShutdownOutcome::Stuck
    }
}
