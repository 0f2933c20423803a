use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error_chain;
use crate::domain::{ProcessingMode, ScanTask, TaskOutcome, TaskState};
use crate::infra::registry::ProcessRegistry;
use crate::infra::subprocess::{SpawnError, Subprocess};
use crate::support::cancel::CancellationFlag;
use crate::support::console::Console;
use crate::support::logging::strip_ansi_codes;
use crate::support::sink::Sink;
use crate::support::transform::{is_blank, transform_line};

const ABORTED: &str = "aborted due to shutdown";

struct PoolShared {
    cancel: CancellationFlag,
    registry: ProcessRegistry,
    queue: Mutex<Option<Sender<ScanTask>>>,
    idle: Receiver<()>,
    board: Mutex<BTreeMap<usize, (String, TaskState)>>,
    console: Console,
}

impl PoolShared {
    fn board(&self) -> MutexGuard<'_, BTreeMap<usize, (String, TaskState)>> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, task: &ScanTask, state: TaskState) {
        self.board().insert(task.id, (task.label.clone(), state));
    }
}

/// Handle on a running pool that other threads (the shutdown path) use to
/// stop intake, drain, and kill.
#[derive(Clone)]
pub(crate) struct PoolControl {
    shared: Arc<PoolShared>,
}

impl PoolControl {
    pub(crate) fn cancel_flag(&self) -> &CancellationFlag {
        &self.shared.cancel
    }

    /// Queues `task`. Returns `false` without queueing once the pool is
    /// cancelled or no longer accepting work.
    pub(crate) fn submit(&self, task: ScanTask) -> bool {
        let queue = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.shared.cancel.is_cancelled() {
            debug!(task = %task.label, "submission rejected, shutdown in progress");
            return false;
        }
        let Some(sender) = queue.as_ref() else {
            debug!(task = %task.label, "submission rejected, pool closed");
            return false;
        };
        self.shared.track(&task, TaskState::Pending);
        let id = task.id;
        if sender.send(task).is_err() {
            self.shared.board().remove(&id);
            return false;
        }
        true
    }

    pub(crate) fn close(&self) {
        let sender = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
    }

    /// Stops intake and waits up to `deadline` for every worker to finish.
    pub(crate) fn drain_and_wait(&self, deadline: Duration) -> bool {
        self.close();
        self.wait_idle(deadline)
    }

    pub(crate) fn wait_idle(&self, timeout: Duration) -> bool {
        match self.shared.idle.recv_timeout(timeout) {
            Err(RecvTimeoutError::Disconnected) => true,
            Ok(()) | Err(RecvTimeoutError::Timeout) => false,
        }
    }

    /// Kills every scanner still running and refuses to start new ones.
    pub(crate) fn force_kill(&self) -> usize {
        self.shared.registry.kill_all()
    }

    pub(crate) fn running_processes(&self) -> usize {
        self.shared.registry.len()
    }

    /// Labels of tasks that have not reached a terminal state.
    pub(crate) fn unfinished(&self) -> Vec<String> {
        self.shared
            .board()
            .values()
            .filter(|(_, state)| matches!(state, TaskState::Pending | TaskState::Running))
            .map(|(label, _)| label.clone())
            .collect()
    }
}

/// Fixed-size worker pool running one scanner per task.
pub(crate) struct Orchestrator {
    control: PoolControl,
    workers: Vec<thread::JoinHandle<()>>,
    outcomes: Receiver<TaskOutcome>,
}

impl Orchestrator {
    pub(crate) fn start(
        capacity: usize,
        cancel: CancellationFlag,
        console: Console,
    ) -> io::Result<Self> {
        let capacity = capacity.max(1);
        let (job_tx, job_rx) = unbounded::<ScanTask>();
        let (outcome_tx, outcome_rx) = unbounded();
        // Never sent on; disconnects once the last worker has exited.
        let (alive_tx, idle_rx) = bounded::<()>(0);
        let shared = Arc::new(PoolShared {
            cancel,
            registry: ProcessRegistry::new(),
            queue: Mutex::new(Some(job_tx)),
            idle: idle_rx,
            board: Mutex::new(BTreeMap::new()),
            console,
        });

        let mut workers = Vec::with_capacity(capacity);
        for index in 0..capacity {
            let jobs = job_rx.clone();
            let worker_shared = shared.clone();
            let outcomes = outcome_tx.clone();
            let alive = alive_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("scan-worker-{index}"))
                .spawn(move || worker_loop(jobs, worker_shared, outcomes, alive));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) if !workers.is_empty() => {
                    warn!(error = %err, workers = workers.len(), "worker pool smaller than requested");
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        debug!(workers = workers.len(), "worker pool started");

        Ok(Self {
            control: PoolControl { shared },
            workers,
            outcomes: outcome_rx,
        })
    }

    pub(crate) fn control(&self) -> PoolControl {
        self.control.clone()
    }

    pub(crate) fn submit(&self, task: ScanTask) -> bool {
        self.control.submit(task)
    }

    /// Closes intake and blocks until every submitted task has an outcome.
    pub(crate) fn wait(self) -> Vec<TaskOutcome> {
        self.control.close();
        for handle in self.workers {
            if handle.join().is_err() {
                error!("scan worker panicked");
            }
        }
        let mut outcomes: Vec<TaskOutcome> = self.outcomes.try_iter().collect();
        outcomes.sort_by_key(|outcome| outcome.id);
        outcomes
    }
}

fn worker_loop(
    jobs: Receiver<ScanTask>,
    shared: Arc<PoolShared>,
    outcomes: Sender<TaskOutcome>,
    _alive: Sender<()>,
) {
    for task in jobs.iter() {
        let outcome = if shared.cancel.is_cancelled() {
            info!(task = %task.label, "task abandoned before start, shutdown in progress");
            TaskOutcome::new(&task, TaskState::Aborted).with_error(ABORTED)
        } else {
            shared.track(&task, TaskState::Running);
            execute_task(&task, &shared)
        };
        shared.track(&task, outcome.state);
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}

fn execute_task(task: &ScanTask, shared: &PoolShared) -> TaskOutcome {
    let console = shared.console;
    console.rule();
    console.banner(&task.banner);
    info!(
        task = %task.label,
        service = %task.descriptor.service_name,
        output = %task.output_path.display(),
        threads = task.worker_allowance,
        "task started"
    );

    let sink = match Sink::create(&task.output_path, console) {
        Ok(sink) => sink,
        Err(err) => {
            let message = format!("cannot open {}: {err}", task.output_path.display());
            console.error(&message);
            error!(task = %task.label, error = %err, "output file unavailable");
            return TaskOutcome::new(task, TaskState::Completed).with_error(message);
        }
    };

    let mut process = match Subprocess::spawn(task.id, &task.command, &shared.registry) {
        Ok(process) => process,
        Err(SpawnError::Cancelled) => {
            let _ = sink.finish();
            info!(task = %task.label, "{ABORTED}");
            return TaskOutcome::new(task, TaskState::Aborted).with_error(ABORTED);
        }
        Err(err) => {
            let message = format!("{}: {}", task.label, error_chain(&err));
            console.error(&message);
            warn!(task = %task.label, error = %message, "scanner failed to start");
            let _ = sink.finish();
            return TaskOutcome::new(task, TaskState::Completed).with_error(message);
        }
    };

    let stdout = process.take_stdout();
    let stderr = process.take_stderr();
    let cancel = &shared.cancel;
    let sink_ref = &sink;
    let process_ref = &process;
    let mode = task.mode;
    let stopped_early = thread::scope(|scope| {
        let out = scope.spawn(move || match stdout {
            Some(lines) => pump_output(lines, mode, sink_ref, process_ref, cancel),
            None => false,
        });
        let err = scope.spawn(move || match stderr {
            Some(lines) => pump_errors(lines, sink_ref, process_ref, cancel),
            None => false,
        });
        let out = out.join().unwrap_or(true);
        let err = err.join().unwrap_or(true);
        out || err
    });

    let status = process.wait();
    let lines_written = match sink.finish() {
        Ok(lines) => lines,
        Err(err) => {
            warn!(task = %task.label, error = %err, "failed to flush output file");
            0
        }
    };

    let aborted = stopped_early || cancel.is_cancelled();
    let state = if aborted {
        TaskState::Aborted
    } else {
        TaskState::Completed
    };
    let mut outcome = TaskOutcome::new(task, state);
    outcome.lines_written = lines_written;
    match status {
        Ok(status) => {
            outcome.exit_code = status.code();
            if aborted {
                info!(task = %task.label, lines = lines_written, "{ABORTED}");
                outcome.error = Some(ABORTED.to_string());
            } else if !status.success() {
                let message = format!("{} exited with {status}", task.label);
                console.error(&message);
                warn!(task = %task.label, %status, "scanner exited unsuccessfully");
                outcome.error = Some(message);
            } else {
                info!(task = %task.label, lines = lines_written, "task completed");
            }
        }
        Err(err) => {
            warn!(task = %task.label, error = %err, "failed to collect exit status");
            outcome.error = Some(format!("failed to collect exit status: {err}"));
        }
    }
    outcome
}

/// Terminates the scanner's group so the other reader sees EOF instead of
/// waiting for the scanner to exit on its own.
fn stop_reading(process: &Subprocess) -> bool {
    process.terminate();
    true
}

/// Returns `true` when reading stopped because of cancellation.
fn pump_output<I>(
    lines: I,
    mode: ProcessingMode,
    sink: &Sink,
    process: &Subprocess,
    cancel: &CancellationFlag,
) -> bool
where
    I: Iterator<Item = String>,
{
    let mut write_failed = false;
    for raw in lines {
        if cancel.is_cancelled() {
            return stop_reading(process);
        }
        let line = strip_ansi_codes(raw.as_bytes());
        if is_blank(&line) {
            continue;
        }
        let Some(output) = transform_line(&line, mode) else {
            continue;
        };
        if let Err(err) = sink.emit(&output) {
            if !write_failed {
                warn!(output = %sink.path().display(), error = %err, "failed to write output line");
                write_failed = true;
            }
        }
    }
    false
}

fn pump_errors<I>(lines: I, sink: &Sink, process: &Subprocess, cancel: &CancellationFlag) -> bool
where
    I: Iterator<Item = String>,
{
    for raw in lines {
        if cancel.is_cancelled() {
            return stop_reading(process);
        }
        let line = strip_ansi_codes(raw.as_bytes());
        if is_blank(&line) {
            continue;
        }
        sink.report_error(&line);
    }
    false
}
