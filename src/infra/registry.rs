use std::collections::HashMap;
use std::io;
use std::process::{Child, ExitStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crate::infra::process::{kill_group, terminate_group};
use crate::support::constants::WAIT_POLL_INTERVAL;

#[derive(Default)]
struct RegistryState {
    children: HashMap<usize, Child>,
    closed: bool,
}

/// Every live scanner process, keyed by task id, so shutdown can reach them.
///
/// A child stays registered until its exit status has been collected. Once
/// closed, the registry refuses new children.
#[derive(Clone, Default)]
pub(crate) struct ProcessRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ProcessRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` when the registry is closed; the child is then killed
    /// and reaped here.
    pub(crate) fn register(&self, id: usize, mut child: Child) -> bool {
        let mut state = self.lock();
        if state.closed {
            drop(state);
            kill_group(&mut child);
            let _ = child.wait();
            return false;
        }
        state.children.insert(id, child);
        true
    }

    pub(crate) fn try_wait(&self, id: usize) -> io::Result<Option<ExitStatus>> {
        let mut state = self.lock();
        let Some(child) = state.children.get_mut(&id) else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no process registered for task {id}"),
            ));
        };
        let status = child.try_wait()?;
        if status.is_some() {
            state.children.remove(&id);
        }
        Ok(status)
    }

    pub(crate) fn wait(&self, id: usize) -> io::Result<ExitStatus> {
        loop {
            if let Some(status) = self.try_wait(id)? {
                return Ok(status);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    pub(crate) fn terminate(&self, id: usize) {
        if let Some(child) = self.lock().children.get_mut(&id) {
            terminate_group(child);
        }
    }

    /// Closes the registry and SIGKILLs every registered process group.
    pub(crate) fn kill_all(&self) -> usize {
        let mut state = self.lock();
        state.closed = true;
        for child in state.children.values_mut() {
            kill_group(child);
        }
        state.children.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().children.len()
    }
}
