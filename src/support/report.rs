use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

use crate::domain::{TaskOutcome, TaskState};

#[derive(Debug, Serialize)]
pub(crate) struct RunReport {
    pub(crate) started_at: String,
    pub(crate) finished_at: String,
    pub(crate) cancelled: bool,
    pub(crate) tasks: Vec<TaskOutcome>,
}

impl RunReport {
    pub(crate) fn count(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|task| task.state == state).count()
    }

    pub(crate) fn failed_exits(&self) -> usize {
        self.tasks
            .iter()
            .filter(|task| matches!(task.exit_code, Some(code) if code != 0))
            .count()
    }

    pub(crate) fn write(&self, path: &Path) -> io::Result<()> {
        let payload = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        fs::write(path, payload)
    }
}
