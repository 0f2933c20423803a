use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::support::console::Console;

struct SinkState {
    writer: LineWriter<File>,
    lines: u64,
}

/// Output destination of one task: its own file plus the console mirror.
///
/// The lock covers a single `emit`, so the console and the file see the same
/// lines in the same order while other sinks proceed independently.
pub(crate) struct Sink {
    path: PathBuf,
    state: Mutex<SinkState>,
    console: Console,
}

impl Sink {
    pub(crate) fn create(path: &Path, console: Console) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(SinkState {
                writer: LineWriter::new(file),
                lines: 0,
            }),
            console,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn emit(&self, line: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.console.line(line);
        writeln!(state.writer, "{line}")?;
        state.lines += 1;
        Ok(())
    }

    pub(crate) fn report_error(&self, line: &str) {
        self.console.error(line);
    }

    /// Flushes and closes the file, returning the number of lines written.
    pub(crate) fn finish(self) -> io::Result<u64> {
        let mut state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
        state.writer.flush()?;
        Ok(state.lines)
    }
}
