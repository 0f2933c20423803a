use std::io::{self, BufRead, BufReader, Read};
use std::process::{ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::infra::process::spawn_process_group;
use crate::infra::registry::ProcessRegistry;

#[derive(Debug, Error)]
pub(crate) enum SpawnError {
    #[error("command is empty")]
    Empty,
    #[error("invalid command line")]
    Parse(#[from] shell_words::ParseError),
    #[error("failed to start {program}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("not started, shutdown in progress")]
    Cancelled,
}

/// A running scanner with its output streams detached for independent
/// reading. The child itself lives in the registry.
pub(crate) struct Subprocess {
    id: usize,
    registry: ProcessRegistry,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl Subprocess {
    pub(crate) fn spawn(
        id: usize,
        command: &str,
        registry: &ProcessRegistry,
    ) -> Result<Self, SpawnError> {
        let argv = shell_words::split(command)?;
        let Some((program, args)) = argv.split_first() else {
            return Err(SpawnError::Empty);
        };
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = spawn_process_group(&mut cmd).map_err(|source| SpawnError::Io {
            program: program.clone(),
            source,
        })?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        if !registry.register(id, child) {
            return Err(SpawnError::Cancelled);
        }
        Ok(Self {
            id,
            registry: registry.clone(),
            stdout,
            stderr,
        })
    }

    pub(crate) fn take_stdout(&mut self) -> Option<OutputLines<ChildStdout>> {
        self.stdout.take().map(OutputLines::new)
    }

    pub(crate) fn take_stderr(&mut self) -> Option<OutputLines<ChildStderr>> {
        self.stderr.take().map(OutputLines::new)
    }

    pub(crate) fn terminate(&self) {
        self.registry.terminate(self.id);
    }

    /// Blocks until the process exits. There is no timeout here.
    pub(crate) fn wait(&self) -> io::Result<ExitStatus> {
        self.registry.wait(self.id)
    }
}

/// Lines of one stream as they are produced, without the line terminator.
/// Ends at EOF or on the first read error.
pub(crate) struct OutputLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: Read> OutputLines<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }
}

impl<R: Read> Iterator for OutputLines<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                Some(String::from_utf8_lossy(&self.buf).into_owned())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OutputLines, SpawnError, Subprocess};
    use crate::infra::registry::ProcessRegistry;

    #[test]
    fn output_lines_strip_terminators() {
        let lines: Vec<String> = OutputLines::new(&b"one\r\ntwo\n\nlast"[..]).collect();
        assert_eq!(lines, vec!["one", "two", "", "last"]);
    }

    #[test]
    fn output_lines_replace_invalid_utf8() {
        let lines: Vec<String> = OutputLines::new(&b"ok \xff\n"[..]).collect();
        assert_eq!(lines, vec!["ok \u{fffd}"]);
    }

    #[test]
    fn rejects_empty_command() {
        let registry = ProcessRegistry::new();
        assert!(matches!(
            Subprocess::spawn(0, "   ", &registry),
            Err(SpawnError::Empty)
        ));
    }

    #[test]
    fn rejects_unbalanced_quotes() {
        let registry = ProcessRegistry::new();
        assert!(matches!(
            Subprocess::spawn(0, "echo 'open", &registry),
            Err(SpawnError::Parse(_))
        ));
    }

    #[test]
    fn reports_missing_program() {
        let registry = ProcessRegistry::new();
        assert!(matches!(
            Subprocess::spawn(0, "scanfleet-definitely-missing-tool --help", &registry),
            Err(SpawnError::Io { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn streams_are_independent_and_exit_status_is_kept() {
        let registry = ProcessRegistry::new();
        let mut process = Subprocess::spawn(
            7,
            "sh -c 'echo out-1; echo err-1 >&2; echo out-2; exit 3'",
            &registry,
        )
        .expect("spawn");
        let stdout: Vec<String> = process.take_stdout().expect("stdout").collect();
        let stderr: Vec<String> = process.take_stderr().expect("stderr").collect();
        let status = process.wait().expect("wait");
        assert_eq!(stdout, vec!["out-1", "out-2"]);
        assert_eq!(stderr, vec!["err-1"]);
        assert_eq!(status.code(), Some(3));
        assert_eq!(registry.len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn closed_registry_refuses_new_processes() {
        let registry = ProcessRegistry::new();
        registry.kill_all();
        assert!(matches!(
            Subprocess::spawn(1, "sleep 5", &registry),
            Err(SpawnError::Cancelled)
        ));
        assert_eq!(registry.len(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn kill_all_ends_blocked_processes() {
        let registry = ProcessRegistry::new();
        let mut process = Subprocess::spawn(2, "sh -c 'sleep 30'", &registry).expect("spawn");
        let stdout = process.take_stdout().expect("stdout");
        assert_eq!(registry.kill_all(), 1);
        assert_eq!(stdout.count(), 0);
        let status = process.wait().expect("wait");
        assert!(!status.success());
    }
}
