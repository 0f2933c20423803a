use std::io::{self, IsTerminal, Write};

const GREEN: u8 = 32;
const YELLOW: u8 = 33;
const CYAN: u8 = 96;
const RED: u8 = 91;

/// Operator-facing output: mirrored task lines on stdout, tagged subprocess
/// errors on stderr.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Console {
    color: bool,
}

impl Console {
    pub(crate) fn detect(enabled: bool) -> Self {
        Self {
            color: enabled && io::stdout().is_terminal(),
        }
    }

    #[cfg(test)]
    pub(crate) fn plain() -> Self {
        Self { color: false }
    }

    pub(crate) fn line(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.paint(GREEN, text));
    }

    pub(crate) fn banner(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.paint(CYAN, text));
    }

    pub(crate) fn rule(&self) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.paint(YELLOW, &"=".repeat(82)));
    }

    pub(crate) fn error(&self, text: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", self.paint(RED, &format!("ERROR: {text}")));
    }

    fn paint(&self, code: u8, text: &str) -> String {
        if self.color {
            format!("\u{1b}[{code}m{text}\u{1b}[0m")
        } else {
            text.to_string()
        }
    }
}
