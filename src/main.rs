mod app;
mod domain;
mod infra;
mod support;

use std::process::ExitCode;

fn main() -> ExitCode {
    app::run()
}
