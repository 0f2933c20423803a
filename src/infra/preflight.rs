use tracing::debug;

use crate::infra::process::{command_exists, run_output};
use crate::support::constants::MIB_PACKAGE;

/// Optional capabilities of the local machine that decide which task
/// categories can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Capabilities {
    pub(crate) mib_definitions: bool,
}

impl Capabilities {
    pub(crate) fn detect() -> Self {
        let mib_definitions = package_installed(MIB_PACKAGE);
        debug!(mib_definitions, "pre-flight capabilities detected");
        Self { mib_definitions }
    }

    pub(crate) fn all() -> Self {
        Self {
            mib_definitions: true,
        }
    }
}

fn package_installed(name: &str) -> bool {
    if !command_exists("dpkg-query") {
        return false;
    }
    match run_output(&["dpkg-query", "-W", "-f=${Status}", name]) {
        Ok(output) => {
            output.status.success() && is_installed_status(&String::from_utf8_lossy(&output.stdout))
        }
        Err(_) => false,
    }
}

fn is_installed_status(status: &str) -> bool {
    status.trim().ends_with("install ok installed")
}

#[cfg(test)]
mod tests {
    use super::is_installed_status;

    #[test]
    fn recognizes_installed_status() {
        assert!(is_installed_status("install ok installed"));
        assert!(!is_installed_status("deinstall ok config-files"));
        assert!(!is_installed_status(""));
    }
}
