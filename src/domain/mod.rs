use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::support::constants::UNKNOWN;

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// One discovered network service as supplied by the inventory.
///
/// Missing fields are recorded as `"unknown"` so matching never has to deal
/// with absent values.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub(crate) struct ServiceDescriptor {
    #[serde(default = "unknown", alias = "addr")]
    pub(crate) address: String,
    #[serde(default, alias = "portid")]
    pub(crate) port: u16,
    #[serde(default = "unknown")]
    pub(crate) protocol: String,
    #[serde(default = "unknown")]
    pub(crate) state: String,
    #[serde(default = "unknown")]
    pub(crate) product: String,
    #[serde(default = "unknown", alias = "serviceName", alias = "name")]
    pub(crate) service_name: String,
}

impl ServiceDescriptor {
    pub(crate) fn new(address: &str, port: u16) -> Self {
        Self {
            address: address.to_string(),
            port,
            protocol: unknown(),
            state: unknown(),
            product: unknown(),
            service_name: unknown(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ProcessingMode {
    RawPassthrough,
    ColonStrip,
    IpPortExtract,
}

#[derive(Clone, Debug)]
pub(crate) struct ScanTask {
    pub(crate) id: usize,
    pub(crate) label: String,
    pub(crate) banner: String,
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) output_path: PathBuf,
    pub(crate) command: String,
    pub(crate) worker_allowance: usize,
    pub(crate) mode: ProcessingMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TaskState {
    Pending,
    Running,
    Completed,
    Aborted,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct TaskOutcome {
    pub(crate) id: usize,
    pub(crate) label: String,
    pub(crate) output: PathBuf,
    pub(crate) state: TaskState,
    pub(crate) exit_code: Option<i32>,
    pub(crate) lines_written: u64,
    pub(crate) error: Option<String>,
}

impl TaskOutcome {
    pub(crate) fn new(task: &ScanTask, state: TaskState) -> Self {
        Self {
            id: task.id,
            label: task.label.clone(),
            output: task.output_path.clone(),
            state,
            exit_code: None,
            lines_written: 0,
            error: None,
        }
    }

    pub(crate) fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// SNMP walk categories, each bound to the OID it walks and the way its
/// output lines are reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum SnmpCategory {
    RunningPrograms,
    InstalledSoftware,
    TcpPorts,
    SystemProcesses,
    NsExtend,
    All,
}

impl SnmpCategory {
    pub(crate) const ALL: [SnmpCategory; 6] = [
        SnmpCategory::RunningPrograms,
        SnmpCategory::InstalledSoftware,
        SnmpCategory::TcpPorts,
        SnmpCategory::SystemProcesses,
        SnmpCategory::NsExtend,
        SnmpCategory::All,
    ];

    pub(crate) fn key(self) -> &'static str {
        match self {
            SnmpCategory::RunningPrograms => "running_programs",
            SnmpCategory::InstalledSoftware => "installed_software",
            SnmpCategory::TcpPorts => "tcp_ports",
            SnmpCategory::SystemProcesses => "system_processes",
            SnmpCategory::NsExtend => "nsextend",
            SnmpCategory::All => "all",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            SnmpCategory::RunningPrograms => "|CAN BE USEFUL| Running Program's names",
            SnmpCategory::InstalledSoftware => "|USEFUL| Installed Software",
            SnmpCategory::TcpPorts => "TCP Ports on All IF's",
            SnmpCategory::SystemProcesses => "System Processes",
            SnmpCategory::NsExtend => "|?PASSWORDS?| More readable info",
            SnmpCategory::All => "Dump of all the things",
        }
    }

    pub(crate) fn oid(self) -> Option<&'static str> {
        match self {
            SnmpCategory::RunningPrograms => Some("1.3.6.1.2.1.25.4.2.1.2"),
            SnmpCategory::InstalledSoftware => Some("1.3.6.1.2.1.25.6.3.1.2"),
            SnmpCategory::TcpPorts => Some("1.3.6.1.2.1.6.13.1.3"),
            SnmpCategory::SystemProcesses => Some("1.3.6.1.2.1.25.1.6.0"),
            SnmpCategory::NsExtend => Some("NET-SNMP-EXTEND-MIB::nsExtendOutputFull"),
            SnmpCategory::All => None,
        }
    }

    pub(crate) fn mode(self) -> ProcessingMode {
        match self {
            SnmpCategory::TcpPorts => ProcessingMode::IpPortExtract,
            SnmpCategory::NsExtend | SnmpCategory::All => ProcessingMode::RawPassthrough,
            _ => ProcessingMode::ColonStrip,
        }
    }

    /// Symbolic OIDs only resolve when the MIB definition package is present.
    pub(crate) fn needs_mib_definitions(self) -> bool {
        matches!(self, SnmpCategory::NsExtend)
    }
}
