use std::time::Duration;

pub(crate) const BIN_NAME: &str = "scanfleet";
pub(crate) const UNKNOWN: &str = "unknown";

pub(crate) const DEFAULT_BUDGET: usize = 128;
pub(crate) const DEFAULT_SERVICE_MATCH: &str = "http";
pub(crate) const DEFAULT_WORDLIST: &str = "/usr/share/seclists/Discovery/Web-Content/common.txt";
pub(crate) const DEFAULT_SNMP_PORT: u16 = 161;
pub(crate) const DEFAULT_SNMP_VERSION: &str = "2c";
pub(crate) const DEFAULT_SNMP_COMMUNITY: &str = "public";

pub(crate) const BUST_SUFFIX: &str = "bferox";
pub(crate) const SNMP_SUFFIX: &str = "snmp";

pub(crate) const DRAIN_DEADLINE: Duration = Duration::from_secs(10);
pub(crate) const KILL_GRACE: Duration = Duration::from_secs(1);
pub(crate) const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) const MIB_PACKAGE: &str = "snmp-mibs-downloader";
pub(crate) const MIB_INSTALL_HINT: &str =
    "https://book.hacktricks.xyz/network-services-pentesting/pentesting-snmp#enumerating-snmp";

pub(crate) const LOG_ENV: &str = "SCANFLEET_LOG";
