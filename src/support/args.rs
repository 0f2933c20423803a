use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::support::constants::{
    DEFAULT_BUDGET, DEFAULT_SERVICE_MATCH, DEFAULT_SNMP_COMMUNITY, DEFAULT_SNMP_PORT,
    DEFAULT_SNMP_VERSION, DEFAULT_WORDLIST,
};

/// Runs external scanners against discovered services in parallel.
#[derive(Debug, Parser)]
#[command(name = "scanfleet", version, about)]
pub(crate) struct Cli {
    /// Upper bound on concurrently running scanners and on their combined
    /// internal threads.
    #[arg(long, short = 'b', global = true, env = "SCANFLEET_BUDGET", default_value_t = DEFAULT_BUDGET)]
    pub(crate) budget: usize,

    /// Directory that receives one output file per task.
    #[arg(long, short = 'o', global = true, env = "SCANFLEET_OUTPUT_DIR", default_value = ".")]
    pub(crate) output_dir: PathBuf,

    /// Leave existing output files alone and skip their tasks.
    #[arg(long, global = true)]
    pub(crate) skip_existing: bool,

    /// Write a JSON summary of every task outcome.
    #[arg(long, global = true)]
    pub(crate) report: Option<PathBuf>,

    #[arg(long, global = true, env = "SCANFLEET_LOG_LEVEL", default_value = "info")]
    pub(crate) log_level: String,

    /// Disable colored console output.
    #[arg(long, global = true)]
    pub(crate) no_color: bool,

    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Content discovery against every HTTP service in the inventory.
    Bust(BustArgs),
    /// Walk the interesting MIB categories of one SNMP agent.
    Snmp(SnmpArgs),
}

#[derive(Debug, Args)]
pub(crate) struct BustArgs {
    /// Service inventory (JSON, or YAML by extension).
    #[arg(long, short = 'f')]
    pub(crate) services: PathBuf,

    /// Base URL, http[s]://<ip_or_domain>/
    #[arg(long, short = 'u')]
    pub(crate) url: String,

    /// Extensions handed to the scanner, e.g. "php html".
    #[arg(long, short = 'x')]
    pub(crate) extensions: String,

    #[arg(long, short = 'w', default_value = DEFAULT_WORDLIST)]
    pub(crate) wordlist: String,

    /// Case-insensitive substring a service name must contain.
    #[arg(long = "match", default_value = DEFAULT_SERVICE_MATCH)]
    pub(crate) service_match: String,
}

#[derive(Debug, Args)]
pub(crate) struct SnmpArgs {
    /// Agent address to walk.
    #[arg(long, short = 'i')]
    pub(crate) ip: String,

    #[arg(long, short = 'p', default_value_t = DEFAULT_SNMP_PORT)]
    pub(crate) port: u16,

    /// Protocol version, 1 or 2c.
    #[arg(long = "snmp-version", short = 'v', default_value = DEFAULT_SNMP_VERSION)]
    pub(crate) version: String,

    #[arg(long, short = 'c', default_value = DEFAULT_SNMP_COMMUNITY)]
    pub(crate) community: String,

    /// Treat the MIB definition package as installed without probing.
    #[arg(long)]
    pub(crate) assume_mibs: bool,
}

/// `scheme://host[:port]` form of the operator's base URL. A missing scheme
/// defaults to `http://`; any path is cut off.
pub(crate) fn normalize_base_url(url: &str) -> String {
    let url = url.trim();
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };
    let Some((scheme, rest)) = url.split_once("://") else {
        return url;
    };
    match rest.split_once('/') {
        Some((host, _)) => format!("{scheme}://{host}"),
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_base_url, Cli, Mode};
    use clap::Parser;

    #[test]
    fn prepends_scheme_when_missing() {
        assert_eq!(normalize_base_url("10.0.0.5"), "http://10.0.0.5");
        assert_eq!(normalize_base_url("example.org/"), "http://example.org");
    }

    #[test]
    fn cuts_path_after_host() {
        assert_eq!(
            normalize_base_url("https://example.org/app/login"),
            "https://example.org"
        );
        assert_eq!(normalize_base_url("http://10.0.0.5/"), "http://10.0.0.5");
        assert_eq!(normalize_base_url("https://example.org"), "https://example.org");
    }

    #[test]
    fn parses_bust_invocation_with_defaults() {
        let cli = Cli::try_parse_from([
            "scanfleet",
            "bust",
            "-f",
            "hosts.json",
            "-u",
            "http://10.0.0.5/",
            "-x",
            "php html",
        ])
        .expect("parse");
        assert_eq!(cli.budget, 128);
        assert!(!cli.skip_existing);
        match cli.command {
            Mode::Bust(args) => {
                assert_eq!(args.service_match, "http");
                assert_eq!(args.extensions, "php html");
            }
            Mode::Snmp(_) => panic!("expected bust"),
        }
    }

    #[test]
    fn parses_snmp_invocation_with_global_flags() {
        let cli = Cli::try_parse_from([
            "scanfleet",
            "snmp",
            "-i",
            "10.0.0.9",
            "--budget",
            "4",
            "--skip-existing",
        ])
        .expect("parse");
        assert_eq!(cli.budget, 4);
        assert!(cli.skip_existing);
        match cli.command {
            Mode::Snmp(args) => {
                assert_eq!(args.port, 161);
                assert_eq!(args.version, "2c");
                assert_eq!(args.community, "public");
            }
            Mode::Bust(_) => panic!("expected snmp"),
        }
    }

    #[test]
    fn bust_requires_url() {
        assert!(Cli::try_parse_from(["scanfleet", "bust", "-f", "hosts.json", "-x", "php"]).is_err());
    }
}
