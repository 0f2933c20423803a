use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::{ProcessingMode, ScanTask, ServiceDescriptor, SnmpCategory};
use crate::infra::preflight::Capabilities;
use crate::support::allocator::worker_allowance;
use crate::support::args::{normalize_base_url, BustArgs, SnmpArgs};
use crate::support::constants::{BUST_SUFFIX, MIB_INSTALL_HINT, MIB_PACKAGE, SNMP_SUFFIX};
use crate::support::filter::filter_services;
use crate::support::services::normalize_name;

pub(crate) struct PlanSettings {
    pub(crate) budget: usize,
    pub(crate) output_dir: PathBuf,
    pub(crate) skip_existing: bool,
}

/// Hands out output paths so that no two tasks ever share a file.
struct PathClaims<'a> {
    settings: &'a PlanSettings,
    claimed: HashSet<PathBuf>,
}

impl<'a> PathClaims<'a> {
    fn new(settings: &'a PlanSettings) -> Self {
        Self {
            settings,
            claimed: HashSet::new(),
        }
    }

    fn claim(&mut self, preferred: &str, fallback: &str) -> Option<PathBuf> {
        for name in [preferred, fallback] {
            let path = self.settings.output_dir.join(name);
            if self.claimed.contains(&path) {
                continue;
            }
            self.claimed.insert(path.clone());
            if self.settings.skip_existing && path.exists() {
                info!(output = %path.display(), "output exists, skipping");
                return None;
            }
            return Some(path);
        }
        warn!(output = preferred, "output name already taken by another task, skipping");
        None
    }
}

pub(crate) fn plan_bust(
    services: &[ServiceDescriptor],
    args: &BustArgs,
    settings: &PlanSettings,
) -> Vec<ScanTask> {
    let selected = filter_services(services, &args.service_match);
    let allowance = worker_allowance(settings.budget, selected.len());
    let url = normalize_base_url(&args.url);
    info!(
        services = services.len(),
        selected = selected.len(),
        threads = allowance,
        "content discovery planned"
    );

    let mut claims = PathClaims::new(settings);
    let mut tasks = Vec::new();
    for service in selected {
        debug!(
            address = %service.address,
            port = service.port,
            protocol = %service.protocol,
            state = %service.state,
            service = %service.service_name,
            "service selected"
        );
        let product = normalize_name(&service.product);
        let preferred = format!("{}.{product}.{BUST_SUFFIX}", service.port);
        let fallback = format!(
            "{}.{product}.{}.{BUST_SUFFIX}",
            service.port,
            normalize_name(&service.address)
        );
        let Some(output_path) = claims.claim(&preferred, &fallback) else {
            continue;
        };
        let target = format!("{url}:{}", service.port);
        tasks.push(ScanTask {
            id: tasks.len(),
            label: target.clone(),
            banner: format!(
                "Busting {target} using {} with {allowance} threads",
                args.wordlist
            ),
            descriptor: service.clone(),
            output_path,
            command: bust_command(&target, &args.extensions, &args.wordlist, allowance),
            worker_allowance: allowance,
            mode: ProcessingMode::RawPassthrough,
        });
    }
    tasks
}

fn bust_command(target: &str, extensions: &str, wordlist: &str, threads: usize) -> String {
    format!(
        "feroxbuster -u {} --extract-links -x {extensions} -B -C 404 -w={} -T 15 -t {threads} -k --force-recursion --silent",
        shell_words::quote(target),
        shell_words::quote(wordlist),
    )
}

pub(crate) fn plan_snmp(
    args: &SnmpArgs,
    capabilities: Capabilities,
    settings: &PlanSettings,
) -> Vec<ScanTask> {
    let categories: Vec<SnmpCategory> = SnmpCategory::ALL
        .into_iter()
        .filter(|category| {
            if category.needs_mib_definitions() && !capabilities.mib_definitions {
                warn!(
                    category = category.key(),
                    hint = MIB_INSTALL_HINT,
                    "{MIB_PACKAGE} is not installed, skipping category"
                );
                return false;
            }
            true
        })
        .collect();
    let allowance = worker_allowance(settings.budget, categories.len());
    let agent = format!("{}:{}", args.ip, args.port);

    let mut claims = PathClaims::new(settings);
    let mut tasks = Vec::new();
    for category in categories {
        let name = format!("{}.{}.{SNMP_SUFFIX}", category.key(), args.ip);
        let Some(output_path) = claims.claim(&name, &name) else {
            continue;
        };
        let command = snmp_command(args, &agent, category.oid());
        let mut descriptor = ServiceDescriptor::new(&args.ip, args.port);
        descriptor.protocol = "udp".to_string();
        descriptor.service_name = "snmp".to_string();
        tasks.push(ScanTask {
            id: tasks.len(),
            label: format!("{} {agent}", category.key()),
            banner: format!("{command}\n{}", category.title()),
            descriptor,
            output_path,
            command,
            worker_allowance: allowance,
            mode: category.mode(),
        });
    }
    tasks
}

fn snmp_command(args: &SnmpArgs, agent: &str, oid: Option<&str>) -> String {
    let mut command = format!(
        "snmpwalk -v {} -c {} {agent}",
        shell_words::quote(&args.version),
        shell_words::quote(&args.community),
    );
    if let Some(oid) = oid {
        command.push(' ');
        command.push_str(oid);
    }
    command
}

pub(crate) fn describe_output_dir(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
