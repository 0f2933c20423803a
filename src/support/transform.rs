use std::net::Ipv4Addr;

use crate::domain::ProcessingMode;

/// Reduces one raw output line according to `mode`.
///
/// `None` means the line is dropped; `Some("")` is still written.
pub(crate) fn transform_line(line: &str, mode: ProcessingMode) -> Option<String> {
    match mode {
        ProcessingMode::RawPassthrough => Some(line.to_string()),
        ProcessingMode::ColonStrip => colon_strip(line),
        ProcessingMode::IpPortExtract => ip_port_extract(line),
    }
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn colon_strip(line: &str) -> Option<String> {
    if line.matches(':').count() >= 3 {
        return line.splitn(4, ':').nth(3).map(str::to_string);
    }
    line.split_once('=').map(|(_, value)| value.to_string())
}

// TCP-MIB::tcpConnLocalPort.<a>.<b>.<c>.<d>.<port>.<remote...> = INTEGER: <port>
fn ip_port_extract(line: &str) -> Option<String> {
    let (oid, _) = line.split_once('=')?;
    let parts: Vec<&str> = oid.trim().split('.').collect();
    if parts.len() < 6 {
        return None;
    }
    let ip: Ipv4Addr = parts[1..5].join(".").parse().ok()?;
    let port: u16 = parts[5].trim().parse().ok()?;
    Some(format!("{ip}:{port}"))
}
