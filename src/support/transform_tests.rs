use super::transform::{is_blank, transform_line};
use crate::domain::ProcessingMode;

#[test]
fn raw_passthrough_keeps_line() {
    let line = "200      GET       12l       40w      512c http://10.0.0.5:80/admin";
    assert_eq!(
        transform_line(line, ProcessingMode::RawPassthrough).as_deref(),
        Some(line)
    );
}

#[test]
fn colon_strip_takes_text_after_third_colon() {
    assert_eq!(
        transform_line("a:b:c:d:e", ProcessingMode::ColonStrip).as_deref(),
        Some("d:e")
    );
    assert_eq!(
        transform_line(
            "HOST-RESOURCES-MIB::hrSWRunName.1 = STRING: \"systemd\"",
            ProcessingMode::ColonStrip
        )
        .as_deref(),
        Some(" \"systemd\"")
    );
}

#[test]
fn colon_strip_falls_back_to_equals() {
    assert_eq!(
        transform_line("x=y", ProcessingMode::ColonStrip).as_deref(),
        Some("y")
    );
    assert_eq!(
        transform_line("a:b = c=d", ProcessingMode::ColonStrip).as_deref(),
        Some(" c=d")
    );
}

#[test]
fn colon_strip_drops_lines_without_delimiters() {
    assert_eq!(transform_line("no-delimiters", ProcessingMode::ColonStrip), None);
    assert_eq!(transform_line("only:two:", ProcessingMode::ColonStrip), None);
}

#[test]
fn colon_strip_keeps_empty_remainder() {
    assert_eq!(
        transform_line("key=", ProcessingMode::ColonStrip).as_deref(),
        Some("")
    );
}

#[test]
fn ip_port_extract_reads_local_endpoint() {
    assert_eq!(
        transform_line(
            "TCP-MIB::tcpConnLocalPort.192.168.1.1.8080.0.0.0.0.0 = INTEGER: 8080",
            ProcessingMode::IpPortExtract
        )
        .as_deref(),
        Some("192.168.1.1:8080")
    );
    assert_eq!(
        transform_line(
            "TCP-MIB::tcpConnLocalPort.127.0.0.53.53.0.0.0.0.0 = INTEGER: 53",
            ProcessingMode::IpPortExtract
        )
        .as_deref(),
        Some("127.0.0.53:53")
    );
}

#[test]
fn ip_port_extract_drops_short_or_malformed_lines() {
    assert_eq!(
        transform_line(
            "TCP-MIB::tcpConnState.1.2.3 = INTEGER: listen(2)",
            ProcessingMode::IpPortExtract
        ),
        None
    );
    assert_eq!(
        transform_line(
            "TCP-MIB::tcpConnLocalPort.1.2.3.4.5.6 INTEGER: 5",
            ProcessingMode::IpPortExtract
        ),
        None
    );
    assert_eq!(
        transform_line(
            "TCP-MIB::tcpConnLocalPort.a.b.c.d.e.0 = INTEGER: 0",
            ProcessingMode::IpPortExtract
        ),
        None
    );
    assert_eq!(
        transform_line("End of MIB", ProcessingMode::IpPortExtract),
        None
    );
}

#[test]
fn transform_is_deterministic() {
    let line = "TCP-MIB::tcpConnLocalPort.0.0.0.0.8083.0.0.0.0.0 = INTEGER: 8083";
    for mode in [
        ProcessingMode::RawPassthrough,
        ProcessingMode::ColonStrip,
        ProcessingMode::IpPortExtract,
    ] {
        assert_eq!(transform_line(line, mode), transform_line(line, mode));
    }
}

#[test]
fn blank_detection_covers_whitespace() {
    assert!(is_blank(""));
    assert!(is_blank("  \t"));
    assert!(!is_blank(" x "));
}
