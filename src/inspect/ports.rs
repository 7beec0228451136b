//! Per-process listening TCP port discovery.
//!
//! Unix platforms expose a direct per-process socket listing through
//! `lsof`; Windows lacks one, so the full `netstat` table is filtered by
//! owning pid instead.

use std::collections::HashSet;
use std::process::Command;
use tracing::{debug, warn};

/// List the TCP ports a process is listening on.
///
/// Returns a deduplicated list in discovery order; empty is a valid,
/// non-error outcome. The pid is re-validated here because it flows into an
/// OS command line: anything non-numeric is rejected without spawning
/// anything.
pub(crate) fn listening_ports(pid: &str) -> Vec<u16> {
    if !is_numeric_pid(pid) {
        warn!(pid, "rejecting non-numeric pid");
        return Vec::new();
    }
    scan(pid)
}

/// Strict numeric check for pid strings used in OS queries.
fn is_numeric_pid(pid: &str) -> bool {
    !pid.is_empty() && pid.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(unix)]
fn scan(pid: &str) -> Vec<u16> {
    // -a ANDs the filters, so only sockets owned by this pid are listed.
    // lsof exits non-zero when nothing matches; an empty stdout parses to
    // an empty list either way.
    let output = match Command::new("lsof")
        .args(["-nP", "-iTCP", "-sTCP:LISTEN", "-a", "-p", pid])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "failed to execute lsof");
            return Vec::new();
        }
    };

    parse_lsof_output(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(windows)]
fn scan(pid: &str) -> Vec<u16> {
    let output = match Command::new("netstat").args(["-ano"]).output() {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "failed to execute netstat");
            return Vec::new();
        }
    };

    parse_netstat_output(&String::from_utf8_lossy(&output.stdout), pid)
}

/// Parse `lsof -nP -iTCP -sTCP:LISTEN` output into local ports.
///
/// The NAME column is the only colon-bearing field on a socket row
/// (e.g. `127.0.0.1:42100` or `*:42100`), so ports are taken from there.
pub fn parse_lsof_output(output: &str) -> Vec<u16> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();

    for line in output.lines().skip_while(|l| l.starts_with("COMMAND")) {
        for field in line.split_whitespace() {
            if !field.contains(':') {
                continue;
            }
            if let Some(port) = field.rsplit(':').next().and_then(|p| p.parse::<u16>().ok()) {
                if seen.insert(port) {
                    ports.push(port);
                }
            }
        }
    }

    ports
}

/// Parse full `netstat -ano` output, keeping rows that are TCP, LISTENING,
/// and owned by the given pid.
pub fn parse_netstat_output(output: &str, pid: &str) -> Vec<u16> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();

    for line in output.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || fields[0] != "TCP" {
            continue;
        }
        if fields[3] != "LISTENING" || fields[4] != pid {
            continue;
        }
        // Local address is `0.0.0.0:135` or `[::]:135`; the port follows
        // the last colon in both forms.
        if let Some(port) = fields[1]
            .rsplit(':')
            .next()
            .and_then(|p| p.parse::<u16>().ok())
        {
            if seen.insert(port) {
                ports.push(port);
            }
        }
    }

    ports
}
