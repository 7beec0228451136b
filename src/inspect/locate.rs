//! Locates the Antigravity language server in the OS process table.

use once_cell::sync::Lazy;
use regex::Regex;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System, UpdateKind};
use tracing::debug;

use super::ServerProcess;

/// Substring identifying the language server in a process name or command
/// line (the binary is named per platform, e.g. `language_server_linux_x64`).
const SERVER_SIGNATURE: &str = "language_server";

/// Permissive CSRF flag pattern: accepts `--csrf_token <tok>` as well as
/// `--csrf_token=<tok>`.
static CSRF_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--csrf_token(?:=|\s+)(\S+)").expect("Invalid CSRF_PATTERN regex"));

/// One row of the process table, reduced to what matching needs.
#[derive(Debug, Clone)]
pub(crate) struct ProcessCandidate {
    pub pid: u32,
    pub name: String,
    pub cmdline: String,
}

/// Find the running language server, if any.
pub(crate) fn find_server() -> Option<ServerProcess> {
    let mut sys = System::new_with_specifics(
        RefreshKind::nothing()
            .with_processes(ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always)),
    );
    sys.refresh_processes(ProcessesToUpdate::All, true);

    let candidates: Vec<ProcessCandidate> = sys
        .processes()
        .iter()
        .map(|(pid, process)| ProcessCandidate {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().to_string(),
            cmdline: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect();

    let server = select_server(candidates)?;
    debug!(pid = server.pid, "located language server");

    Some(ServerProcess {
        // u32-typed pids are numeric by construction; the string form is
        // what downstream OS queries receive, so it is built from the
        // validated value only.
        pid: server.pid.to_string(),
        csrf_token: extract_csrf_token(&server.cmdline),
    })
}

/// Pick the matching process.
///
/// Process tables have no stable iteration order, so candidates are sorted
/// by pid first and the lowest-pid match wins.
pub(crate) fn select_server(mut candidates: Vec<ProcessCandidate>) -> Option<ProcessCandidate> {
    candidates.sort_by_key(|c| c.pid);
    candidates
        .into_iter()
        .find(|c| c.name.contains(SERVER_SIGNATURE) || c.cmdline.contains(SERVER_SIGNATURE))
}

/// Extract the CSRF token from a command line.
///
/// A missing flag yields an empty token rather than a failure; the probe is
/// still attempted and fails naturally on auth rejection.
pub(crate) fn extract_csrf_token(cmdline: &str) -> String {
    CSRF_PATTERN
        .captures(cmdline)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
