//! One full locate -> scan -> probe pass.

use tracing::debug;

use crate::inspect::SystemInspector;
use crate::quota::{QuotaProber, QuotaRecord};

/// Definite result of one refresh pass.
///
/// The pipeline never propagates an error outward; every failure mode
/// collapses into a zero-record outcome here.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Records from the first successful probe, in server order
    pub records: Vec<QuotaRecord>,
    /// Whether any probe answered successfully (a success may still carry
    /// zero records)
    pub succeeded: bool,
}

impl RefreshOutcome {
    /// Outcome for a pass that produced no data.
    pub fn failed() -> Self {
        Self {
            records: Vec::new(),
            succeeded: false,
        }
    }
}

/// Run one refresh pass.
///
/// Candidate ports are tried in the scanner's order; the first successful
/// probe wins and the remaining ports are never tried. A missing server,
/// an empty port list, or all-ports-failing all yield a failed outcome.
pub async fn run_refresh(inspector: &dyn SystemInspector, prober: &QuotaProber) -> RefreshOutcome {
    let server = match inspector.locate_server() {
        Some(server) => server,
        None => {
            // Expected steady state: the IDE is simply not running.
            debug!("language server not found");
            return RefreshOutcome::failed();
        }
    };

    let ports = inspector.listening_ports(&server.pid);
    if ports.is_empty() {
        debug!(pid = %server.pid, "server has no listening ports");
        return RefreshOutcome::failed();
    }

    for port in ports {
        match prober.probe(port, &server.csrf_token).await {
            Ok(records) => {
                debug!(port, count = records.len(), "probe succeeded");
                return RefreshOutcome {
                    records,
                    succeeded: true,
                };
            }
            Err(e) => {
                debug!(port, error = %e, "probe failed");
            }
        }
    }

    RefreshOutcome::failed()
}
