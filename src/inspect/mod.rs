mod locate;
mod ports;

pub use ports::{parse_lsof_output, parse_netstat_output};

/// A located language server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProcess {
    /// Process id as a validated numeric string
    pub pid: String,
    /// CSRF token from the launch arguments; empty when the flag is absent
    pub csrf_token: String,
}

/// OS inspection capability behind one seam, so the refresh pipeline and
/// its tests never depend on a live process table.
pub trait SystemInspector: Send + Sync {
    /// Find the running language server, if any.
    ///
    /// `None` is an expected steady state (server not running), not an
    /// error.
    fn locate_server(&self) -> Option<ServerProcess>;

    /// List TCP ports the given process is listening on.
    ///
    /// Must reject a non-numeric pid without touching the OS. An empty
    /// list is a valid outcome (process found but not serving yet).
    fn listening_ports(&self, pid: &str) -> Vec<u16>;
}

/// Inspector backed by the real process table and socket listing of the
/// current platform.
#[derive(Debug, Default)]
pub struct PlatformInspector;

impl PlatformInspector {
    pub fn new() -> Self {
        Self
    }
}

impl SystemInspector for PlatformInspector {
    fn locate_server(&self) -> Option<ServerProcess> {
        locate::find_server()
    }

    fn listening_ports(&self, pid: &str) -> Vec<u16> {
        ports::listening_ports(pid)
    }
}
