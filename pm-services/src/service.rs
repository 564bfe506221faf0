//! Lifecycle shared by the directory and assistant services.
//!
//! The server and CLI start each service with `init` before handing it to
//! callers; `/health` reports the resulting state.

use std::fmt;

use pm_core::error::PmResult;

/// Where a service is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Created,
    Running,
    Stopped,
    /// `init` rejected the configuration or could not reach its backend.
    Failed,
}

impl ServiceState {
    /// Lowercase label used in logs and the health report.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> ServiceState;

    /// Verify the backing resources and move to `Running`.
    fn init(&mut self) -> PmResult<()>;

    fn shutdown(&mut self) -> PmResult<()>;

    /// Only a running service answers requests.
    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}
