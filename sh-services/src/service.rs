//! Service trait and lifecycle state.
//!
//! Every business service implements `Service` so the registry can bring
//! them up, tear them down, and report health in one place.

use sh_core::error::ShResult;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Created,
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::ShuttingDown => "shutting_down",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Common lifecycle interface for SynergiHub services.
///
/// Business operations are synchronous database work, so the trait stays
/// synchronous as well.
pub trait Service: Send + Sync {
    /// Short name used in logs and health reports.
    fn name(&self) -> &str;

    fn state(&self) -> ServiceState;

    /// Called once at startup, in registration order.
    fn init(&mut self) -> ShResult<()>;

    /// Called at teardown, in reverse registration order.
    fn shutdown(&mut self) -> ShResult<()>;

    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        state: ServiceState,
    }

    impl Service for Probe {
        fn name(&self) -> &str {
            "probe"
        }
        fn state(&self) -> ServiceState {
            self.state
        }
        fn init(&mut self) -> ShResult<()> {
            self.state = ServiceState::Running;
            Ok(())
        }
        fn shutdown(&mut self) -> ShResult<()> {
            self.state = ServiceState::Stopped;
            Ok(())
        }
    }

    #[test]
    fn test_health_follows_state() {
        let mut probe = Probe { state: ServiceState::Created };
        assert!(!probe.is_healthy());
        probe.init().unwrap();
        assert!(probe.is_healthy());
        probe.shutdown().unwrap();
        assert!(!probe.is_healthy());
        assert_eq!(probe.state().to_string(), "stopped");
    }
}
