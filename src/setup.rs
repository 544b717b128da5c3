//! One-shot device setup gated on configuration and permission
//!
//! Device setup has to wait for two independent signals: the first prop
//! delivery from the host and a granted camera permission. They may arrive
//! in either order, any number of times, and setup must happen exactly once.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupPhase {
    /// Neither signal seen yet
    Uninitialized,
    /// One signal seen, waiting for the other
    Awaiting {
        configuration_ready: bool,
        permission_granted: bool,
    },
    /// Setup fired; terminal
    Ready,
}

/// Outcome of marking a signal
#[must_use = "a Fire transition means the device must be set up now"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Both signals are present for the first time: set the device up
    Fire,
    Unchanged,
}

#[derive(Debug, Default, Clone)]
pub struct SetupGate {
    configuration_ready: bool,
    permission_granted: bool,
    initialized: bool,
}

impl SetupGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_configuration_ready(&mut self) -> Transition {
        self.configuration_ready = true;
        self.evaluate()
    }

    pub fn mark_permission_granted(&mut self) -> Transition {
        self.permission_granted = true;
        self.evaluate()
    }

    fn evaluate(&mut self) -> Transition {
        if self.initialized || !(self.configuration_ready && self.permission_granted) {
            return Transition::Unchanged;
        }
        self.initialized = true;
        Transition::Fire
    }

    pub fn phase(&self) -> SetupPhase {
        match (self.initialized, self.configuration_ready, self.permission_granted) {
            (true, _, _) => SetupPhase::Ready,
            (false, false, false) => SetupPhase::Uninitialized,
            (false, configuration_ready, permission_granted) => SetupPhase::Awaiting {
                configuration_ready,
                permission_granted,
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_configuration_first() {
        let mut gate = SetupGate::new();
        assert_eq!(gate.phase(), SetupPhase::Uninitialized);
        assert_eq!(gate.mark_configuration_ready(), Transition::Unchanged);
        assert_eq!(
            gate.phase(),
            SetupPhase::Awaiting {
                configuration_ready: true,
                permission_granted: false
            }
        );
        assert_eq!(gate.mark_permission_granted(), Transition::Fire);
        assert_eq!(gate.phase(), SetupPhase::Ready);
        assert_eq!(gate.mark_configuration_ready(), Transition::Unchanged);
        assert_eq!(gate.mark_permission_granted(), Transition::Unchanged);
    }

    #[test]
    fn test_fires_once_permission_first() {
        let mut gate = SetupGate::new();
        assert_eq!(gate.mark_permission_granted(), Transition::Unchanged);
        assert_eq!(gate.mark_permission_granted(), Transition::Unchanged);
        assert_eq!(gate.mark_configuration_ready(), Transition::Fire);
        assert!(gate.is_ready());
    }

    #[test]
    fn test_repeated_single_signal_never_fires() {
        let mut gate = SetupGate::new();
        for _ in 0..10 {
            assert_eq!(gate.mark_configuration_ready(), Transition::Unchanged);
        }
        assert!(!gate.is_ready());
    }
}
