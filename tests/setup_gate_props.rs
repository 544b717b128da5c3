//! Property-based tests for one-shot device setup
//!
//! Whatever order and multiplicity the configuration and permission signals
//! arrive in, setup fires exactly once and never before both were seen.

use camkit::setup::{SetupGate, SetupPhase, Transition};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Signal {
    Configuration,
    Permission,
}

fn signal() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Configuration), Just(Signal::Permission)]
}

proptest! {
    #[test]
    fn fires_exactly_once_after_both_signals(signals in prop::collection::vec(signal(), 0..40)) {
        let mut gate = SetupGate::new();
        let mut seen_configuration = false;
        let mut seen_permission = false;
        let mut fired = 0;

        for s in &signals {
            let transition = match s {
                Signal::Configuration => {
                    seen_configuration = true;
                    gate.mark_configuration_ready()
                }
                Signal::Permission => {
                    seen_permission = true;
                    gate.mark_permission_granted()
                }
            };
            if transition == Transition::Fire {
                fired += 1;
                prop_assert!(seen_configuration && seen_permission);
            }
        }

        let both = seen_configuration && seen_permission;
        prop_assert_eq!(fired, usize::from(both));
        prop_assert_eq!(gate.is_ready(), both);
        prop_assert_eq!(gate.phase() == SetupPhase::Ready, both);
    }

    #[test]
    fn ready_is_terminal(extra in prop::collection::vec(signal(), 0..20)) {
        let mut gate = SetupGate::new();
        let _ = gate.mark_permission_granted();
        prop_assert_eq!(gate.mark_configuration_ready(), Transition::Fire);
        for s in extra {
            let transition = match s {
                Signal::Configuration => gate.mark_configuration_ready(),
                Signal::Permission => gate.mark_permission_granted(),
            };
            prop_assert_eq!(transition, Transition::Unchanged);
            prop_assert_eq!(gate.phase(), SetupPhase::Ready);
        }
    }
}
