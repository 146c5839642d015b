//! Property tests for the gate decision.

use crate::mocks::pipeline_gate;
use ci_gate::GateDecision;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_decision_is_logical_and(a in any::<i32>(), b in any::<i32>()) {
        let decision = GateDecision::from_codes([a, b]);
        prop_assert_eq!(decision.passed, a == 0 && b == 0);
        prop_assert_eq!(decision.exit_code(), if a == 0 && b == 0 { 0 } else { 1 });
    }

    #[test]
    fn prop_orchestrated_run_matches_codes(a in -3i32..4, b in -3i32..4) {
        let report = pipeline_gate(a, b).run_all().unwrap();
        prop_assert_eq!(report.checks.len(), 2);
        prop_assert_eq!(report.decision(), GateDecision::from_codes([a, b]));
    }

    #[test]
    fn prop_any_length_is_and(codes in prop::collection::vec(-2i32..3, 0..8)) {
        let decision = GateDecision::from_codes(codes.iter().copied());
        let expected = !codes.is_empty() && codes.iter().all(|&c| c == 0);
        prop_assert_eq!(decision.passed, expected);
    }
}
