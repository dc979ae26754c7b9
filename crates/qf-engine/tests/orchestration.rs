mod common;

use common::{assert_normalized, orchestrator};
use qf_core::Pole;
use qf_engine::{GateRecord, Phase, SingleAxisGate, TwoAxisGate};

#[test]
fn verbs_soft_fail_instead_of_erroring() {
    let mut orch = orchestrator(2, Pole::North, 5);
    assert!(!orch.apply_gate(9, SingleAxisGate::X));
    assert!(!orch.apply_gate_2q(0, 0, TwoAxisGate::Swap));
    assert!(!orch.entangle(1, 1));
    assert!(orch.measure(7).is_empty());
    assert!(!orch.remove_entanglement(0, 1));
    assert!(orch.gate_history(0).is_empty());
    assert_eq!(orch.state().phase(), Phase::Initialized);
}

#[test]
fn entangle_records_hadamard_and_cnot() {
    let mut orch = orchestrator(2, Pole::North, 5);
    assert!(orch.entangle(0, 1));

    let labels: Vec<&str> = orch.gate_history(0).iter().map(|r| r.gate.as_str()).collect();
    assert_eq!(labels, vec!["H", "CNOT"]);
    assert_eq!(
        orch.gate_history(1),
        &[GateRecord {
            gate: "CNOT".into(),
            partner: Some(0),
        }]
    );
    assert!((orch.state().mutual_information(0, 1) - 2.0).abs() < 1e-6);
}

#[test]
fn batch_entangle_counts_successful_pairs() {
    let mut orch = orchestrator(4, Pole::North, 5);
    let linked = orch.batch_entangle(&[(0, 1), (2, 2), (2, 3), (1, 8)]);
    assert_eq!(linked, 2);
    assert!(orch.state().graph().are_linked(2, 3));
    assert_normalized(orch.state());
}

#[test]
fn cluster_state_skips_measured_axes() {
    let mut orch = orchestrator(4, Pole::North, 5);
    assert_eq!(orch.measure(3).get(&3), Some(&Pole::North));

    let links = orch.create_cluster_state(&[0, 3, 1, 2]);

    assert_eq!(links, 2);
    let component = orch.state().graph().component(0);
    assert_eq!(component.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn cluster_state_ignores_repeated_axes() {
    let mut orch = orchestrator(3, Pole::North, 5);

    let links = orch.create_cluster_state(&[0, 1, 1, 2]);

    assert_eq!(links, 2);
    assert_eq!(orch.state().graph().edges(), vec![(0, 1), (1, 2)]);
    // CNOT from the first link, then H and CNOT from the second
    assert_eq!(orch.gate_history(1).len(), 3);
}

#[test]
fn measure_collapses_and_later_verbs_are_refused() {
    let mut orch = orchestrator(3, Pole::North, 9);
    assert_eq!(orch.create_cluster_state(&[0, 1, 2]), 2);

    let outcomes = orch.measure(2);

    assert_eq!(outcomes.len(), 3);
    assert_eq!(orch.state().phase(), Phase::Measured);
    assert!(!orch.apply_gate(0, SingleAxisGate::H));
    assert!(orch.measure(0).is_empty());
}

#[test]
fn remove_entanglement_only_edits_the_graph() {
    let mut orch = orchestrator(2, Pole::North, 9);
    assert!(orch.entangle(0, 1));
    let before = orch.state().density().clone();

    assert!(orch.remove_entanglement(1, 0));

    assert!(!orch.state().graph().is_entangled(0));
    assert_eq!(orch.state().density(), &before);
    assert_eq!(orch.measure(0).len(), 1);
}

#[test]
fn reset_clears_history_and_triggers() {
    let mut orch = orchestrator(2, Pole::North, 9);
    assert!(orch.entangle(0, 1));
    assert!(orch.set_measurement_trigger(0, &[1], Pole::South, SingleAxisGate::X));

    orch.reset();

    assert!(orch.gate_history(0).is_empty());
    assert!(orch.triggers().is_empty());
    assert_eq!(orch.state().phase(), Phase::Uninitialized);
    assert!(!orch.apply_gate(0, SingleAxisGate::X));
}
