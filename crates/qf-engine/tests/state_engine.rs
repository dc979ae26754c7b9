mod common;

use std::f64::consts::FRAC_PI_2;

use common::{assert_normalized, lettered_map, prepared, EPS};
use qf_core::{Pole, RngHandle};
use qf_engine::{Phase, RegisterState, SingleAxisGate, TwoAxisGate};

#[test]
fn initialize_all_south_selects_last_basis_state() {
    let state = prepared(3, Pole::South, 1);
    assert_eq!(state.phase(), Phase::Initialized);
    assert!((state.basis_probability(7) - 1.0).abs() < EPS);
    assert!((state.population("a").expect("a") - 1.0).abs() < EPS);
    assert!(state.population("A").expect("A").abs() < EPS);
    assert_eq!(state.basis_probability(8), 0.0);
}

#[test]
fn initialize_basis_places_each_axis_on_its_bit() {
    let mut state = RegisterState::new(lettered_map(2), RngHandle::from_seed(1));
    state.initialize_basis(0b10).expect("basis");
    assert!((state.population("A").expect("A") - 1.0).abs() < EPS);
    assert!((state.population("b").expect("b") - 1.0).abs() < EPS);

    let err = state.initialize_basis(4).expect_err("out of range");
    assert_eq!(err.code(), "basis-out-of-range");
}

#[test]
fn uninitialized_state_refuses_operations() {
    let mut state = RegisterState::new(lettered_map(2), RngHandle::from_seed(1));
    assert_eq!(state.phase(), Phase::Uninitialized);
    let err = state.apply_gate_1q(0, &SingleAxisGate::X.matrix()).expect_err("refused");
    assert_eq!(err.code(), "state-uninitialized");
    let err = state.measure(0).expect_err("refused");
    assert_eq!(err.code(), "state-uninitialized");
}

#[test]
fn drive_moves_population_toward_the_driven_pole() {
    let mut state = RegisterState::new(
        {
            let mut map = qf_register::RegisterMap::new();
            map.register_axis(0, "X", "Y").expect("axis");
            map
        },
        RngHandle::from_seed(3),
    );
    state.initialize_all(Pole::South);
    let before = state.population("X").expect("X");

    state.apply_drive("X", 1.0, 0.1).expect("drive");

    let after = state.population("X").expect("X");
    assert!(after > before);
    assert!((after - 0.1).abs() < 1e-9);
    let total = after + state.population("Y").expect("Y");
    assert!((total - 1.0).abs() < 1e-6);
    assert_eq!(state.phase(), Phase::Evolving);
}

#[test]
fn strong_drive_is_split_and_never_overshoots() {
    let mut map = qf_register::RegisterMap::new();
    map.register_axis(0, "X", "Y").expect("axis");
    let mut state = RegisterState::new(map, RngHandle::from_seed(3));
    state.initialize_all(Pole::South);

    state.apply_drive("X", 20.0, 0.1).expect("drive");

    let x = state.population("X").expect("X");
    let y = state.population("Y").expect("Y");
    assert!(y >= 0.0, "source pole went negative: {y}");
    assert!(x <= 1.0 + EPS);
    // four substeps, each moving half of what is left
    assert!((y - 0.0625).abs() < 1e-9);
    assert_normalized(&state);

    state.apply_decay(0, 50.0, 1.0).expect("decay");
    assert!(state.marginal(0, Pole::North) >= 0.0);
    assert!(state.marginal(0, Pole::South) > 0.99);
    assert_normalized(&state);
}

#[test]
fn decay_pushes_toward_south() {
    let mut state = prepared(1, Pole::North, 3);
    state.apply_decay(0, 0.5, 0.2).expect("decay");
    assert!((state.marginal(0, Pole::South) - 0.1).abs() < 1e-9);
    assert_normalized(&state);
}

#[test]
fn drive_rejects_unknown_symbols_and_negative_rates() {
    let mut state = prepared(1, Pole::North, 3);
    assert_eq!(
        state.apply_drive("Nowhere", 1.0, 0.1).expect_err("unknown").code(),
        "symbol-unknown"
    );
    assert_eq!(
        state.apply_drive("A", -1.0, 0.1).expect_err("negative").code(),
        "invalid-rate"
    );
}

#[test]
fn pauli_x_flips_and_ry_balances() {
    let mut state = prepared(2, Pole::North, 5);
    state.apply_gate_1q(0, &SingleAxisGate::X.matrix()).expect("x");
    assert!((state.population("a").expect("a") - 1.0).abs() < EPS);

    state.apply_gate_1q(1, &SingleAxisGate::Ry(FRAC_PI_2).matrix()).expect("ry");
    assert!((state.marginal(1, Pole::North) - 0.5).abs() < 1e-9);
    assert!((state.purity() - 1.0).abs() < 1e-9);
}

#[test]
fn swap_exchanges_axes() {
    let mut state = prepared(2, Pole::North, 5);
    state.apply_gate_1q(0, &SingleAxisGate::X.matrix()).expect("x");
    state.apply_gate_2q(0, 1, &TwoAxisGate::Swap.matrix()).expect("swap");
    assert!((state.population("A").expect("A") - 1.0).abs() < EPS);
    assert!((state.population("b").expect("b") - 1.0).abs() < EPS);

    let err = state
        .apply_gate_2q(1, 1, &TwoAxisGate::Cz.matrix())
        .expect_err("repeated");
    assert_eq!(err.code(), "axis-repeated");
}

#[test]
fn bell_pair_carries_two_bits_of_mutual_information() {
    let mut state = prepared(3, Pole::North, 7);
    state.entangle(0, 1).expect("entangle");

    assert!((state.mutual_information(0, 1) - 2.0).abs() < 1e-6);
    assert!((state.purity() - 1.0).abs() < 1e-9);
    assert!((state.marginal(0, Pole::North) - 0.5).abs() < 1e-9);
    assert!(state.graph().are_linked(0, 1));

    let all = state.all_mutual_information();
    let pairs: Vec<(usize, usize)> = all.iter().map(|&(a, b, _)| (a, b)).collect();
    assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2)]);
    assert!(all[1].2.abs() < 1e-6);
    assert!(all[2].2.abs() < 1e-6);
}

#[test]
fn mutual_information_is_zero_for_degenerate_pairs() {
    let mut state = prepared(2, Pole::North, 7);
    state.entangle(0, 1).expect("entangle");
    assert_eq!(state.mutual_information(0, 0), 0.0);
    assert_eq!(state.mutual_information(0, 9), 0.0);
}

#[test]
fn measured_axes_refuse_further_operations() {
    let mut state = prepared(3, Pole::North, 11);
    state.entangle(0, 1).expect("entangle");
    let outcomes = state.measure(1).expect("measure");
    assert_eq!(outcomes.len(), 2);
    assert!(state.is_measured(0) && state.is_measured(1));
    assert!(!state.is_measured(2));

    let err = state.apply_gate_1q(0, &SingleAxisGate::H.matrix()).expect_err("measured");
    assert_eq!(err.code(), "axis-measured");
    assert_eq!(state.apply_drive("B", 1.0, 0.1).expect_err("measured").code(), "axis-measured");
    assert_eq!(state.entangle(2, 1).expect_err("measured").code(), "axis-measured");
    assert_eq!(state.measure(0).expect_err("measured").code(), "axis-measured");
    assert_eq!(state.phase(), Phase::Evolving);
}

#[test]
fn unknown_axis_is_refused() {
    let mut state = prepared(2, Pole::North, 11);
    let err = state.apply_gate_1q(5, &SingleAxisGate::Z.matrix()).expect_err("unknown");
    assert_eq!(err.code(), "axis-unknown");
    assert_eq!(state.marginal(5, Pole::North), 0.0);
}

#[test]
fn reset_returns_to_uninitialized() {
    let mut state = prepared(2, Pole::North, 11);
    state.entangle(0, 1).expect("entangle");
    state.measure(0).expect("measure");
    state.reset();
    assert_eq!(state.phase(), Phase::Uninitialized);
    assert!(state.measured_axes().is_empty());
    assert!(state.graph().edges().is_empty());
    assert_eq!(state.trace(), 0.0);
}

#[test]
fn cluster_chains_live_axes() {
    let mut state = prepared(4, Pole::North, 13);
    let links = state.create_cluster(&[0, 1, 1, 9, 2]);
    assert_eq!(links, 2);
    assert!(state.graph().are_linked(0, 1));
    assert!(state.graph().are_linked(1, 2));
    assert!(!state.graph().is_entangled(3));
    assert!(state.remove_entanglement(0, 1));
    assert!(!state.remove_entanglement(0, 1));
    assert_normalized(&state);
}
