mod common;

use common::{assert_normalized, prepared};
use proptest::prelude::*;
use qf_core::Pole;
use qf_engine::{RegisterState, SingleAxisGate, TwoAxisGate};
use qf_faction::{FactionDescriptor, Ring};
use qf_icon::{IconComposer, IconSet};
use qf_register::{build_operators, BuildContext};

#[derive(Debug, Clone)]
enum Step {
    Gate(usize, SingleAxisGate),
    Pair(usize, usize, TwoAxisGate),
    Drive(&'static str, f64, f64),
    Decay(usize, f64, f64),
    Entangle(usize, usize),
    Evolve(f64),
    Measure(usize),
}

const SYMBOLS: [&str; 6] = ["A", "a", "B", "b", "C", "c"];

fn gate() -> impl Strategy<Value = SingleAxisGate> {
    prop_oneof![
        Just(SingleAxisGate::H),
        Just(SingleAxisGate::X),
        Just(SingleAxisGate::Y),
        Just(SingleAxisGate::Z),
        (0.0..6.3f64).prop_map(SingleAxisGate::Phase),
        (0.0..6.3f64).prop_map(SingleAxisGate::Ry),
    ]
}

fn pair_gate() -> impl Strategy<Value = TwoAxisGate> {
    prop_oneof![Just(TwoAxisGate::Cnot), Just(TwoAxisGate::Cz), Just(TwoAxisGate::Swap)]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..3usize, gate()).prop_map(|(axis, g)| Step::Gate(axis, g)),
        (0..3usize, 0..3usize, pair_gate()).prop_map(|(a, b, g)| Step::Pair(a, b, g)),
        (0..6usize, 0.0..2.0f64, 0.0..0.4f64).prop_map(|(s, r, dt)| Step::Drive(SYMBOLS[s], r, dt)),
        (0..3usize, 0.0..2.0f64, 0.0..0.4f64).prop_map(|(axis, r, dt)| Step::Decay(axis, r, dt)),
        (0..3usize, 0..3usize).prop_map(|(a, b)| Step::Entangle(a, b)),
        (0.01..0.3f64).prop_map(Step::Evolve),
        (0..3usize).prop_map(Step::Measure),
    ]
}

fn icons() -> IconSet {
    let faction = FactionDescriptor::new("Mixer", Ring::Second, SYMBOLS)
        .with_hamiltonian("A", "b", 0.5)
        .with_hamiltonian("B", "b", 0.3)
        .with_lindblad_out("a", "C", 0.8)
        .with_decay("c", 0.4, "C")
        .with_decoherence("C", 0.2);
    IconComposer::compose(&[&faction])
}

fn apply(state: &mut RegisterState, set: &IconSet, step: &Step) {
    // refusals (measured axes, repeated axes) are part of the sequence
    let _ = match *step {
        Step::Gate(axis, g) => state.apply_gate_1q(axis, &g.matrix()),
        Step::Pair(a, b, g) => state.apply_gate_2q(a, b, &g.matrix()),
        Step::Drive(symbol, rate, dt) => state.apply_drive(symbol, rate, dt),
        Step::Decay(axis, rate, dt) => state.apply_decay(axis, rate, dt),
        Step::Entangle(a, b) => state.entangle(a, b),
        Step::Evolve(dt) => {
            let ctx = BuildContext {
                populations: state.populations(),
                measured_axes: state.measured_axes(),
                entangled_axes: state.graph().entangled_axes(),
                ..BuildContext::default()
            };
            let ops = build_operators(set, state.map(), &ctx);
            state.evolve(&ops, dt, 0.02)
        }
        Step::Measure(axis) => state.measure(axis).map(|_| ()),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn trace_and_marginals_survive_any_sequence(
        steps in prop::collection::vec(step(), 1..24),
        seed in any::<u64>(),
    ) {
        let set = icons();
        let mut state = prepared(3, Pole::North, seed);
        for step in &steps {
            apply(&mut state, &set, step);
            assert_normalized(&state);
        }
        let rho = state.density();
        let skew = (rho - rho.adjoint()).norm();
        prop_assert!(skew < 1e-9, "density lost hermiticity: {skew}");
    }

    #[test]
    fn measured_poles_stay_pinned(
        steps in prop::collection::vec(step(), 1..24),
        seed in any::<u64>(),
    ) {
        let set = icons();
        let mut state = prepared(3, Pole::North, seed);
        for step in &steps {
            apply(&mut state, &set, step);
            for axis in state.measured_axes() {
                let pole = state.measured_pole(axis).expect("pole");
                prop_assert!((state.marginal(axis, pole) - 1.0).abs() < 1e-6);
            }
        }
    }
}
