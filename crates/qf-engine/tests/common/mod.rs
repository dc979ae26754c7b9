#![allow(dead_code)]

use qf_core::{Pole, RngHandle};
use qf_engine::{GateOrchestrator, RegisterState};
use qf_faction::{FactionDescriptor, FactionRegistry, Ring};
use qf_register::RegisterMap;

pub const EPS: f64 = 1e-9;

/// `A/a`, `B/b`, `C/c`, ... on consecutive axes.
pub fn lettered_map(axes: usize) -> RegisterMap {
    let mut map = RegisterMap::new();
    for index in 0..axes {
        let upper = char::from(b'A' + index as u8).to_string();
        let lower = upper.to_lowercase();
        map.register_axis(index, upper, lower).expect("axis");
    }
    map
}

pub fn prepared(axes: usize, pole: Pole, seed: u64) -> RegisterState {
    let mut state = RegisterState::new(lettered_map(axes), RngHandle::from_seed(seed));
    state.initialize_all(pole);
    state
}

pub fn orchestrator(axes: usize, pole: Pole, seed: u64) -> GateOrchestrator {
    GateOrchestrator::new(prepared(axes, pole, seed))
}

pub fn assert_normalized(state: &RegisterState) {
    assert!((state.trace() - 1.0).abs() < 1e-6, "trace {}", state.trace());
    for axis in 0..state.axis_count() {
        let total = state.marginal(axis, Pole::North) + state.marginal(axis, Pole::South);
        assert!((total - 1.0).abs() < 1e-6, "axis {axis} marginals sum to {total}");
    }
}

/// Two trading houses sharing `Coin` and `Debt`: the guild leaks coin into
/// debt and the bank pulls it back. The oracle inverts readings of `Omen`.
pub fn market_registry() -> FactionRegistry {
    let guild = FactionDescriptor::new("Guild", Ring::First, ["Coin", "Debt", "Grain"])
        .with_domain("Commerce")
        .with_tag("trade")
        .with_lindblad_out("Coin", "Debt", 0.4)
        .with_hamiltonian("Grain", "Coin", 0.2)
        .with_decoherence("Grain", 0.05);
    let bank = FactionDescriptor::new("Bank", Ring::Center, ["Coin", "Debt", "Vault"])
        .with_domain("Commerce")
        .with_tag("trade")
        .with_lindblad_in("Coin", "Debt", 0.6)
        .with_self_energy("Vault", 0.5)
        .with_lindblad_out("Debt", "Vault", 0.3);
    let oracle = FactionDescriptor::new("Oracle", Ring::Outer, ["Omen", "Doubt", "Coin"])
        .with_domain("Mystic")
        .with_measurement_inversion("Omen");

    let mut registry = FactionRegistry::new();
    registry.register(guild).expect("guild");
    registry.register(bank).expect("bank");
    registry.register(oracle).expect("oracle");
    registry.define_preset("market", ["Guild", "Bank"]);
    registry
}
