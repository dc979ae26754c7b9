#![allow(dead_code)]

use qf_core::Amplitude;
use qf_faction::{BellFeature, Driver, DriverKind, FactionDescriptor, GatedLindblad, Ring};

/// Descriptor touching every field, used for round-trip checks.
pub fn merchants() -> FactionDescriptor {
    FactionDescriptor::new("Granary Guilds", Ring::Center, ["grain", "coin", "ledger"])
        .with_description("Keepers of the harvest stores")
        .with_motto("Nothing spoils on our watch")
        .with_domain("Commerce")
        .with_tag("trade")
        .with_tag("imperial")
        .with_self_energy("grain", 0.2)
        .with_self_energy("coin", -0.15)
        .with_hamiltonian("grain", "coin", 0.5)
        .with_hamiltonian("coin", "ledger", Amplitude::complex(0.1, -0.3))
        .with_driver(
            "grain",
            Driver {
                kind: DriverKind::Sine,
                frequency: 0.25,
                phase: 0.1,
                amplitude: 0.05,
            },
        )
        .with_lindblad_out("grain", "coin", 0.04)
        .with_lindblad_in("ledger", "coin", 0.02)
        .with_gated_lindblad(
            "coin",
            GatedLindblad {
                source: "grain".into(),
                rate: 0.3,
                gate: "market".into(),
                power: 2.0,
                inverse: true,
            },
        )
        .with_decay("grain", 0.01, "rot")
        .with_alignment("coin", "unrest", -0.4)
        .with_measurement_inversion("ledger")
        .with_bell_feature(
            "coin",
            BellFeature {
                name: "Futures".into(),
                target: "ledger".into(),
                rate: 0.07,
            },
        )
        .with_decoherence("ledger", -0.02)
}

pub fn millwrights() -> FactionDescriptor {
    FactionDescriptor::new("Millwrights", Ring::First, ["grain", "water", "stone"])
        .with_domain("Civic")
        .with_tag("trade")
        .with_self_energy("grain", 0.1)
        .with_hamiltonian("water", "stone", 0.2)
}

pub fn seers() -> FactionDescriptor {
    FactionDescriptor::new("Moon Seers", Ring::Third, ["omen", "tide", "water"])
        .with_domain("Mystic")
        .with_tag("occult")
        .with_decay("tide", 0.05, "grain")
        .with_alignment("omen", "unrest", 0.3)
}
