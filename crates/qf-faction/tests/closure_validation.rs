mod common;

use proptest::prelude::*;
use qf_faction::{FactionDescriptor, GatedLindblad, Ring, ViolationKind};

#[test]
fn authored_fixtures_are_closed() {
    assert!(common::merchants().is_valid());
    assert!(common::millwrights().is_valid());
    assert!(common::seers().is_valid());
}

#[test]
fn decay_and_alignment_may_leave_signature() {
    let descriptor = FactionDescriptor::new("Ash Court", Ring::Second, ["ember", "ash", "crown"])
        .with_decay("ember", 0.2, "famine")
        .with_alignment("crown", "piety", 0.5);
    assert!(descriptor.validate().is_empty());
}

#[test]
fn every_endpoint_breach_is_reported() {
    let descriptor = FactionDescriptor::new("Leaky", Ring::Outer, ["a", "b", "c"])
        .with_hamiltonian("a", "z", 0.1)
        .with_lindblad_out("b", "y", 0.1)
        .with_lindblad_in("c", "x", 0.1)
        .with_gated_lindblad(
            "a",
            GatedLindblad {
                source: "w".into(),
                rate: 0.1,
                gate: "anything".into(),
                power: 1.0,
                inverse: false,
            },
        )
        .with_self_energy("q", 1.0);
    let kinds: Vec<ViolationKind> = descriptor.validate().iter().map(|v| v.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::TermOwner,
            ViolationKind::HamiltonianEndpoint,
            ViolationKind::LindbladOutgoingEndpoint,
            ViolationKind::LindbladIncomingEndpoint,
            ViolationKind::GatedSource,
        ]
    );
}

#[test]
fn signature_size_and_duplicates() {
    let small = FactionDescriptor::new("Pair", Ring::Center, ["a", "b"]);
    assert_eq!(small.validate()[0].kind, ViolationKind::SignatureSize);

    let dup = FactionDescriptor::new("Echo", Ring::Center, ["a", "b", "a", "c"]);
    let kinds: Vec<ViolationKind> = dup.validate().iter().map(|v| v.kind).collect();
    assert_eq!(kinds, vec![ViolationKind::DuplicateSignatureSymbol]);
}

proptest! {
    #[test]
    fn valid_descriptors_keep_endpoints_in_signature(
        edges in prop::collection::vec((0usize..6, 0usize..6, -1.0f64..1.0), 0..12),
    ) {
        let pool = ["a", "b", "c", "d", "e", "f"];
        let mut descriptor = FactionDescriptor::new("Generated", Ring::First, ["a", "b", "c", "d"]);
        for (source, target, value) in edges {
            descriptor = descriptor
                .with_hamiltonian(pool[source], pool[target], value)
                .with_lindblad_out(pool[source], pool[target], value.abs());
        }
        if descriptor.is_valid() {
            for (source, targets) in &descriptor.hamiltonian {
                prop_assert!(descriptor.in_signature(source.as_str()));
                for target in targets.keys() {
                    prop_assert!(descriptor.in_signature(target.as_str()));
                }
            }
            for targets in descriptor.lindblad_outgoing.values() {
                for target in targets.keys() {
                    prop_assert!(descriptor.in_signature(target.as_str()));
                }
            }
        }
    }
}
