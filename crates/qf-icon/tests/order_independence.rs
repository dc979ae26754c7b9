use proptest::prelude::*;
use qf_faction::{FactionDescriptor, Ring};
use qf_icon::IconComposer;

const POOL: [&str; 5] = ["a", "b", "c", "d", "e"];

fn faction(idx: usize, terms: &[(usize, usize, i32)]) -> FactionDescriptor {
    let mut descriptor = FactionDescriptor::new(format!("faction-{idx}"), Ring::First, POOL);
    for &(source, target, weight) in terms {
        // quarter steps keep every partial sum exact
        let value = f64::from(weight) * 0.25;
        descriptor = descriptor
            .with_self_energy(POOL[source], value)
            .with_hamiltonian(POOL[source], POOL[target], value)
            .with_lindblad_out(POOL[source], POOL[target], value.abs())
            .with_decoherence(POOL[target], value);
    }
    descriptor
}

proptest! {
    #[test]
    fn summed_fields_ignore_order(
        terms in prop::collection::vec(
            prop::collection::vec((0usize..5, 0usize..5, -8i32..8), 0..6),
            1..5,
        ),
        rotation in 0usize..5,
    ) {
        let factions: Vec<FactionDescriptor> = terms
            .iter()
            .enumerate()
            .map(|(idx, t)| faction(idx, t))
            .collect();
        let forward: Vec<&FactionDescriptor> = factions.iter().collect();
        let mut rotated = forward.clone();
        let len = rotated.len();
        rotated.rotate_left(rotation % len);

        let a = IconComposer::compose(&forward);
        let b = IconComposer::compose(&rotated);
        prop_assert_eq!(a.len(), b.len());
        for icon in a.iter() {
            let other = b.get(icon.symbol.as_str()).expect("same symbols");
            prop_assert_eq!(icon.self_energy, other.self_energy);
            prop_assert_eq!(&icon.hamiltonian, &other.hamiltonian);
            prop_assert_eq!(&icon.lindblad_outgoing, &other.lindblad_outgoing);
            prop_assert_eq!(icon.decoherence, other.decoherence);
        }
    }
}
