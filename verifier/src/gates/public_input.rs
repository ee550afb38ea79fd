use crate::gates::{CircuitGate, EvaluationVarsExt};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{poseidon_goldilocks::HASH_OUT_LEN, ExtVar, TurboCS};

/// Binds the first four wires to the public inputs hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicInputGate;

impl CircuitGate for PublicInputGate {
    fn id(&self) -> String {
        "PublicInputGate".into()
    }

    fn num_wires(&self) -> usize {
        HASH_OUT_LEN
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        HASH_OUT_LEN
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        vars.public_inputs_hash
            .0
            .iter()
            .zip(vars.local_wires.iter())
            .map(|(hash_part, wire)| {
                let hash_part = ExtVar::from_base(cs, *hash_part);
                wire.sub(cs, &hash_part)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::PublicInputGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::public_input::PublicInputGate as PlonkyGate;

    #[test]
    fn test_public_input_gate() {
        check_against_plonky2(&Gate::PublicInput(PublicInputGate), &PlonkyGate);
    }
}
