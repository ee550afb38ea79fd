use crate::gates::{CircuitGate, EvaluationVarsExt, GOLDILOCKS_PHANTOM};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// `output = base^power`, with the power given by `num_power_bits` bits and
/// one intermediate value per square-and-multiply step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExponentiationGate {
    /// The number of bits of the power.
    pub num_power_bits: usize,
}

impl ExponentiationGate {
    const WIRE_BASE: usize = 0;

    fn wire_power_bit(i: usize) -> usize {
        1 + i
    }

    fn wire_output(&self) -> usize {
        1 + self.num_power_bits
    }

    fn wire_intermediate_value(&self, i: usize) -> usize {
        2 + self.num_power_bits + i
    }
}

impl CircuitGate for ExponentiationGate {
    fn id(&self) -> String {
        format!(
            "ExponentiationGate {{ num_power_bits: {}, _phantom: {} }}<D=2>",
            self.num_power_bits, GOLDILOCKS_PHANTOM
        )
    }

    fn num_wires(&self) -> usize {
        self.wire_intermediate_value(self.num_power_bits - 1) + 1
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        self.num_power_bits + 1
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let base = vars.local_wires[Self::WIRE_BASE];
        let one = ExtVar::one(cs);
        let n = self.num_power_bits;

        let mut constraints = Vec::with_capacity(self.num_constraints());
        for i in 0..n {
            let prev = if i == 0 {
                one
            } else {
                vars.local_wires[self.wire_intermediate_value(i - 1)].square(cs)
            };
            // bits are consumed from the most significant one
            let bit = vars.local_wires[Self::wire_power_bit(n - 1 - i)];
            let not_bit = one.sub(cs, &bit);
            let factor = bit.mul_add(cs, &base, &not_bit);
            let computed = prev.mul(cs, &factor);
            let intermediate = vars.local_wires[self.wire_intermediate_value(i)];
            constraints.push(computed.sub(cs, &intermediate));
        }

        let output = vars.local_wires[self.wire_output()];
        let last = vars.local_wires[self.wire_intermediate_value(n - 1)];
        constraints.push(output.sub(cs, &last));
        constraints
    }
}

#[cfg(test)]
mod test {
    use super::ExponentiationGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::exponentiation::ExponentiationGate as PlonkyGate;
    use plover_algebra::goldilocks::GoldilocksField;

    #[test]
    fn test_exponentiation_gate() {
        let theirs = PlonkyGate::<GoldilocksField, 2>::new(5);
        let ours = Gate::Exponentiation(ExponentiationGate { num_power_bits: 5 });
        check_against_plonky2(&ours, &theirs);
    }
}
