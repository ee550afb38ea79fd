use crate::gates::{flatten_algebra, CircuitGate, EvaluationVarsExt};
use crate::parameters::D;
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// `output = c0·m0·m1 + c1·addend` on extension wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArithmeticExtensionGate {
    /// The number of operations of a row.
    pub num_ops: usize,
}

impl ArithmeticExtensionGate {
    fn wires_ith_multiplicand_0(i: usize) -> std::ops::Range<usize> {
        4 * D * i..4 * D * i + D
    }

    fn wires_ith_multiplicand_1(i: usize) -> std::ops::Range<usize> {
        4 * D * i + D..4 * D * i + 2 * D
    }

    fn wires_ith_addend(i: usize) -> std::ops::Range<usize> {
        4 * D * i + 2 * D..4 * D * i + 3 * D
    }

    fn wires_ith_output(i: usize) -> std::ops::Range<usize> {
        4 * D * i + 3 * D..4 * D * i + 4 * D
    }
}

impl CircuitGate for ArithmeticExtensionGate {
    fn id(&self) -> String {
        format!("{:?}", self)
    }

    fn num_wires(&self) -> usize {
        4 * D * self.num_ops
    }

    fn num_constants(&self) -> usize {
        2
    }

    fn num_constraints(&self) -> usize {
        D * self.num_ops
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let const_0 = vars.local_constants[0];
        let const_1 = vars.local_constants[1];

        let constraints = (0..self.num_ops)
            .map(|i| {
                let multiplicand_0 = vars.get_local_ext_algebra(Self::wires_ith_multiplicand_0(i));
                let multiplicand_1 = vars.get_local_ext_algebra(Self::wires_ith_multiplicand_1(i));
                let addend = vars.get_local_ext_algebra(Self::wires_ith_addend(i));
                let output = vars.get_local_ext_algebra(Self::wires_ith_output(i));

                let product = multiplicand_0
                    .mul(cs, &multiplicand_1)
                    .scalar_mul(cs, &const_0);
                let scaled_addend = addend.scalar_mul(cs, &const_1);
                let computed = product.add(cs, &scaled_addend);
                output.sub(cs, &computed)
            })
            .collect();
        flatten_algebra(constraints)
    }
}

#[cfg(test)]
mod test {
    use super::ArithmeticExtensionGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::arithmetic_extension::ArithmeticExtensionGate as PlonkyGate;

    #[test]
    fn test_arithmetic_extension_gate() {
        let theirs = PlonkyGate { num_ops: 2 };
        let ours = Gate::ArithmeticExtension(ArithmeticExtensionGate { num_ops: 2 });
        check_against_plonky2(&ours, &theirs);
    }
}
