use crate::gates::{CircuitGate, EvaluationVarsExt};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// `output = c0·m0·m1 + c1·addend`, `num_ops` times per row, on base field
/// wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArithmeticGate {
    /// The number of operations of a row.
    pub num_ops: usize,
}

impl ArithmeticGate {
    fn wire_ith_multiplicand_0(i: usize) -> usize {
        4 * i
    }

    fn wire_ith_multiplicand_1(i: usize) -> usize {
        4 * i + 1
    }

    fn wire_ith_addend(i: usize) -> usize {
        4 * i + 2
    }

    fn wire_ith_output(i: usize) -> usize {
        4 * i + 3
    }
}

impl CircuitGate for ArithmeticGate {
    fn id(&self) -> String {
        format!("{:?}", self)
    }

    fn num_wires(&self) -> usize {
        4 * self.num_ops
    }

    fn num_constants(&self) -> usize {
        2
    }

    fn num_constraints(&self) -> usize {
        self.num_ops
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let const_0 = vars.local_constants[0];
        let const_1 = vars.local_constants[1];

        (0..self.num_ops)
            .map(|i| {
                let multiplicand_0 = vars.local_wires[Self::wire_ith_multiplicand_0(i)];
                let multiplicand_1 = vars.local_wires[Self::wire_ith_multiplicand_1(i)];
                let addend = vars.local_wires[Self::wire_ith_addend(i)];
                let output = vars.local_wires[Self::wire_ith_output(i)];

                let product = multiplicand_0.mul(cs, &multiplicand_1);
                let scaled_addend = addend.mul(cs, &const_1);
                let computed = product.mul_add(cs, &const_0, &scaled_addend);
                output.sub(cs, &computed)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::ArithmeticGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::arithmetic_base::ArithmeticGate as PlonkyArithmeticGate;

    #[test]
    fn test_arithmetic_gate() {
        let theirs = PlonkyArithmeticGate { num_ops: 3 };
        check_against_plonky2(&Gate::Arithmetic(ArithmeticGate { num_ops: 3 }), &theirs);
    }
}
