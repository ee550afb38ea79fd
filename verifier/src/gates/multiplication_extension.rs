use crate::gates::{flatten_algebra, CircuitGate, EvaluationVarsExt};
use crate::parameters::D;
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// `output = c0·m0·m1` on extension wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MulExtensionGate {
    /// The number of operations of a row.
    pub num_ops: usize,
}

impl MulExtensionGate {
    fn wires_ith(i: usize, offset: usize) -> std::ops::Range<usize> {
        let start = 3 * D * i + offset * D;
        start..start + D
    }
}

impl CircuitGate for MulExtensionGate {
    fn id(&self) -> String {
        format!("{:?}", self)
    }

    fn num_wires(&self) -> usize {
        3 * D * self.num_ops
    }

    fn num_constants(&self) -> usize {
        1
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

        let constraints = (0..self.num_ops)
            .map(|i| {
                let multiplicand_0 = vars.get_local_ext_algebra(Self::wires_ith(i, 0));
                let multiplicand_1 = vars.get_local_ext_algebra(Self::wires_ith(i, 1));
                let output = vars.get_local_ext_algebra(Self::wires_ith(i, 2));

                let computed = multiplicand_0
                    .mul(cs, &multiplicand_1)
                    .scalar_mul(cs, &const_0);
                output.sub(cs, &computed)
            })
            .collect();
        flatten_algebra(constraints)
    }
}

#[cfg(test)]
mod test {
    use super::MulExtensionGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::multiplication_extension::MulExtensionGate as PlonkyGate;

    #[test]
    fn test_mul_extension_gate() {
        let theirs = PlonkyGate { num_ops: 3 };
        let ours = Gate::MulExtension(MulExtensionGate { num_ops: 3 });
        check_against_plonky2(&ours, &theirs);
    }
}
