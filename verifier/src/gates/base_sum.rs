use crate::gates::{ext_constant, gl, CircuitGate, EvaluationVarsExt};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// Decomposes wire 0 into `num_limbs` little-endian limbs in base `base`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseSumGate {
    /// The number of limbs.
    pub num_limbs: usize,
    /// The base of the limbs.
    pub base: usize,
}

impl BaseSumGate {
    const WIRE_SUM: usize = 0;
    const START_LIMBS: usize = 1;
}

impl CircuitGate for BaseSumGate {
    fn id(&self) -> String {
        format!(
            "BaseSumGate {{ num_limbs: {} }} + Base: {}",
            self.num_limbs, self.base
        )
    }

    fn num_wires(&self) -> usize {
        Self::START_LIMBS + self.num_limbs
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        1 + self.num_limbs
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let sum = vars.local_wires[Self::WIRE_SUM];
        let limbs = &vars.local_wires[Self::START_LIMBS..Self::START_LIMBS + self.num_limbs];

        let base = ext_constant(cs, gl(self.base as u64));
        let computed_sum = ExtVar::reduce_with_powers(cs, limbs, &base);
        let mut constraints = vec![computed_sum.sub(cs, &sum)];

        for limb in limbs {
            let mut product = *limb;
            for digit in 1..self.base {
                let digit = ext_constant(cs, gl(digit as u64));
                let term = limb.sub(cs, &digit);
                product = product.mul(cs, &term);
            }
            constraints.push(product);
        }
        constraints
    }
}

#[cfg(test)]
mod test {
    use super::BaseSumGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::base_sum::BaseSumGate as PlonkyGate;

    #[test]
    fn test_base_sum_gate() {
        let ours = Gate::BaseSum(BaseSumGate {
            num_limbs: 11,
            base: 2,
        });
        check_against_plonky2(&ours, &PlonkyGate::<2>::new(11));

        let ours = Gate::BaseSum(BaseSumGate {
            num_limbs: 5,
            base: 4,
        });
        check_against_plonky2(&ours, &PlonkyGate::<4>::new(5));
    }
}
