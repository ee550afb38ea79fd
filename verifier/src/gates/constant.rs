use crate::gates::{CircuitGate, EvaluationVarsExt};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// Copies constant columns into wires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantGate {
    /// The number of constants copied.
    pub num_consts: usize,
}

impl CircuitGate for ConstantGate {
    fn id(&self) -> String {
        format!("{:?}", self)
    }

    fn num_wires(&self) -> usize {
        self.num_consts
    }

    fn num_constants(&self) -> usize {
        self.num_consts
    }

    fn num_constraints(&self) -> usize {
        self.num_consts
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        (0..self.num_consts)
            .map(|i| vars.local_constants[i].sub(cs, &vars.local_wires[i]))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::ConstantGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::constant::ConstantGate as PlonkyGate;

    #[test]
    fn test_constant_gate() {
        let ours = Gate::Constant(ConstantGate { num_consts: 2 });
        check_against_plonky2(&ours, &PlonkyGate::new(2));
    }
}
