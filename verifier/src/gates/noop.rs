use crate::gates::{CircuitGate, EvaluationVarsExt};
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// A gate without constraints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoopGate;

impl CircuitGate for NoopGate {
    fn id(&self) -> String {
        "NoopGate".into()
    }

    fn num_wires(&self) -> usize {
        0
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        0
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        _cs: &mut TurboCS<F>,
        _vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        Vec::new()
    }
}

#[cfg(test)]
mod test {
    use super::NoopGate;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::noop::NoopGate as PlonkyGate;

    #[test]
    fn test_noop_gate() {
        check_against_plonky2(&Gate::Noop(NoopGate), &PlonkyGate);
    }
}
