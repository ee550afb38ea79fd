use crate::gates::reducing::{horner_constraints, START_COEFFS};
use crate::gates::{CircuitGate, EvaluationVarsExt};
use crate::parameters::D;
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// Horner steps `acc = acc·α + c_i` over extension coefficients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReducingExtensionGate {
    /// The number of coefficients folded per row.
    pub num_coeffs: usize,
}

impl ReducingExtensionGate {
    fn wires_coeff(i: usize) -> std::ops::Range<usize> {
        START_COEFFS + D * i..START_COEFFS + D * (i + 1)
    }

    fn start_accs(&self) -> usize {
        START_COEFFS + D * self.num_coeffs
    }
}

impl CircuitGate for ReducingExtensionGate {
    fn id(&self) -> String {
        format!("{:?}", self)
    }

    fn num_wires(&self) -> usize {
        self.start_accs() + D * (self.num_coeffs - 1)
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        D * self.num_coeffs
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let coeffs = (0..self.num_coeffs)
            .map(|i| vars.get_local_ext_algebra(Self::wires_coeff(i)))
            .collect::<Vec<_>>();
        horner_constraints(cs, vars, &coeffs, self.start_accs())
    }
}
