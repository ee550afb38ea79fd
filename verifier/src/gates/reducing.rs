use crate::gates::{flatten_algebra, CircuitGate, EvaluationVarsExt};
use crate::parameters::D;
use ark_std::ops::Range;
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtAlgebraVar, ExtVar, TurboCS};

/// Horner steps `acc = acc·α + c_i` over base field coefficients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReducingGate {
    /// The number of coefficients folded per row.
    pub num_coeffs: usize,
}

pub(crate) const WIRES_OUTPUT: Range<usize> = 0..D;
pub(crate) const WIRES_ALPHA: Range<usize> = D..2 * D;
pub(crate) const WIRES_OLD_ACC: Range<usize> = 2 * D..3 * D;
pub(crate) const START_COEFFS: usize = 3 * D;

/// The accumulator wires of step `i`; the last one is the output.
pub(crate) fn wires_accs(start_accs: usize, num_coeffs: usize, i: usize) -> Range<usize> {
    if i == num_coeffs - 1 {
        return WIRES_OUTPUT;
    }
    start_accs + D * i..start_accs + D * (i + 1)
}

/// Constrain `acc_i = acc_{i-1}·α + c_i` starting from the old accumulator.
pub(crate) fn horner_constraints<F: Scalar>(
    cs: &mut TurboCS<F>,
    vars: &EvaluationVarsExt<'_>,
    coeffs: &[ExtAlgebraVar],
    start_accs: usize,
) -> Vec<ExtVar> {
    let alpha = vars.get_local_ext_algebra(WIRES_ALPHA);
    let mut acc = vars.get_local_ext_algebra(WIRES_OLD_ACC);

    let constraints = coeffs
        .iter()
        .enumerate()
        .map(|(i, coeff)| {
            let next = vars.get_local_ext_algebra(wires_accs(start_accs, coeffs.len(), i));
            let computed = acc.mul_add(cs, &alpha, coeff);
            acc = next;
            computed.sub(cs, &next)
        })
        .collect();
    flatten_algebra(constraints)
}

impl ReducingGate {
    fn start_accs(&self) -> usize {
        START_COEFFS + self.num_coeffs
    }
}

impl CircuitGate for ReducingGate {
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
            .map(|i| ExtAlgebraVar::from_ext(cs, vars.local_wires[START_COEFFS + i]))
            .collect::<Vec<_>>();
        horner_constraints(cs, vars, &coeffs, self.start_accs())
    }
}
