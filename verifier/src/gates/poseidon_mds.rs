use crate::gates::{
    ext_algebra_weighted_sum, flatten_algebra, gl, CircuitGate, EvaluationVarsExt,
    GOLDILOCKS_PHANTOM,
};
use crate::parameters::D;
use plonky2::hash::poseidon::{Poseidon, SPONGE_WIDTH};
use plover_algebra::{goldilocks::GoldilocksField, prelude::*};
use plover_plonk::constraint_system::{ExtAlgebraVar, ExtVar, TurboCS};

/// The Poseidon MDS layer applied to extension algebra inputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoseidonMdsGate;

impl PoseidonMdsGate {
    fn wires_input(i: usize) -> std::ops::Range<usize> {
        i * D..(i + 1) * D
    }

    fn wires_output(i: usize) -> std::ops::Range<usize> {
        (SPONGE_WIDTH + i) * D..(SPONGE_WIDTH + i + 1) * D
    }

    fn mds_row(
        inputs: &[ExtAlgebraVar; SPONGE_WIDTH],
        r: usize,
    ) -> Vec<(ExtAlgebraVar, GoldilocksField)> {
        let circ = <GoldilocksField as Poseidon>::MDS_MATRIX_CIRC;
        let diag = <GoldilocksField as Poseidon>::MDS_MATRIX_DIAG;
        let mut terms = (0..SPONGE_WIDTH)
            .map(|i| (inputs[(i + r) % SPONGE_WIDTH], gl(circ[i])))
            .collect_vec();
        terms.push((inputs[r], gl(diag[r])));
        terms
    }
}

impl CircuitGate for PoseidonMdsGate {
    fn id(&self) -> String {
        format!("PoseidonMdsGate({})<WIDTH={}>", GOLDILOCKS_PHANTOM, SPONGE_WIDTH)
    }

    fn num_wires(&self) -> usize {
        2 * D * SPONGE_WIDTH
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        SPONGE_WIDTH * D
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let inputs: [ExtAlgebraVar; SPONGE_WIDTH] =
            core::array::from_fn(|i| vars.get_local_ext_algebra(Self::wires_input(i)));

        let constraints = (0..SPONGE_WIDTH)
            .map(|r| {
                let computed = ext_algebra_weighted_sum(cs, &Self::mds_row(&inputs, r));
                let output = vars.get_local_ext_algebra(Self::wires_output(r));
                output.sub(cs, &computed)
            })
            .collect();
        flatten_algebra(constraints)
    }
}
