use crate::gates::{ext_weighted_sum, gl, CircuitGate, EvaluationVarsExt, GOLDILOCKS_PHANTOM};
use plonky2::hash::poseidon::{
    Poseidon, ALL_ROUND_CONSTANTS, HALF_N_FULL_ROUNDS, N_PARTIAL_ROUNDS, SPONGE_WIDTH,
};
use plover_algebra::{goldilocks::GoldilocksField, prelude::*};
use plover_plonk::constraint_system::{ExtVar, TurboCS};

type StateVar = [ExtVar; SPONGE_WIDTH];

/// One Poseidon permutation per row, with an optional swap of the first two
/// digests of the input and the S-box inputs as witnesses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoseidonGate;

impl PoseidonGate {
    fn wire_input(i: usize) -> usize {
        i
    }

    fn wire_output(i: usize) -> usize {
        SPONGE_WIDTH + i
    }

    const WIRE_SWAP: usize = 2 * SPONGE_WIDTH;

    const START_DELTA: usize = 2 * SPONGE_WIDTH + 1;

    fn wire_delta(i: usize) -> usize {
        assert!(i < 4);
        Self::START_DELTA + i
    }

    const START_FULL_0: usize = Self::START_DELTA + 4;

    fn wire_full_sbox_0(round: usize, i: usize) -> usize {
        assert!(round != 0, "the first round has no S-box input wires");
        Self::START_FULL_0 + SPONGE_WIDTH * (round - 1) + i
    }

    const START_PARTIAL: usize = Self::START_FULL_0 + SPONGE_WIDTH * (HALF_N_FULL_ROUNDS - 1);

    fn wire_partial_sbox(round: usize) -> usize {
        Self::START_PARTIAL + round
    }

    const START_FULL_1: usize = Self::START_PARTIAL + N_PARTIAL_ROUNDS;

    fn wire_full_sbox_1(round: usize, i: usize) -> usize {
        Self::START_FULL_1 + SPONGE_WIDTH * round + i
    }

    fn end() -> usize {
        Self::START_FULL_1 + SPONGE_WIDTH * HALF_N_FULL_ROUNDS
    }
}

fn add_base_constant<F: Scalar>(cs: &mut TurboCS<F>, x: &ExtVar, c: u64) -> ExtVar {
    ExtVar([x.0[0].add_const_no_reduce(cs, gl(c)).reduce(cs), x.0[1]])
}

fn sbox<F: Scalar>(cs: &mut TurboCS<F>, x: &ExtVar) -> ExtVar {
    let x2 = x.square(cs);
    let x3 = x2.mul(cs, x);
    let x4 = x2.square(cs);
    x4.mul(cs, &x3)
}

fn mds_layer<F: Scalar>(cs: &mut TurboCS<F>, state: &StateVar) -> StateVar {
    let circ = <GoldilocksField as Poseidon>::MDS_MATRIX_CIRC;
    let diag = <GoldilocksField as Poseidon>::MDS_MATRIX_DIAG;
    core::array::from_fn(|r| {
        let mut terms = (0..SPONGE_WIDTH)
            .map(|i| (state[(i + r) % SPONGE_WIDTH], gl(circ[i])))
            .collect_vec();
        terms.push((state[r], gl(diag[r])));
        ext_weighted_sum(cs, &terms)
    })
}

fn mds_partial_layer_init<F: Scalar>(cs: &mut TurboCS<F>, state: &StateVar) -> StateVar {
    let initial = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_INITIAL_MATRIX;
    core::array::from_fn(|c| {
        if c == 0 {
            return state[0];
        }
        let terms = (1..SPONGE_WIDTH)
            .map(|r| (state[r], gl(initial[r - 1][c - 1])))
            .collect_vec();
        ext_weighted_sum(cs, &terms)
    })
}

fn mds_partial_layer_fast<F: Scalar>(cs: &mut TurboCS<F>, state: &StateVar, r: usize) -> StateVar {
    let circ = <GoldilocksField as Poseidon>::MDS_MATRIX_CIRC;
    let diag = <GoldilocksField as Poseidon>::MDS_MATRIX_DIAG;
    let w_hats = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_W_HATS;
    let vs = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_VS;

    core::array::from_fn(|i| {
        if i == 0 {
            let mut terms = vec![(state[0], gl(circ[0] + diag[0]))];
            terms.extend((1..SPONGE_WIDTH).map(|j| (state[j], gl(w_hats[r][j - 1]))));
            ext_weighted_sum(cs, &terms)
        } else {
            ext_weighted_sum(cs, &[(state[0], gl(vs[r][i - 1])), (state[i], gl(1))])
        }
    })
}

impl CircuitGate for PoseidonGate {
    fn id(&self) -> String {
        format!("PoseidonGate({})<WIDTH={}>", GOLDILOCKS_PHANTOM, SPONGE_WIDTH)
    }

    fn num_wires(&self) -> usize {
        Self::end()
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        SPONGE_WIDTH * (HALF_N_FULL_ROUNDS - 1)
            + N_PARTIAL_ROUNDS
            + SPONGE_WIDTH * HALF_N_FULL_ROUNDS
            + SPONGE_WIDTH
            + 1
            + 4
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let wires = vars.local_wires;
        let mut constraints = Vec::with_capacity(self.num_constraints());

        let one = ExtVar::one(cs);
        let swap = wires[Self::WIRE_SWAP];
        let swap_minus_one = swap.sub(cs, &one);
        constraints.push(swap.mul(cs, &swap_minus_one));

        for i in 0..4 {
            let lhs = wires[Self::wire_input(i)];
            let rhs = wires[Self::wire_input(i + 4)];
            let delta = wires[Self::wire_delta(i)];
            let diff = rhs.sub(cs, &lhs);
            let swapped = swap.mul(cs, &diff);
            constraints.push(swapped.sub(cs, &delta));
        }

        let mut state: StateVar = core::array::from_fn(|i| wires[Self::wire_input(i)]);
        for i in 0..4 {
            let delta = wires[Self::wire_delta(i)];
            state[i] = wires[Self::wire_input(i)].add(cs, &delta);
            state[i + 4] = wires[Self::wire_input(i + 4)].sub(cs, &delta);
        }

        let mut round_ctr = 0;
        for r in 0..HALF_N_FULL_ROUNDS {
            for (i, s) in state.iter_mut().enumerate() {
                *s = add_base_constant(cs, s, ALL_ROUND_CONSTANTS[i + SPONGE_WIDTH * round_ctr]);
            }
            if r != 0 {
                for (i, s) in state.iter_mut().enumerate() {
                    let sbox_in = wires[Self::wire_full_sbox_0(r, i)];
                    constraints.push(s.sub(cs, &sbox_in));
                    *s = sbox_in;
                }
            }
            for s in state.iter_mut() {
                *s = sbox(cs, s);
            }
            state = mds_layer(cs, &state);
            round_ctr += 1;
        }

        let first = <GoldilocksField as Poseidon>::FAST_PARTIAL_FIRST_ROUND_CONSTANT;
        for (s, c) in state.iter_mut().zip(first.iter()) {
            *s = add_base_constant(cs, s, *c);
        }
        state = mds_partial_layer_init(cs, &state);
        let round_constants = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_CONSTANTS;
        for r in 0..N_PARTIAL_ROUNDS {
            let sbox_in = wires[Self::wire_partial_sbox(r)];
            constraints.push(state[0].sub(cs, &sbox_in));
            state[0] = sbox(cs, &sbox_in);
            // the last partial round has no constant
            if r < N_PARTIAL_ROUNDS - 1 {
                state[0] = add_base_constant(cs, &state[0], round_constants[r]);
            }
            state = mds_partial_layer_fast(cs, &state, r);
        }
        round_ctr += N_PARTIAL_ROUNDS;

        for r in 0..HALF_N_FULL_ROUNDS {
            for (i, s) in state.iter_mut().enumerate() {
                *s = add_base_constant(cs, s, ALL_ROUND_CONSTANTS[i + SPONGE_WIDTH * round_ctr]);
            }
            for (i, s) in state.iter_mut().enumerate() {
                let sbox_in = wires[Self::wire_full_sbox_1(r, i)];
                constraints.push(s.sub(cs, &sbox_in));
                *s = sbox_in;
            }
            for s in state.iter_mut() {
                *s = sbox(cs, s);
            }
            state = mds_layer(cs, &state);
            round_ctr += 1;
        }

        for (i, s) in state.iter().enumerate() {
            let output = wires[Self::wire_output(i)];
            constraints.push(s.sub(cs, &output));
        }
        constraints
    }
}

#[cfg(test)]
mod test {
    use super::PoseidonGate;
    use crate::gates::{test_utils::check_against_plonky2, CircuitGate, Gate};
    use plonky2::gates::poseidon::PoseidonGate as PlonkyGate;
    use plover_algebra::goldilocks::GoldilocksField;

    #[test]
    fn test_poseidon_gate() {
        let theirs = PlonkyGate::<GoldilocksField, 2>::new();
        check_against_plonky2(&Gate::Poseidon(PoseidonGate), &theirs);
        assert_eq!(PoseidonGate.num_wires(), 135);
        assert_eq!(PoseidonGate.num_constraints(), 123);
    }
}
