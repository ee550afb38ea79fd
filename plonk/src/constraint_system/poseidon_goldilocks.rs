use crate::constraint_system::{GoldilocksVar, TurboCS};
use plonky2::hash::poseidon::{
    Poseidon, ALL_ROUND_CONSTANTS, HALF_N_FULL_ROUNDS, N_PARTIAL_ROUNDS, SPONGE_RATE, SPONGE_WIDTH,
};
use plover_algebra::{
    goldilocks::{Field, GoldilocksField},
    prelude::*,
};

/// The number of elements of a Goldilocks Poseidon digest.
pub const HASH_OUT_LEN: usize = 4;

/// The sponge state variables.
pub type PoseidonStateVar = [GoldilocksVar; SPONGE_WIDTH];

/// The variables of a Goldilocks Poseidon digest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashOutVar(pub [GoldilocksVar; HASH_OUT_LEN]);

impl HashOutVar {
    /// Alloc a witness digest.
    pub fn alloc_witness<F: Scalar>(
        cs: &mut TurboCS<F>,
        elements: &[GoldilocksField; HASH_OUT_LEN],
    ) -> Self {
        Self(elements.map(|e| GoldilocksVar::alloc_witness(cs, e)))
    }

    /// Return the digest the variables hold.
    pub fn value<F: Scalar>(&self, cs: &TurboCS<F>) -> [GoldilocksField; HASH_OUT_LEN] {
        self.0.map(|e| e.value(cs))
    }
}

fn gl(c: u64) -> GoldilocksField {
    GoldilocksField::from_canonical_u64(c)
}

impl<F: Scalar> TurboCS<F> {
    /// Return `x^7` reduced, with a reduction after `x^3`.
    fn poseidon_sbox(&mut self, x: &GoldilocksVar) -> GoldilocksVar {
        let x = x.reduce(self);
        let x2 = x.mul_no_reduce(self, &x);
        let x3 = x2.mul_no_reduce(self, &x).reduce(self);
        let x6 = x3.mul_no_reduce(self, &x3);
        x6.mul_no_reduce(self, &x).reduce(self)
    }

    fn poseidon_constant_layer(&mut self, state: &mut PoseidonStateVar, round_ctr: usize) {
        for (i, s) in state.iter_mut().enumerate() {
            let c = ALL_ROUND_CONSTANTS[i + SPONGE_WIDTH * round_ctr];
            *s = s.add_const_no_reduce(self, gl(c));
        }
    }

    fn poseidon_mds_layer(&mut self, state: &PoseidonStateVar) -> PoseidonStateVar {
        let circ = <GoldilocksField as Poseidon>::MDS_MATRIX_CIRC;
        let diag = <GoldilocksField as Poseidon>::MDS_MATRIX_DIAG;
        let mut out = *state;
        for (r, o) in out.iter_mut().enumerate() {
            let mut terms = (0..SPONGE_WIDTH)
                .map(|i| (state[(i + r) % SPONGE_WIDTH], gl(circ[i])))
                .collect_vec();
            terms.push((state[r], gl(diag[r])));
            *o = GoldilocksVar::weighted_sum_no_reduce(self, &terms);
        }
        out
    }

    fn poseidon_full_rounds(&mut self, state: &mut PoseidonStateVar, round_ctr: &mut usize) {
        for _ in 0..HALF_N_FULL_ROUNDS {
            self.poseidon_constant_layer(state, *round_ctr);
            for s in state.iter_mut() {
                *s = self.poseidon_sbox(s);
            }
            *state = self.poseidon_mds_layer(state);
            *round_ctr += 1;
        }
    }

    /// The partial rounds in their fast form: an initial dense matrix, then
    /// per round a sparse matrix given by `w_hats` and `vs`. Only lane 0 is
    /// reduced per round.
    fn poseidon_partial_rounds(&mut self, state: &mut PoseidonStateVar, round_ctr: &mut usize) {
        let first = <GoldilocksField as Poseidon>::FAST_PARTIAL_FIRST_ROUND_CONSTANT;
        for (s, c) in state.iter_mut().zip(first.iter()) {
            *s = s.add_const_no_reduce(self, gl(*c));
        }

        let initial = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_INITIAL_MATRIX;
        let mut next = *state;
        for c in 1..SPONGE_WIDTH {
            let terms = (1..SPONGE_WIDTH)
                .map(|r| (state[r], gl(initial[r - 1][c - 1])))
                .collect_vec();
            next[c] = GoldilocksVar::weighted_sum_no_reduce(self, &terms).reduce(self);
        }
        *state = next;

        let circ = <GoldilocksField as Poseidon>::MDS_MATRIX_CIRC;
        let diag = <GoldilocksField as Poseidon>::MDS_MATRIX_DIAG;
        let round_constants = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_CONSTANTS;
        let w_hats = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_W_HATS;
        let vs = <GoldilocksField as Poseidon>::FAST_PARTIAL_ROUND_VS;
        for r in 0..N_PARTIAL_ROUNDS {
            let s0 = self
                .poseidon_sbox(&state[0])
                .add_const_no_reduce(self, gl(round_constants[r]));

            let mut terms = vec![(s0, gl(circ[0] + diag[0]))];
            terms.extend((1..SPONGE_WIDTH).map(|i| (state[i], gl(w_hats[r][i - 1]))));
            let d_sum = GoldilocksVar::weighted_sum_no_reduce(self, &terms);

            for i in 1..SPONGE_WIDTH {
                let t = s0.mul_const_no_reduce(self, gl(vs[r][i - 1]));
                state[i] = state[i].add_no_reduce(self, &t);
            }
            state[0] = d_sum;
        }
        for s in state.iter_mut() {
            *s = s.reduce(self);
        }
        *round_ctr += N_PARTIAL_ROUNDS;
    }

    /// Apply the width-12 Goldilocks Poseidon permutation.
    pub fn poseidon_goldilocks_permute(&mut self, state: &PoseidonStateVar) -> PoseidonStateVar {
        let mut state = *state;
        let mut round_ctr = 0;
        self.poseidon_full_rounds(&mut state, &mut round_ctr);
        self.poseidon_partial_rounds(&mut state, &mut round_ctr);
        self.poseidon_full_rounds(&mut state, &mut round_ctr);
        for s in state.iter_mut() {
            *s = s.reduce(self);
        }
        state
    }

    /// Absorb `inputs` in chunks of `SPONGE_RATE`, overwriting the state, and
    /// squeeze `num_outputs` elements.
    pub fn poseidon_goldilocks_hash_n_to_m_no_pad(
        &mut self,
        inputs: &[GoldilocksVar],
        num_outputs: usize,
    ) -> Vec<GoldilocksVar> {
        let zero = GoldilocksVar::zero(self);
        let mut state = [zero; SPONGE_WIDTH];
        for chunk in inputs.chunks(SPONGE_RATE) {
            for (s, input) in state.iter_mut().zip(chunk.iter()) {
                *s = input.reduce(self);
            }
            state = self.poseidon_goldilocks_permute(&state);
        }

        let mut outputs = Vec::with_capacity(num_outputs);
        loop {
            for s in state.iter().take(SPONGE_RATE) {
                outputs.push(*s);
                if outputs.len() == num_outputs {
                    return outputs;
                }
            }
            state = self.poseidon_goldilocks_permute(&state);
        }
    }

    /// Hash without padding into a four element digest. An empty input gives
    /// the all-zero digest.
    pub fn poseidon_goldilocks_hash_no_pad(&mut self, inputs: &[GoldilocksVar]) -> HashOutVar {
        let out = self.poseidon_goldilocks_hash_n_to_m_no_pad(inputs, HASH_OUT_LEN);
        HashOutVar([out[0], out[1], out[2], out[3]])
    }
}

#[cfg(test)]
mod test {
    use crate::constraint_system::{GoldilocksVar, TurboCS};
    use plonky2::hash::poseidon::{Poseidon, PoseidonHash, SPONGE_WIDTH};
    use plonky2::plonk::config::Hasher;
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{Field, GoldilocksField, PrimeField64, GOLDILOCKS_MODULUS},
        prelude::*,
    };

    type F = BN254Scalar;

    fn gl(v: u64) -> GoldilocksField {
        GoldilocksField::from_canonical_u64(v)
    }

    #[test]
    fn test_permutation() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let input: [GoldilocksField; SPONGE_WIDTH] =
            core::array::from_fn(|_| gl(rng.next_u64() % GOLDILOCKS_MODULUS));
        let input_var = input.map(|x| GoldilocksVar::alloc_witness(&mut cs, x));
        let output_var = cs.poseidon_goldilocks_permute(&input_var);

        let expected = GoldilocksField::poseidon(input);
        for (o, e) in output_var.iter().zip(expected.iter()) {
            assert_eq!(o.value(&cs), *e);
            assert_eq!(o.bits, 64);
        }

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        witness[output_var[5].var].add_assign(&F::one());
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }

    #[test]
    fn test_public_inputs_hash() {
        let mut cs = TurboCS::<F>::new();
        let inputs = [0, 1, 3736710860384812976u64].map(|x| GoldilocksVar::alloc_witness(&mut cs, gl(x)));
        let hash = cs.poseidon_goldilocks_hash_no_pad(&inputs);
        assert_eq!(
            hash.value(&cs).map(|x| x.to_canonical_u64()),
            [
                8416658900775745054,
                12574228347150446423,
                9629056739760131473,
                3119289788404190010
            ]
        );
        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }

    #[test]
    fn test_hash_no_pad_matches_native() {
        let mut rng = test_rng();
        for n in [0usize, 5, 8, 11] {
            let mut cs = TurboCS::<F>::new();
            let inputs = (0..n)
                .map(|_| gl(rng.next_u64() % GOLDILOCKS_MODULUS))
                .collect::<Vec<_>>();
            let input_vars = inputs
                .iter()
                .map(|x| GoldilocksVar::alloc_witness(&mut cs, *x))
                .collect::<Vec<_>>();
            let hash = cs.poseidon_goldilocks_hash_no_pad(&input_vars);
            assert_eq!(hash.value(&cs), PoseidonHash::hash_no_pad(&inputs).elements);

            let squeezed = cs.poseidon_goldilocks_hash_n_to_m_no_pad(&input_vars, 10);
            assert_eq!(squeezed.len(), 10);
            assert_eq!(squeezed[0].value(&cs), hash.value(&cs)[0]);

            let witness = cs.get_and_clear_witness();
            assert!(cs.verify_witness(&witness, &[]).is_ok());
        }
    }
}
