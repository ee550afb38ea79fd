use crate::constraint_system::{GoldilocksVar, TurboCS, VarIndex};
use num_bigint::BigUint;
use plover_algebra::{bn254::BN254Scalar, goldilocks::PrimeField64, prelude::*};
use plover_crypto::poseidon_bn254::{
    PoseidonBN254, DIGEST_LIMBS, DIGEST_LIMB_BITS, GOLDILOCKS_PER_LANE, POSEIDON_BN254_PARAMS,
    POSEIDON_BN254_RATE, POSEIDON_BN254_WIDTH,
};

/// A native digest held in one variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeHashVar(pub VarIndex);

/// The sponge state variables.
pub type NativeStateVar = [VarIndex; POSEIDON_BN254_WIDTH];

impl TurboCS<BN254Scalar> {
    /// Allocate a native digest as a witness.
    pub fn new_native_hash_variable(&mut self, value: BN254Scalar) -> NativeHashVar {
        NativeHashVar(self.new_variable(value))
    }

    /// Apply the width-4 Poseidon permutation. The constants of round 0 are
    /// added first; afterwards every round is one gate per lane computing
    /// `Σ_j M[i][j]·S(x_j) + c_{r+1}[i]`, where `S` is `x^5` on the lanes
    /// the round applies the S-box to and the identity elsewhere.
    pub fn poseidon_bn254_permute(&mut self, state: &NativeStateVar) -> NativeStateVar {
        let params = &*POSEIDON_BN254_PARAMS;
        let n_rounds = params.full_rounds + params.partial_rounds;
        let half = params.full_rounds / 2;
        let zero = BN254Scalar::zero();

        let mut state: NativeStateVar = core::array::from_fn(|i| {
            self.add_constant(state[i], &params.round_constants[0][i])
        });

        for r in 0..n_rounds {
            let full = r < half || r >= half + params.partial_rounds;
            let next_constants = params.round_constants.get(r + 1);
            let next: NativeStateVar = core::array::from_fn(|i| {
                let row = &params.mds[i];
                let constant = next_constants.map(|c| c[i]).unwrap_or(zero);
                let (linear, power_five) = if full {
                    ([zero; 4], [row[0], row[1], row[2], row[3]])
                } else {
                    ([zero, row[1], row[2], row[3]], [row[0], zero, zero, zero])
                };
                self.power_five_combine(&state, &linear, &power_five, constant)
            });
            state = next;
        }
        state
    }

    /// Pack up to three canonical Goldilocks elements into one lane.
    fn pack_goldilocks_lane(&mut self, values: &[GoldilocksVar], shift_bits: usize) -> VarIndex {
        assert!(values.len() <= GOLDILOCKS_PER_LANE);
        let zero_var = self.zero_var();
        let mut wires = [zero_var; 4];
        let mut coefs = [BN254Scalar::zero(); 4];
        for (i, v) in values.iter().enumerate() {
            let v = v.reduce(self);
            wires[i] = v.var;
            coefs[i] = BN254Scalar::from(&(BigUint::one() << (shift_bits * i)));
        }
        self.linear_combine(&wires, coefs[0], coefs[1], coefs[2], coefs[3])
    }

    /// Absorb windows of nine Goldilocks elements, three per lane into lanes
    /// 1..=3, permuting after each window; the digest is lane 0.
    pub fn poseidon_bn254_hash_no_pad(&mut self, inputs: &[GoldilocksVar]) -> NativeHashVar {
        let zero_var = self.zero_var();
        let mut state = [zero_var; POSEIDON_BN254_WIDTH];
        for window in inputs.chunks(GOLDILOCKS_PER_LANE * POSEIDON_BN254_RATE) {
            for (j, lane) in window.chunks(GOLDILOCKS_PER_LANE).enumerate() {
                state[j + 1] = self.pack_goldilocks_lane(lane, 64);
            }
            state = self.poseidon_bn254_permute(&state);
        }
        NativeHashVar(state[0])
    }

    /// Leaves of at most three elements are packed with 32-bit shifts, longer
    /// ones are hashed.
    pub fn poseidon_bn254_hash_or_noop(&mut self, inputs: &[GoldilocksVar]) -> NativeHashVar {
        if inputs.len() <= POSEIDON_BN254_RATE {
            NativeHashVar(self.pack_goldilocks_lane(inputs, 32))
        } else {
            self.poseidon_bn254_hash_no_pad(inputs)
        }
    }

    /// Compress two digests by permuting `[0, 0, left, right]`.
    pub fn poseidon_bn254_two_to_one(
        &mut self,
        left: &NativeHashVar,
        right: &NativeHashVar,
    ) -> NativeHashVar {
        let zero_var = self.zero_var();
        let state = self.poseidon_bn254_permute(&[zero_var, zero_var, left.0, right.0]);
        NativeHashVar(state[0])
    }

    /// Split a digest into 56-bit little-endian limbs; the top limb holds the
    /// remaining bits. The limbs are checked to encode a value below the
    /// field modulus, so the split is unique.
    pub fn poseidon_bn254_to_vec(&mut self, hash: &NativeHashVar) -> [GoldilocksVar; DIGEST_LIMBS] {
        let limbs = self.new_hint(&[hash.0], DIGEST_LIMBS, |v| {
            PoseidonBN254::to_vec(&v[0])
                .iter()
                .map(|l| BN254Scalar::from(l.to_canonical_u64()))
                .collect()
        });
        let top_bits = BN254Scalar::field_size_bits() - DIGEST_LIMB_BITS * (DIGEST_LIMBS - 1);
        for (i, limb) in limbs.iter().enumerate() {
            let n_bits = if i == DIGEST_LIMBS - 1 {
                top_bits
            } else {
                DIGEST_LIMB_BITS
            };
            self.range_check(*limb, n_bits);
        }

        let shift = |i: usize| BN254Scalar::from(&(BigUint::one() << (DIGEST_LIMB_BITS * i)));
        let low = self.linear_combine(
            &[limbs[0], limbs[1], limbs[2], limbs[3]],
            BN254Scalar::one(),
            shift(1),
            shift(2),
            shift(3),
        );
        let zero = BN254Scalar::zero();
        self.insert_lc_gate(
            &[low, limbs[4], 0, 0],
            hash.0,
            BN254Scalar::one(),
            shift(4),
            zero,
            zero,
        );

        // top < r_top, or top == r_top and low < r_low
        let modulus = BN254Scalar::get_field_size_biguint();
        let low_bits = DIGEST_LIMB_BITS * (DIGEST_LIMBS - 1);
        let r_top = BN254Scalar::from(&(&modulus >> low_bits));
        let r_low = BN254Scalar::from(&(&modulus % (BigUint::one() << low_bits)));
        let one = BN254Scalar::one();

        let top_minus_r = self.add_constant(limbs[4], &r_top.neg());
        let top_is_max = self.is_zero(top_minus_r);
        let top_gap = self.linear_combine_with_constant(
            &[limbs[4], top_is_max, 0, 0],
            [one.neg(), one, zero, zero],
            r_top.sub(&one),
        );
        self.range_check(top_gap, top_bits);

        let low_gap = self.linear_combine_with_constant(
            &[low, 0, 0, 0],
            [one.neg(), zero, zero, zero],
            r_low.sub(&one),
        );
        let zero_var = self.zero_var();
        let low_gap = self.select(zero_var, low_gap, top_is_max);
        self.range_check(low_gap, low_bits);

        core::array::from_fn(|i| GoldilocksVar {
            var: limbs[i],
            bits: if i == DIGEST_LIMBS - 1 {
                top_bits
            } else {
                DIGEST_LIMB_BITS
            },
        })
    }
}

#[cfg(test)]
mod test {
    use crate::constraint_system::{GoldilocksVar, TurboCS};
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{Field, GoldilocksField, GOLDILOCKS_MODULUS},
        prelude::*,
    };
    use plover_crypto::poseidon_bn254::PoseidonBN254;

    type F = BN254Scalar;

    fn random_goldilocks<R: RngCore>(rng: &mut R, n: usize) -> Vec<GoldilocksField> {
        (0..n)
            .map(|_| GoldilocksField::from_canonical_u64(rng.next_u64() % GOLDILOCKS_MODULUS))
            .collect()
    }

    #[test]
    fn test_permutation() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let mut state = [0; 4].map(|_| F::random(&mut rng));
        let state_var = state.map(|s| cs.new_variable(s));
        let out = cs.poseidon_bn254_permute(&state_var);
        PoseidonBN254::permute(&mut state);
        for (o, s) in out.iter().zip(state.iter()) {
            assert_eq!(cs.witness[*o], *s);
        }

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        witness[state_var[2]].add_assign(&F::one());
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }

    #[test]
    fn test_hashes() {
        let mut rng = test_rng();
        for n in [0usize, 2, 3, 4, 9, 13] {
            let mut cs = TurboCS::<F>::new();
            let inputs = random_goldilocks(&mut rng, n);
            let input_vars = inputs
                .iter()
                .map(|x| GoldilocksVar::alloc_witness(&mut cs, *x))
                .collect::<Vec<_>>();
            let h = cs.poseidon_bn254_hash_or_noop(&input_vars);
            assert_eq!(cs.witness[h.0], PoseidonBN254::hash_or_noop(&inputs));
            let h2 = cs.poseidon_bn254_hash_no_pad(&input_vars);
            assert_eq!(cs.witness[h2.0], PoseidonBN254::hash_no_pad(&inputs));

            let witness = cs.get_and_clear_witness();
            assert!(cs.verify_witness(&witness, &[]).is_ok());
        }
    }

    #[test]
    fn test_two_to_one() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let l = F::random(&mut rng);
        let r = F::random(&mut rng);
        let l_var = cs.new_native_hash_variable(l);
        let r_var = cs.new_native_hash_variable(r);
        let h = cs.poseidon_bn254_two_to_one(&l_var, &r_var);
        assert_eq!(cs.witness[h.0], PoseidonBN254::two_to_one(&l, &r));

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        witness[r_var.0].add_assign(&F::one());
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }

    #[test]
    fn test_to_vec() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let h = F::random(&mut rng);
        let h_var = cs.new_native_hash_variable(h);
        let limbs = cs.poseidon_bn254_to_vec(&h_var);
        let expected = PoseidonBN254::to_vec(&h);
        for (l, e) in limbs.iter().zip(expected.iter()) {
            assert_eq!(l.value(&cs), *e);
        }
        assert_eq!(limbs[4].bits, 30);

        // the largest field element still splits
        let max = F::zero().sub(&F::one());
        let max_var = cs.new_native_hash_variable(max);
        cs.poseidon_bn254_to_vec(&max_var);

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        witness[limbs[1].var].add_assign(&F::one());
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }
}
