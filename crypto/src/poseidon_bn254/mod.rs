use num_bigint::BigUint;
use plover_algebra::{
    bn254::BN254Scalar,
    goldilocks::{goldilocks_to_scalar, Field, GoldilocksField},
    prelude::*,
};

/// The module for the parameter generator.
mod params;

/// The module for the plonky2 hasher and configuration.
pub mod config;

pub use config::{NativeHashOut, PoseidonBN254GoldilocksConfig, PoseidonBN254Hash};
pub use params::{generate_parameters, PoseidonParameters};

/// The state width.
pub const POSEIDON_BN254_WIDTH: usize = 4;
/// The number of lanes overwritten by each absorption.
pub const POSEIDON_BN254_RATE: usize = 3;
/// The number of full rounds.
pub const POSEIDON_BN254_FULL_ROUNDS: usize = 8;
/// The number of partial rounds.
pub const POSEIDON_BN254_PARTIAL_ROUNDS: usize = 56;
/// The number of Goldilocks elements packed into one lane.
pub const GOLDILOCKS_PER_LANE: usize = 3;
/// The number of Goldilocks limbs a digest is split into.
pub const DIGEST_LIMBS: usize = 5;
/// The bit size of each limb of a split digest.
pub const DIGEST_LIMB_BITS: usize = 56;

lazy_static! {
    /// The parameters of the width-4 Poseidon over the BN254 scalar field.
    pub static ref POSEIDON_BN254_PARAMS: PoseidonParameters<BN254Scalar> = generate_parameters(
        POSEIDON_BN254_WIDTH,
        POSEIDON_BN254_FULL_ROUNDS,
        POSEIDON_BN254_PARTIAL_ROUNDS,
    );
}

/// A native Poseidon digest.
pub type NativeHash = BN254Scalar;

/// The Poseidon permutation over BN254 with `x^5` S-boxes.
pub struct PoseidonBN254;

impl PoseidonBN254 {
    /// Apply the permutation in place.
    pub fn permute(state: &mut [BN254Scalar; POSEIDON_BN254_WIDTH]) {
        let params = &*POSEIDON_BN254_PARAMS;
        let half = params.full_rounds / 2;
        for r in 0..params.full_rounds + params.partial_rounds {
            for (s, c) in state.iter_mut().zip(params.round_constants[r].iter()) {
                *s += c;
            }
            if r < half || r >= half + params.partial_rounds {
                for s in state.iter_mut() {
                    *s = Self::sbox(s);
                }
            } else {
                state[0] = Self::sbox(&state[0]);
            }
            *state = Self::mds_layer(&params.mds, state);
        }
    }

    /// The S-box `x^5`.
    pub fn sbox(x: &BN254Scalar) -> BN254Scalar {
        x.square().square().mul(x)
    }

    fn mds_layer(
        mds: &[Vec<BN254Scalar>],
        state: &[BN254Scalar; POSEIDON_BN254_WIDTH],
    ) -> [BN254Scalar; POSEIDON_BN254_WIDTH] {
        let mut res = [BN254Scalar::zero(); POSEIDON_BN254_WIDTH];
        for (row, out) in mds.iter().zip(res.iter_mut()) {
            for (m, s) in row.iter().zip(state.iter()) {
                *out += &m.mul(s);
            }
        }
        res
    }

    /// Pack up to three Goldilocks elements into one lane as
    /// `Σ x_k·2^{64k}`.
    pub fn pack_lane(values: &[GoldilocksField]) -> BN254Scalar {
        assert!(values.len() <= GOLDILOCKS_PER_LANE);
        let shift = BN254Scalar::from(1u128 << 64);
        let mut acc = BN254Scalar::zero();
        for v in values.iter().rev() {
            acc = acc.mul(&shift).add(&goldilocks_to_scalar::<BN254Scalar>(*v));
        }
        acc
    }

    /// Absorb windows of nine Goldilocks elements into lanes 1..=3, three per
    /// lane, overwriting the state and permuting after each window.
    pub fn hash_no_pad(inputs: &[GoldilocksField]) -> NativeHash {
        let mut state = [BN254Scalar::zero(); POSEIDON_BN254_WIDTH];
        for window in inputs.chunks(GOLDILOCKS_PER_LANE * POSEIDON_BN254_RATE) {
            for (j, lane) in window.chunks(GOLDILOCKS_PER_LANE).enumerate() {
                state[j + 1] = Self::pack_lane(lane);
            }
            Self::permute(&mut state);
        }
        state[0]
    }

    /// Leaves of at most three elements are packed as `Σ x_i·2^{32i}`
    /// instead of being hashed.
    pub fn hash_or_noop(inputs: &[GoldilocksField]) -> NativeHash {
        if inputs.len() <= POSEIDON_BN254_RATE {
            let shift = BN254Scalar::from(1u64 << 32);
            let mut acc = BN254Scalar::zero();
            for v in inputs.iter().rev() {
                acc = acc.mul(&shift).add(&goldilocks_to_scalar::<BN254Scalar>(*v));
            }
            acc
        } else {
            Self::hash_no_pad(inputs)
        }
    }

    /// Compress two digests by permuting `[0, 0, left, right]`.
    pub fn two_to_one(left: &NativeHash, right: &NativeHash) -> NativeHash {
        let mut state = [BN254Scalar::zero(), BN254Scalar::zero(), *left, *right];
        Self::permute(&mut state);
        state[0]
    }

    /// Split a digest into 56-bit little-endian limbs, read as Goldilocks
    /// elements; the last limb holds the remaining high bits.
    pub fn to_vec(hash: &NativeHash) -> [GoldilocksField; DIGEST_LIMBS] {
        let big: BigUint = (*hash).into();
        let mask = (BigUint::one() << DIGEST_LIMB_BITS) - 1u32;
        let mut limbs = [GoldilocksField::ZERO; DIGEST_LIMBS];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let value: BigUint = (&big >> (DIGEST_LIMB_BITS * i)) & &mask;
            *limb = GoldilocksField::from_canonical_u64(value.iter_u64_digits().next().unwrap_or(0));
        }
        limbs
    }
}
