use crate::gates::{ext_weighted_sum, gl, CosetInterpolationGate};
use crate::merkle::{random_access, verify_merkle_proof_to_cap};
use crate::parameters::{NUM_ORACLES, SALT_SIZE};
use crate::structs::CommonCircuitData;
use crate::vars::{
    FriChallengesVar, FriInitialTreeProofVar, FriProofVar, FriQueryRoundVar, MerkleCapVar,
    OpeningSetVar, VerifierCS,
};
use ark_std::{end_timer, start_timer};
use plover_algebra::{
    goldilocks::{
        goldilocks_root_of_unity, Field, GoldilocksField, QuadraticExtension,
        GOLDILOCKS_MODULUS, GOLDILOCKS_MULTIPLICATIVE_GENERATOR,
    },
    prelude::*,
};
use plover_plonk::constraint_system::{
    goldilocks::GOLDILOCKS_BITS, ExtVar, GoldilocksVar, VarIndex,
};

pub(crate) fn reverse_bits(n: usize, num_bits: usize) -> usize {
    if num_bits == 0 {
        return 0;
    }
    n.reverse_bits() >> (usize::BITS as usize - num_bits)
}

/// Range-check the response to `64 - pow_bits` bits, that is, require
/// `pow_bits` leading zeros.
pub fn verify_proof_of_work(cs: &mut VerifierCS, pow_response: &GoldilocksVar, pow_bits: usize) {
    assert!(pow_bits <= GOLDILOCKS_BITS);
    let response = if pow_response.bits > GOLDILOCKS_BITS {
        pow_response.reduce(cs)
    } else {
        *pow_response
    };
    cs.range_check(response.var, GOLDILOCKS_BITS - pow_bits);
}

/// Indices are read from canonical challenges; still, an index decomposed
/// from a non-canonical value must be too rare to matter at this rate.
pub fn assert_noncanonical_indices_ok(rate_bits: usize) {
    let num_ambiguous_elems = u64::MAX - GOLDILOCKS_MODULUS + 1;
    let query_error = 1.0 / (1u64 << rate_bits) as f64;
    let p_ambiguous = num_ambiguous_elems as f64 / GOLDILOCKS_MODULUS as f64;
    assert!(
        p_ambiguous < query_error * 1e-5,
        "non-canonical query indices are not negligible"
    );
}

/// The openings of each batch reduced by powers of `α`, with the shift
/// `α^|batch|` applied to the running sum of combine-initial.
struct PrecomputedReducedOpenings {
    reduced_openings: [ExtVar; 2],
    shifts: [ExtVar; 2],
    points: [ExtVar; 2],
}

impl PrecomputedReducedOpenings {
    fn new(
        cs: &mut VerifierCS,
        common: &CommonCircuitData,
        openings: &OpeningSetVar,
        zeta: &ExtVar,
        alpha: &ExtVar,
    ) -> Self {
        let zeta_batch = openings.zeta_batch();
        let zeta_next_batch = openings.zeta_next_batch();
        let g = goldilocks_root_of_unity(common.degree_bits());
        let zeta_next = zeta.mul_const(cs, QuadraticExtension([g, GoldilocksField::ZERO]));
        Self {
            reduced_openings: [
                ExtVar::reduce_with_powers(cs, &zeta_batch, alpha),
                ExtVar::reduce_with_powers(cs, &zeta_next_batch, alpha),
            ],
            shifts: [
                alpha.exp_u64(cs, zeta_batch.len() as u64),
                alpha.exp_u64(cs, zeta_next_batch.len() as u64),
            ],
            points: [*zeta, zeta_next],
        }
    }
}

/// `7·ω^{rev(index)}` for the primitive root `ω` of order `2^bits.len()`.
pub fn subgroup_x(cs: &mut VerifierCS, x_index_bits: &[VarIndex]) -> GoldilocksVar {
    let omega = goldilocks_root_of_unity(x_index_bits.len());
    let one = GoldilocksVar::one(cs);
    let mut x = GoldilocksVar::alloc_constant(cs, gl(GOLDILOCKS_MULTIPLICATIVE_GENERATOR));
    for (j, bit) in x_index_bits.iter().rev().enumerate() {
        let power = GoldilocksVar::alloc_constant(cs, omega.exp_power_of_2(j));
        let factor = GoldilocksVar::select(cs, &one, &power, *bit);
        x = x.mul(cs, &factor);
    }
    x
}

fn combine_initial(
    cs: &mut VerifierCS,
    common: &CommonCircuitData,
    proof: &FriInitialTreeProofVar,
    alpha: &ExtVar,
    x: &GoldilocksVar,
    precomputed: &PrecomputedReducedOpenings,
) -> ExtVar {
    let x = ExtVar::from_base(cs, *x);
    let zeta_evals = (0..NUM_ORACLES)
        .flat_map(|i| proof.unsalted_evals(i, common.is_salted(i), SALT_SIZE).to_vec())
        .collect::<Vec<_>>();
    let zeta_next_evals = proof.unsalted_evals(2, common.is_salted(2), SALT_SIZE)
        [..common.num_challenges()]
        .to_vec();

    let mut sum = ExtVar::zero(cs);
    for (i, evals) in [zeta_evals, zeta_next_evals].iter().enumerate() {
        let evals = evals
            .iter()
            .map(|e| ExtVar::from_base(cs, *e))
            .collect::<Vec<_>>();
        let reduced_evals = ExtVar::reduce_with_powers(cs, &evals, alpha);
        let numerator = reduced_evals.sub(cs, &precomputed.reduced_openings[i]);
        let denominator = x.sub(cs, &precomputed.points[i]);
        let quotient = numerator.div(cs, &denominator);
        sum = precomputed.shifts[i].mul_add(cs, &sum, &quotient);
    }
    sum
}

/// Interpolate the evaluations of a coset of size `2^arity_bits` at `beta`.
/// The coset contains `x`, whose position in it is `index_bits`; `evals` is
/// in bit-reversed order. The barycentric weights `c^{-(a-1)}·ŵ_k` of the
/// coset `c·⟨g⟩` are derived from those of the subgroup with one hinted
/// reciprocal of `c`.
pub fn compute_evaluation(
    cs: &mut VerifierCS,
    x: &GoldilocksVar,
    index_bits: &[VarIndex],
    arity_bits: usize,
    evals: &[ExtVar],
    beta: &ExtVar,
) -> ExtVar {
    let arity = 1usize << arity_bits;
    assert_eq!(evals.len(), arity);
    assert_eq!(index_bits.len(), arity_bits);
    let g = goldilocks_root_of_unity(arity_bits);

    let evals = (0..arity)
        .map(|k| evals[reverse_bits(k, arity_bits)])
        .collect::<Vec<_>>();
    let shifts = (0..arity)
        .map(|i| {
            let power = (arity - reverse_bits(i, arity_bits)) % arity;
            GoldilocksVar::alloc_constant(cs, g.exp_u64(power as u64))
        })
        .collect::<Vec<_>>();
    let shift = random_access(cs, &shifts, index_bits);
    let coset_start = x.mul(cs, &shift);

    let coset_start_inv = coset_start.inverse(cs);
    let weight_scale = coset_start_inv.exp(cs, (arity - 1) as u64);
    let weights = CosetInterpolationGate::compute_barycentric_weights(arity_bits);

    let mut l_beta = ExtVar::one(cs);
    let mut sum = ExtVar::zero(cs);
    let mut g_k = GoldilocksField::ONE;
    for (value, weight) in evals.iter().zip(weights.iter()) {
        let x_k = coset_start.mul_const(cs, g_k);
        let x_k = ExtVar::from_base(cs, x_k);
        let diff = beta.sub(cs, &x_k);
        l_beta = l_beta.mul(cs, &diff);
        let weighted = ext_weighted_sum(cs, &[(*value, gl(*weight))]);
        let term = weighted.div(cs, &diff);
        sum = sum.add(cs, &term);
        g_k *= g;
    }
    let sum = sum.scalar_mul(cs, &weight_scale);
    l_beta.mul(cs, &sum)
}

fn verify_query_round(
    cs: &mut VerifierCS,
    common: &CommonCircuitData,
    challenges: &FriChallengesVar,
    precomputed: &PrecomputedReducedOpenings,
    initial_caps: &[&MerkleCapVar; NUM_ORACLES],
    proof: &FriProofVar,
    x_index: &GoldilocksVar,
    round: &FriQueryRoundVar,
) {
    let all_bits = x_index.to_bits(cs);
    let mut index_bits = &all_bits[..common.lde_bits()];

    for ((leaf, path), cap) in round
        .initial_trees_proof
        .evals_proofs
        .iter()
        .zip(initial_caps.iter())
    {
        verify_merkle_proof_to_cap(cs, leaf, index_bits, cap, path);
    }

    let mut x = subgroup_x(cs, index_bits);
    let mut old_eval = combine_initial(
        cs,
        common,
        &round.initial_trees_proof,
        &challenges.fri_alpha,
        &x,
        precomputed,
    );

    let arities = &common.fri_params.reduction_arity_bits;
    for (i, &arity_bits) in arities.iter().enumerate() {
        let step = &round.steps[i];
        let (within_coset, coset_index) = index_bits.split_at(arity_bits);

        let claimed = random_access(cs, &step.evals, within_coset);
        claimed.assert_is_equal(cs, &old_eval);

        old_eval = compute_evaluation(
            cs,
            &x,
            within_coset,
            arity_bits,
            &step.evals,
            &challenges.fri_betas[i],
        );

        let leaf = step.evals.iter().flat_map(|e| e.0).collect::<Vec<_>>();
        verify_merkle_proof_to_cap(
            cs,
            &leaf,
            coset_index,
            &proof.commit_phase_merkle_caps[i],
            &step.merkle_proof,
        );

        x = x.exp_power_of_2(cs, arity_bits);
        index_bits = coset_index;
    }

    let x = ExtVar::from_base(cs, x);
    let final_eval = proof.final_poly.eval(cs, &x);
    final_eval.assert_is_equal(cs, &old_eval);
}

/// Verify the FRI opening proof of the four oracles at `ζ` and `g·ζ`.
pub fn verify_fri_proof(
    cs: &mut VerifierCS,
    common: &CommonCircuitData,
    openings: &OpeningSetVar,
    zeta: &ExtVar,
    challenges: &FriChallengesVar,
    initial_caps: &[&MerkleCapVar; NUM_ORACLES],
    proof: &FriProofVar,
) {
    let config = &common.fri_params.config;
    verify_proof_of_work(cs, &challenges.fri_pow_response, config.proof_of_work_bits as usize);

    assert_eq!(
        proof.query_round_proofs.len(),
        challenges.fri_query_indices.len(),
        "query count ≠ query-index count"
    );
    assert_noncanonical_indices_ok(config.rate_bits);

    let precomputed =
        PrecomputedReducedOpenings::new(cs, common, openings, zeta, &challenges.fri_alpha);
    for (i, (x_index, round)) in challenges
        .fri_query_indices
        .iter()
        .zip(proof.query_round_proofs.iter())
        .enumerate()
    {
        let timer = start_timer!(|| format!("FRI query round {}", i));
        let size = cs.size;
        verify_query_round(cs, common, challenges, &precomputed, initial_caps, proof, x_index, round);
        end_timer!(timer, || format!("{} gates", cs.size - size));
    }
}

#[cfg(test)]
mod test {
    use super::{compute_evaluation, reverse_bits, subgroup_x, verify_proof_of_work};
    use crate::gates::test_utils::random_ext;
    use crate::vars::VerifierCS;
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{
            goldilocks_root_of_unity, Field, GoldilocksExt, GoldilocksField, QuadraticExtension,
        },
        prelude::*,
    };
    use plover_plonk::constraint_system::{ExtVar, GoldilocksVar};

    fn embed(x: GoldilocksField) -> GoldilocksExt {
        QuadraticExtension([x, GoldilocksField::ZERO])
    }

    fn horner(coeffs: &[GoldilocksExt], x: GoldilocksExt) -> GoldilocksExt {
        coeffs
            .iter()
            .rev()
            .fold(GoldilocksExt::ZERO, |acc, c| acc * x + *c)
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b0011, 4), 0b1100);
        assert_eq!(reverse_bits(0b1, 1), 0b1);
        assert_eq!(reverse_bits(5, 0), 0);
        assert_eq!(reverse_bits(0b100110, 6), 0b011001);
    }

    #[test]
    fn test_subgroup_x() {
        let mut cs = VerifierCS::new();
        let lde_bits = 7;
        let omega = goldilocks_root_of_unity(lde_bits);
        for index in [0usize, 1, 77, 127] {
            let var = cs.new_variable(BN254Scalar::from(index as u64));
            let bits = cs.range_check(var, lde_bits);
            let x = subgroup_x(&mut cs, &bits);
            let expected = GoldilocksField::from_canonical_u64(7)
                * omega.exp_u64(reverse_bits(index, lde_bits) as u64);
            assert_eq!(x.value(&cs), expected);
        }
        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }

    #[test]
    fn test_compute_evaluation() {
        let mut rng = test_rng();
        for arity_bits in 1..=4 {
            let arity = 1usize << arity_bits;
            let mut cs = VerifierCS::new();
            let coeffs = (0..arity).map(|_| random_ext(&mut rng)).collect::<Vec<_>>();
            let beta = random_ext(&mut rng);
            let coset_shift = GoldilocksField::from_canonical_u64(rng.next_u64() >> 2)
                + GoldilocksField::ONE;
            let g = goldilocks_root_of_unity(arity_bits);

            // natural-order coset points, committed in bit-reversed order
            let natural = (0..arity)
                .map(|k| horner(&coeffs, embed(coset_shift * g.exp_u64(k as u64))))
                .collect::<Vec<_>>();
            let committed = (0..arity)
                .map(|i| natural[reverse_bits(i, arity_bits)])
                .collect::<Vec<_>>();

            let index_within_coset = (rng.next_u32() as usize) % arity;
            let x = coset_shift * g.exp_u64(reverse_bits(index_within_coset, arity_bits) as u64);
            let x_var = GoldilocksVar::alloc_witness(&mut cs, x);
            let index_var = cs.new_variable(BN254Scalar::from(index_within_coset as u64));
            let index_bits = cs.range_check(index_var, arity_bits);
            let evals = committed
                .iter()
                .map(|e| ExtVar::alloc_witness(&mut cs, *e))
                .collect::<Vec<_>>();
            let beta_var = ExtVar::alloc_witness(&mut cs, beta);

            let result = compute_evaluation(&mut cs, &x_var, &index_bits, arity_bits, &evals, &beta_var);
            assert_eq!(result.value(&cs), horner(&coeffs, beta));
            // x is the committed point at the query index
            assert_eq!(committed[index_within_coset], horner(&coeffs, embed(x)));

            let mut witness = cs.get_and_clear_witness();
            assert!(cs.verify_witness(&witness, &[]).is_ok());
            witness[x_var.var] = witness[x_var.var] + BN254Scalar::one();
            assert!(cs.verify_witness(&witness, &[]).is_err());
        }
    }

    #[test]
    fn test_proof_of_work() {
        let pow_bits = 16;
        for (response, ok) in [(0u64, true), ((1 << 48) - 1, true), (1 << 48, false), (u64::MAX >> 1, false)] {
            let mut cs = VerifierCS::new();
            let var = GoldilocksVar::alloc_witness(&mut cs, GoldilocksField::from_canonical_u64(response));
            verify_proof_of_work(&mut cs, &var, pow_bits);
            let witness = cs.get_and_clear_witness();
            assert_eq!(cs.verify_witness(&witness, &[]).is_ok(), ok);
        }
    }
}
