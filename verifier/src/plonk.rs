use crate::gates::{evaluate_gate_constraints, gl, EvaluationVarsExt};
use crate::structs::CommonCircuitData;
use crate::vars::{OpeningSetVar, ProofChallengesVar, VerifierCS};
use plover_algebra::goldilocks::{Field, GoldilocksField, QuadraticExtension};
use plover_plonk::constraint_system::{ExtVar, GoldilocksVar, HashOutVar};

/// `L_0(x) = (x^n - 1) / (n·(x - 1))`, given `x^n`.
pub fn eval_l_0(cs: &mut VerifierCS, n: usize, x: &ExtVar, x_pow_n: &ExtVar) -> ExtVar {
    let one = ExtVar::one(cs);
    let numerator = x_pow_n.sub(cs, &one);
    let x_minus_one = x.sub(cs, &one);
    let denominator = x_minus_one.mul_const(
        cs,
        QuadraticExtension([gl(n as u64), GoldilocksField::ZERO]),
    );
    numerator.div(cs, &denominator)
}

/// `prev·Π num - next·Π den` for each chunk of `max_degree` factors, the
/// accumulators running from `Z(x)` through the partial products to `Z(gx)`.
pub fn check_partial_products(
    cs: &mut VerifierCS,
    numerators: &[ExtVar],
    denominators: &[ExtVar],
    partials: &[ExtVar],
    z_x: &ExtVar,
    z_gx: &ExtVar,
    max_degree: usize,
) -> Vec<ExtVar> {
    let accs = [core::slice::from_ref(z_x), partials, core::slice::from_ref(z_gx)].concat();
    let num_chunks = numerators.chunks(max_degree);
    assert_eq!(num_chunks.len(), accs.len() - 1, "partial products do not chain");

    num_chunks
        .zip(denominators.chunks(max_degree))
        .zip(accs.windows(2))
        .map(|((num_chunk, den_chunk), accs)| {
            let one = ExtVar::one(cs);
            let num = num_chunk.iter().fold(one, |acc, n| acc.mul(cs, n));
            let den = den_chunk.iter().fold(one, |acc, d| acc.mul(cs, d));
            let lhs = accs[0].mul(cs, &num);
            let rhs = accs[1].mul(cs, &den);
            lhs.sub(cs, &rhs)
        })
        .collect()
}

/// Evaluate the vanishing polynomial at `ζ`, reduced once per `α_k`: the
/// `L_0·(Z - 1)` terms, the partial product checks, then the gate
/// constraints.
pub fn eval_vanishing_poly(
    cs: &mut VerifierCS,
    common: &CommonCircuitData,
    zeta: &ExtVar,
    zeta_pow_deg: &ExtVar,
    openings: &OpeningSetVar,
    challenges: &ProofChallengesVar,
    public_inputs_hash: &HashOutVar,
) -> Vec<ExtVar> {
    let vars = EvaluationVarsExt {
        local_constants: &openings.constants,
        local_wires: &openings.wires,
        public_inputs_hash,
    };
    let constraint_terms = evaluate_gate_constraints(cs, common, &vars);

    let num_prods = common.num_partial_products;
    let num_routed_wires = common.config.num_routed_wires;
    let l_0 = eval_l_0(cs, common.degree(), zeta, zeta_pow_deg);
    let one = ExtVar::one(cs);
    let s_ids = common.k_is[..num_routed_wires]
        .iter()
        .map(|k| zeta.mul_const(cs, QuadraticExtension([gl(*k), GoldilocksField::ZERO])))
        .collect::<Vec<_>>();

    let mut z_1_terms = Vec::with_capacity(common.num_challenges());
    let mut partial_product_terms = Vec::new();
    for i in 0..common.num_challenges() {
        let z_x = &openings.plonk_zs[i];
        let z_gx = &openings.plonk_zs_next[i];
        let z_minus_one = z_x.sub(cs, &one);
        z_1_terms.push(l_0.mul(cs, &z_minus_one));

        let beta = &challenges.plonk_betas[i];
        let gamma = ExtVar::from_base(cs, challenges.plonk_gammas[i]);
        let numerators = (0..num_routed_wires)
            .map(|j| wire_term(cs, &openings.wires[j], &s_ids[j], beta, &gamma))
            .collect::<Vec<_>>();
        let denominators = (0..num_routed_wires)
            .map(|j| wire_term(cs, &openings.wires[j], &openings.plonk_sigmas[j], beta, &gamma))
            .collect::<Vec<_>>();
        let partials = &openings.partial_products[i * num_prods..(i + 1) * num_prods];
        partial_product_terms.extend(check_partial_products(
            cs,
            &numerators,
            &denominators,
            partials,
            z_x,
            z_gx,
            common.quotient_degree_factor,
        ));
    }

    let terms = [z_1_terms, partial_product_terms, constraint_terms].concat();
    challenges
        .plonk_alphas
        .iter()
        .map(|alpha| {
            let alpha = ExtVar::from_base(cs, *alpha);
            ExtVar::reduce_with_powers(cs, &terms, &alpha)
        })
        .collect()
}

/// `wire + β·s + γ`.
fn wire_term(
    cs: &mut VerifierCS,
    wire: &ExtVar,
    s: &ExtVar,
    beta: &GoldilocksVar,
    gamma: &ExtVar,
) -> ExtVar {
    let beta_s = s.scalar_mul(cs, beta);
    let sum = wire.add_no_reduce(cs, &beta_s);
    sum.add(cs, gamma)
}

/// Check `vanishing_k(ζ) = (ζ^n - 1)·t_k(ζ)` for every challenge repetition,
/// `t_k` being rebuilt from its chunks with powers of `ζ^n`.
pub fn verify_plonk_identity(
    cs: &mut VerifierCS,
    common: &CommonCircuitData,
    openings: &OpeningSetVar,
    challenges: &ProofChallengesVar,
    public_inputs_hash: &HashOutVar,
) {
    let zeta = &challenges.plonk_zeta;
    let zeta_pow_deg = zeta.exp_power_of_2(cs, common.degree_bits());
    let vanishing = eval_vanishing_poly(
        cs,
        common,
        zeta,
        &zeta_pow_deg,
        openings,
        challenges,
        public_inputs_hash,
    );

    let one = ExtVar::one(cs);
    let z_h_zeta = zeta_pow_deg.sub(cs, &one);
    for (v, chunk) in vanishing
        .iter()
        .zip(openings.quotient_polys.chunks(common.quotient_degree_factor))
    {
        let quotient = ExtVar::reduce_with_powers(cs, chunk, &zeta_pow_deg);
        let expected = z_h_zeta.mul(cs, &quotient);
        v.assert_is_equal(cs, &expected);
    }
}

#[cfg(test)]
mod test {
    use super::{check_partial_products, eval_l_0};
    use crate::gates::test_utils::random_ext;
    use crate::vars::VerifierCS;
    use plover_algebra::{
        goldilocks::{Field, GoldilocksExt, GoldilocksField, QuadraticExtension},
        prelude::*,
    };
    use plover_plonk::constraint_system::ExtVar;

    #[test]
    fn test_l_0() {
        let mut rng = test_rng();
        let mut cs = VerifierCS::new();
        let n = 1usize << 5;
        let x = random_ext(&mut rng);
        let x_pow_n = x.exp_u64(n as u64);
        let x_var = ExtVar::alloc_witness(&mut cs, x);
        let x_pow_n_var = x_var.exp_power_of_2(&mut cs, 5);
        let l_0 = eval_l_0(&mut cs, n, &x_var, &x_pow_n_var);

        let n_ext = QuadraticExtension([GoldilocksField::from_canonical_u64(n as u64), GoldilocksField::ZERO]);
        let expected = (x_pow_n - GoldilocksExt::ONE) / (n_ext * (x - GoldilocksExt::ONE));
        assert_eq!(l_0.value(&cs), expected);

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }

    #[test]
    fn test_partial_products_chain() {
        let mut rng = test_rng();
        let mut cs = VerifierCS::new();
        let max_degree = 3;
        let nums = (0..8).map(|_| random_ext(&mut rng)).collect::<Vec<_>>();
        let dens = (0..8).map(|_| random_ext(&mut rng)).collect::<Vec<_>>();
        let z_x = random_ext(&mut rng);

        // accumulate Z·Π num/den chunk by chunk
        let mut accs = vec![];
        let mut acc = z_x;
        for (n, d) in nums.chunks(max_degree).zip(dens.chunks(max_degree)) {
            let n: GoldilocksExt = n.iter().copied().product();
            let d: GoldilocksExt = d.iter().copied().product();
            acc = acc * n / d;
            accs.push(acc);
        }
        let z_gx = accs.pop().unwrap();

        let alloc = |cs: &mut VerifierCS, v: &[GoldilocksExt]| {
            v.iter().map(|x| ExtVar::alloc_witness(cs, *x)).collect::<Vec<_>>()
        };
        let nums_var = alloc(&mut cs, &nums);
        let dens_var = alloc(&mut cs, &dens);
        let partials = alloc(&mut cs, &accs);
        let z_x_var = ExtVar::alloc_witness(&mut cs, z_x);
        let z_gx_var = ExtVar::alloc_witness(&mut cs, z_gx);

        let checks = check_partial_products(
            &mut cs, &nums_var, &dens_var, &partials, &z_x_var, &z_gx_var, max_degree,
        );
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| c.value(&cs) == GoldilocksExt::ZERO));

        let bad_z_gx = ExtVar::alloc_witness(&mut cs, z_gx + GoldilocksExt::ONE);
        let checks = check_partial_products(
            &mut cs, &nums_var, &dens_var, &partials, &z_x_var, &bad_z_gx, max_degree,
        );
        assert_ne!(checks[2].value(&cs), GoldilocksExt::ZERO);

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }
}
