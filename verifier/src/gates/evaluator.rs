use crate::gates::{ext_constant, gl, CircuitGate, EvaluationVarsExt};
use crate::parameters::UNUSED_SELECTOR;
use crate::structs::CommonCircuitData;
use ark_std::ops::Range;
use plover_algebra::prelude::*;
use plover_plonk::constraint_system::{ExtVar, TurboCS};

/// Return `Π_{j ∈ group, j ≠ row} (j - s)`, times `UNUSED - s` when there
/// are several selector groups. It vanishes on every gate of the group but
/// `row`, and on rows without a gate of the group.
pub fn compute_filter<F: Scalar>(
    cs: &mut TurboCS<F>,
    row: usize,
    group_range: Range<usize>,
    selector: &ExtVar,
    many_selectors: bool,
) -> ExtVar {
    assert!(group_range.contains(&row));
    let mut filter = ExtVar::one(cs);
    let others = group_range
        .filter(|&j| j != row)
        .map(|j| j as u64)
        .chain(many_selectors.then_some(UNUSED_SELECTOR));
    for j in others {
        let j = ext_constant(cs, gl(j));
        let term = j.sub(cs, selector);
        filter = filter.mul(cs, &term);
    }
    filter
}

/// Evaluate the filtered constraints of every gate of the circuit and sum
/// them position-wise into `num_gate_constraints` terms.
pub fn evaluate_gate_constraints<F: Scalar>(
    cs: &mut TurboCS<F>,
    common: &CommonCircuitData,
    vars: &EvaluationVarsExt<'_>,
) -> Vec<ExtVar> {
    let zero = ExtVar::zero(cs);
    let mut constraints = vec![zero; common.num_gate_constraints];
    let selectors = &common.selectors_info;
    let gate_vars = vars.remove_prefix(common.num_selectors() + common.num_lookup_selectors);

    for (row, gate) in common.gates.iter().enumerate() {
        let selector_index = selectors.selector_indices[row];
        let filter = compute_filter(
            cs,
            row,
            selectors.groups[selector_index].clone(),
            &vars.local_constants[selector_index],
            selectors.groups.len() > 1,
        );

        let gate_constraints = gate.eval_unfiltered(cs, &gate_vars);
        assert!(
            gate_constraints.len() <= constraints.len(),
            "{} has more constraints than the circuit",
            gate.id()
        );
        for (acc, c) in constraints.iter_mut().zip(gate_constraints.iter()) {
            *acc = filter.mul_add(cs, c, acc);
        }
    }
    constraints
}

#[cfg(test)]
mod test {
    use super::compute_filter;
    use crate::gates::test_utils::random_ext;
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{Field, GoldilocksExt, GoldilocksField, QuadraticExtension},
        prelude::*,
    };
    use plover_plonk::constraint_system::{ExtVar, TurboCS};

    fn embed(x: u64) -> GoldilocksExt {
        QuadraticExtension([GoldilocksField::from_canonical_u64(x), GoldilocksField::ZERO])
    }

    fn native_filter(
        row: usize,
        range: std::ops::Range<usize>,
        s: GoldilocksExt,
        many: bool,
    ) -> GoldilocksExt {
        range
            .filter(|&j| j != row)
            .map(|j| j as u64)
            .chain(many.then_some(u32::MAX as u64))
            .fold(GoldilocksExt::ONE, |acc, j| acc * (embed(j) - s))
    }

    #[test]
    fn test_filter() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<BN254Scalar>::new();
        let s = random_ext(&mut rng);
        let s_var = ExtVar::alloc_witness(&mut cs, s);
        for (row, range, many) in [(0, 0..3, true), (4, 3..7, true), (1, 0..2, false)] {
            let filter = compute_filter(&mut cs, row, range.clone(), &s_var, many);
            assert_eq!(filter.value(&cs), native_filter(row, range, s, many));
        }

        // the selector of the row's own gate keeps the constraints
        let own = ExtVar::alloc_witness(&mut cs, embed(2));
        let filter = compute_filter(&mut cs, 2, 0..4, &own, true);
        assert_ne!(filter.value(&cs), GoldilocksExt::ZERO);
        let filter = compute_filter(&mut cs, 1, 0..4, &own, true);
        assert_eq!(filter.value(&cs), GoldilocksExt::ZERO);

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }
}
