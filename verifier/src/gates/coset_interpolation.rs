use crate::gates::{
    ext_algebra_weighted_sum, ext_constant, flatten_algebra, CircuitGate, EvaluationVarsExt,
    GOLDILOCKS_PHANTOM,
};
use crate::parameters::D;
use ark_std::ops::Range;
use plover_algebra::{
    goldilocks::{goldilocks_root_of_unity, Field, GoldilocksField, PrimeField64},
    prelude::*,
};
use plover_plonk::constraint_system::{ExtAlgebraVar, ExtVar, TurboCS};

/// Evaluates at a point the polynomial interpolating values on a coset of
/// the subgroup of order `2^subgroup_bits`, with the barycentric formula
/// split into chunks of `degree` points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CosetInterpolationGate {
    /// The log of the number of points.
    pub subgroup_bits: usize,
    /// The number of points folded per intermediate.
    pub degree: usize,
    /// The barycentric weights of the subgroup.
    pub barycentric_weights: Vec<u64>,
}

impl CosetInterpolationGate {
    /// The weights `1 / Π_{j ≠ i} (x_i - x_j)` of the subgroup points.
    pub fn compute_barycentric_weights(subgroup_bits: usize) -> Vec<u64> {
        let domain = two_adic_subgroup(subgroup_bits);
        domain
            .iter()
            .enumerate()
            .map(|(i, x_i)| {
                let denominator = domain
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .fold(GoldilocksField::ONE, |acc, (_, x_j)| acc * (*x_i - *x_j));
                denominator.inverse().to_canonical_u64()
            })
            .collect()
    }

    fn num_points(&self) -> usize {
        1 << self.subgroup_bits
    }

    const WIRE_SHIFT: usize = 0;

    const START_VALUES: usize = 1;

    fn wires_value(i: usize) -> Range<usize> {
        Self::START_VALUES + D * i..Self::START_VALUES + D * (i + 1)
    }

    fn start_evaluation_point(&self) -> usize {
        Self::START_VALUES + D * self.num_points()
    }

    fn wires_evaluation_point(&self) -> Range<usize> {
        let start = self.start_evaluation_point();
        start..start + D
    }

    fn start_evaluation_value(&self) -> usize {
        self.start_evaluation_point() + D
    }

    fn wires_evaluation_value(&self) -> Range<usize> {
        let start = self.start_evaluation_value();
        start..start + D
    }

    fn start_intermediates(&self) -> usize {
        self.start_evaluation_value() + D
    }

    fn num_intermediates(&self) -> usize {
        (self.num_points() - 2) / (self.degree - 1)
    }

    fn wires_intermediate_eval(&self, i: usize) -> Range<usize> {
        let start = self.start_intermediates() + D * i;
        start..start + D
    }

    fn wires_intermediate_prod(&self, i: usize) -> Range<usize> {
        let start = self.start_intermediates() + D * (self.num_intermediates() + i);
        start..start + D
    }

    fn wires_shifted_evaluation_point(&self) -> Range<usize> {
        let start = self.start_intermediates() + D * 2 * self.num_intermediates();
        start..start + D
    }
}

fn two_adic_subgroup(bits: usize) -> Vec<GoldilocksField> {
    let generator = goldilocks_root_of_unity(bits);
    let mut x = GoldilocksField::ONE;
    (0..1usize << bits)
        .map(|_| {
            let current = x;
            x *= generator;
            current
        })
        .collect()
}

/// Fold the points into `(eval, prod)`:
/// `eval' = eval·(p - x_i) + w_i·v_i·prod` and `prod' = prod·(p - x_i)`.
fn partial_interpolate<F: Scalar>(
    cs: &mut TurboCS<F>,
    domain: &[GoldilocksField],
    values: &[ExtAlgebraVar],
    weights: &[u64],
    point: &ExtAlgebraVar,
    initial: (ExtAlgebraVar, ExtAlgebraVar),
) -> (ExtAlgebraVar, ExtAlgebraVar) {
    let (mut eval, mut prod) = initial;
    for ((x_i, value), weight) in domain.iter().zip(values.iter()).zip(weights.iter()) {
        let x_i = ext_constant(cs, *x_i);
        let x_i = ExtAlgebraVar::from_ext(cs, x_i);
        let term = point.sub(cs, &x_i);
        let weighted_value =
            ext_algebra_weighted_sum(cs, &[(*value, GoldilocksField::from_canonical_u64(*weight))]);
        let weighted_prod = weighted_value.mul(cs, &prod);
        eval = eval.mul_add(cs, &term, &weighted_prod);
        prod = prod.mul(cs, &term);
    }
    (eval, prod)
}

impl CircuitGate for CosetInterpolationGate {
    fn id(&self) -> String {
        format!(
            "CosetInterpolationGate {{ subgroup_bits: {}, degree: {}, barycentric_weights: {:?}, _phantom: {} }}<D=2>",
            self.subgroup_bits, self.degree, self.barycentric_weights, GOLDILOCKS_PHANTOM
        )
    }

    fn num_wires(&self) -> usize {
        self.wires_shifted_evaluation_point().end
    }

    fn num_constants(&self) -> usize {
        0
    }

    fn num_constraints(&self) -> usize {
        D * (2 + 2 * self.num_intermediates())
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        let mut constraints = Vec::with_capacity(2 + 2 * self.num_intermediates());

        let shift = vars.local_wires[Self::WIRE_SHIFT];
        let evaluation_point = vars.get_local_ext_algebra(self.wires_evaluation_point());
        let shifted_evaluation_point =
            vars.get_local_ext_algebra(self.wires_shifted_evaluation_point());
        let rescaled = shifted_evaluation_point.scalar_mul(cs, &shift);
        constraints.push(evaluation_point.sub(cs, &rescaled));

        let domain = two_adic_subgroup(self.subgroup_bits);
        let values = (0..self.num_points())
            .map(|i| vars.get_local_ext_algebra(Self::wires_value(i)))
            .collect::<Vec<_>>();
        let weights = &self.barycentric_weights;

        let initial = (ExtAlgebraVar::zero(cs), ExtAlgebraVar::one(cs));
        let (mut computed_eval, mut computed_prod) = partial_interpolate(
            cs,
            &domain[..self.degree],
            &values[..self.degree],
            &weights[..self.degree],
            &shifted_evaluation_point,
            initial,
        );

        for i in 0..self.num_intermediates() {
            let intermediate_eval = vars.get_local_ext_algebra(self.wires_intermediate_eval(i));
            let intermediate_prod = vars.get_local_ext_algebra(self.wires_intermediate_prod(i));
            constraints.push(intermediate_eval.sub(cs, &computed_eval));
            constraints.push(intermediate_prod.sub(cs, &computed_prod));

            let start = 1 + (self.degree - 1) * (i + 1);
            let end = (start + self.degree - 1).min(self.num_points());
            (computed_eval, computed_prod) = partial_interpolate(
                cs,
                &domain[start..end],
                &values[start..end],
                &weights[start..end],
                &shifted_evaluation_point,
                (intermediate_eval, intermediate_prod),
            );
        }

        let evaluation_value = vars.get_local_ext_algebra(self.wires_evaluation_value());
        constraints.push(evaluation_value.sub(cs, &computed_eval));
        flatten_algebra(constraints)
    }
}

#[cfg(test)]
mod test {
    use super::CosetInterpolationGate;
    use crate::deserializer::parse_gate_id;
    use crate::gates::{test_utils::check_against_plonky2, Gate};
    use plonky2::gates::coset_interpolation::CosetInterpolationGate as PlonkyGate;
    use plonky2::gates::gate::Gate as PlonkyGateTrait;
    use plover_algebra::goldilocks::GoldilocksField;

    /// A plonky2 gate whose degree is lowered to `max_degree`, so that it
    /// carries intermediate wires.
    fn plonky2_gate(subgroup_bits: usize, max_degree: usize) -> PlonkyGate<GoldilocksField, 2> {
        let mut gate = PlonkyGate::new(subgroup_bits);
        let n_points = 1 << subgroup_bits;
        let n_intermediates = (n_points - 2) / (max_degree - 1);
        gate.degree = (n_points - 2) / (n_intermediates + 1) + 2;
        gate
    }

    #[test]
    fn test_coset_interpolation_gate() {
        for (subgroup_bits, max_degree) in [(2, 2), (3, 4), (4, 6), (3, 8)] {
            let theirs = plonky2_gate(subgroup_bits, max_degree);
            let ours = parse_gate_id(&theirs.id()).unwrap();
            match &ours {
                Gate::CosetInterpolation(gate) => {
                    assert_eq!(gate.subgroup_bits, subgroup_bits);
                    assert_eq!(
                        gate.barycentric_weights,
                        CosetInterpolationGate::compute_barycentric_weights(subgroup_bits)
                    );
                }
                _ => panic!("parsed into another gate"),
            }
            check_against_plonky2(&ours, &theirs);
        }
    }
}
