use crate::deserializer::parse_gate_id;
use ark_std::ops::Range;
use plover_algebra::{
    goldilocks::{Field, GoldilocksField},
    prelude::*,
};
use plover_plonk::constraint_system::{
    ExtAlgebraVar, ExtVar, GoldilocksVar, HashOutVar, TurboCS,
};

mod arithmetic;
mod arithmetic_extension;
mod base_sum;
mod constant;
mod coset_interpolation;
/// The selector filter and the accumulation of all gate constraints.
pub mod evaluator;
mod exponentiation;
mod multiplication_extension;
mod noop;
mod poseidon;
mod poseidon_mds;
mod public_input;
mod random_access;
mod reducing;
mod reducing_extension;

pub use arithmetic::ArithmeticGate;
pub use arithmetic_extension::ArithmeticExtensionGate;
pub use base_sum::BaseSumGate;
pub use constant::ConstantGate;
pub use coset_interpolation::CosetInterpolationGate;
pub use evaluator::evaluate_gate_constraints;
pub use exponentiation::ExponentiationGate;
pub use multiplication_extension::MulExtensionGate;
pub use noop::NoopGate;
pub use poseidon::PoseidonGate;
pub use poseidon_mds::PoseidonMdsGate;
pub use public_input::PublicInputGate;
pub use random_access::RandomAccessGate;
pub use reducing::ReducingGate;
pub use reducing_extension::ReducingExtensionGate;

/// How `PhantomData<GoldilocksField>` shows up in plonky2 gate ids.
pub const GOLDILOCKS_PHANTOM: &str = "PhantomData<plonky2_field::goldilocks_field::GoldilocksField>";

/// The openings a gate is evaluated on: the constants left after the
/// selector columns, the wires and the public inputs hash, all at `ζ`.
#[derive(Clone, Copy, Debug)]
pub struct EvaluationVarsExt<'a> {
    /// The constant columns.
    pub local_constants: &'a [ExtVar],
    /// The wire columns.
    pub local_wires: &'a [ExtVar],
    /// The hash of the public inputs of the proof.
    pub public_inputs_hash: &'a HashOutVar,
}

impl<'a> EvaluationVarsExt<'a> {
    /// Read `D` consecutive wires as an element of the extension algebra.
    pub fn get_local_ext_algebra(&self, wires: Range<usize>) -> ExtAlgebraVar {
        assert_eq!(wires.len(), 2);
        ExtAlgebraVar([self.local_wires[wires.start], self.local_wires[wires.start + 1]])
    }

    /// Drop the first `n` constant columns.
    pub fn remove_prefix(&self, n: usize) -> Self {
        Self {
            local_constants: &self.local_constants[n..],
            ..*self
        }
    }
}

/// A custom gate of plonky2, evaluated in-circuit on the openings at `ζ`.
pub trait CircuitGate {
    /// The id plonky2 serializes the gate as.
    fn id(&self) -> String;

    /// The number of wires the gate reads.
    fn num_wires(&self) -> usize;

    /// The number of constant columns the gate reads, selectors excluded.
    fn num_constants(&self) -> usize;

    /// The number of constraints the gate emits.
    fn num_constraints(&self) -> usize;

    /// Evaluate the constraints without the selector filter.
    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar>;
}

/// Every gate the verifier knows.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Gate {
    Arithmetic(ArithmeticGate),
    ArithmeticExtension(ArithmeticExtensionGate),
    BaseSum(BaseSumGate),
    Constant(ConstantGate),
    CosetInterpolation(CosetInterpolationGate),
    Exponentiation(ExponentiationGate),
    MulExtension(MulExtensionGate),
    Noop(NoopGate),
    Poseidon(PoseidonGate),
    PoseidonMds(PoseidonMdsGate),
    PublicInput(PublicInputGate),
    RandomAccess(RandomAccessGate),
    ReducingExtension(ReducingExtensionGate),
    Reducing(ReducingGate),
}

macro_rules! dispatch {
    ($self:ident, $gate:ident => $e:expr) => {
        match $self {
            Gate::Arithmetic($gate) => $e,
            Gate::ArithmeticExtension($gate) => $e,
            Gate::BaseSum($gate) => $e,
            Gate::Constant($gate) => $e,
            Gate::CosetInterpolation($gate) => $e,
            Gate::Exponentiation($gate) => $e,
            Gate::MulExtension($gate) => $e,
            Gate::Noop($gate) => $e,
            Gate::Poseidon($gate) => $e,
            Gate::PoseidonMds($gate) => $e,
            Gate::PublicInput($gate) => $e,
            Gate::RandomAccess($gate) => $e,
            Gate::ReducingExtension($gate) => $e,
            Gate::Reducing($gate) => $e,
        }
    };
}

impl CircuitGate for Gate {
    fn id(&self) -> String {
        dispatch!(self, g => g.id())
    }

    fn num_wires(&self) -> usize {
        dispatch!(self, g => g.num_wires())
    }

    fn num_constants(&self) -> usize {
        dispatch!(self, g => g.num_constants())
    }

    fn num_constraints(&self) -> usize {
        dispatch!(self, g => g.num_constraints())
    }

    fn eval_unfiltered<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        vars: &EvaluationVarsExt<'_>,
    ) -> Vec<ExtVar> {
        dispatch!(self, g => g.eval_unfiltered(cs, vars))
    }
}

impl serde::Serialize for Gate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id())
    }
}

impl<'de> serde::Deserialize<'de> for Gate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = <String as serde::Deserialize>::deserialize(deserializer)?;
        parse_gate_id(&id).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn gl(value: u64) -> GoldilocksField {
    GoldilocksField::from_canonical_u64(value)
}

/// A constant of the base field embedded in the extension.
pub(crate) fn ext_constant<F: Scalar>(cs: &mut TurboCS<F>, value: GoldilocksField) -> ExtVar {
    let c = GoldilocksVar::alloc_constant(cs, value);
    ExtVar::from_base(cs, c)
}

/// Return `Σ c_i·x_i` for base field constants `c_i`, reduced once per limb.
pub(crate) fn ext_weighted_sum<F: Scalar>(
    cs: &mut TurboCS<F>,
    terms: &[(ExtVar, GoldilocksField)],
) -> ExtVar {
    let limb = |cs: &mut TurboCS<F>, i: usize| {
        let limb_terms = terms.iter().map(|(x, c)| (x.0[i], *c)).collect_vec();
        GoldilocksVar::weighted_sum_no_reduce(cs, &limb_terms).reduce(cs)
    };
    let l0 = limb(cs, 0);
    let l1 = limb(cs, 1);
    ExtVar([l0, l1])
}

/// Return `Σ c_i·x_i` over the extension algebra for base field constants.
pub(crate) fn ext_algebra_weighted_sum<F: Scalar>(
    cs: &mut TurboCS<F>,
    terms: &[(ExtAlgebraVar, GoldilocksField)],
) -> ExtAlgebraVar {
    let coordinate = |cs: &mut TurboCS<F>, j: usize| {
        let coordinate_terms = terms.iter().map(|(x, c)| (x.0[j], *c)).collect_vec();
        ext_weighted_sum(cs, &coordinate_terms)
    };
    let b0 = coordinate(cs, 0);
    let b1 = coordinate(cs, 1);
    ExtAlgebraVar([b0, b1])
}

/// Flatten algebra constraints into their extension coordinates.
pub(crate) fn flatten_algebra(constraints: Vec<ExtAlgebraVar>) -> Vec<ExtVar> {
    constraints
        .into_iter()
        .flat_map(|c| c.to_basefield_array())
        .collect()
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::{CircuitGate, EvaluationVarsExt, Gate};
    use crate::deserializer::parse_gate_id;
    use plonky2::gates::gate::Gate as PlonkyGate;
    use plonky2::hash::hash_types::HashOut;
    use plonky2::plonk::vars::EvaluationVars;
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{Field, GoldilocksExt, GoldilocksField, QuadraticExtension, GOLDILOCKS_MODULUS},
        prelude::*,
    };
    use plover_plonk::constraint_system::{ExtVar, HashOutVar, TurboCS};

    pub(crate) fn random_goldilocks<R: RngCore>(rng: &mut R) -> GoldilocksField {
        GoldilocksField::from_canonical_u64(rng.next_u64() % GOLDILOCKS_MODULUS)
    }

    pub(crate) fn random_ext<R: RngCore>(rng: &mut R) -> GoldilocksExt {
        QuadraticExtension([random_goldilocks(rng), random_goldilocks(rng)])
    }

    /// Evaluate `ours` in-circuit and `theirs` natively on the same random
    /// openings, compare the constraints, then check the witness and that
    /// tampering with a constraint breaks it.
    pub(crate) fn check_against_plonky2<G: PlonkyGate<GoldilocksField, 2>>(ours: &Gate, theirs: &G) {
        assert_eq!(ours.id(), theirs.id());
        assert_eq!(&parse_gate_id(&theirs.id()).unwrap(), ours);
        assert_eq!(ours.num_wires(), theirs.num_wires());
        assert_eq!(ours.num_constants(), theirs.num_constants());
        assert_eq!(ours.num_constraints(), theirs.num_constraints());

        let mut rng = test_rng();
        let constants = (0..ours.num_constants())
            .map(|_| random_ext(&mut rng))
            .collect::<Vec<_>>();
        let wires = (0..ours.num_wires())
            .map(|_| random_ext(&mut rng))
            .collect::<Vec<_>>();
        let hash = HashOut {
            elements: [0; 4].map(|_| random_goldilocks(&mut rng)),
        };
        let expected = theirs.eval_unfiltered(EvaluationVars {
            local_constants: &constants,
            local_wires: &wires,
            public_inputs_hash: &hash,
        });

        let mut cs = TurboCS::<BN254Scalar>::new();
        let constant_vars = constants
            .iter()
            .map(|c| ExtVar::alloc_witness(&mut cs, *c))
            .collect::<Vec<_>>();
        let wire_vars = wires
            .iter()
            .map(|w| ExtVar::alloc_witness(&mut cs, *w))
            .collect::<Vec<_>>();
        let hash_var = HashOutVar::alloc_witness(&mut cs, &hash.elements);
        let vars = EvaluationVarsExt {
            local_constants: &constant_vars,
            local_wires: &wire_vars,
            public_inputs_hash: &hash_var,
        };
        let constraints = ours.eval_unfiltered(&mut cs, &vars);
        assert_eq!(constraints.len(), expected.len());
        for (c, e) in constraints.iter().zip(expected.iter()) {
            assert_eq!(c.value(&cs), *e);
        }

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        if let Some(c) = constraints.first() {
            witness[c.0[0].var].add_assign(&BN254Scalar::one());
            assert!(cs.verify_witness(&witness, &[]).is_err());
        }
    }
}
