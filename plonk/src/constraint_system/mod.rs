use crate::errors::Result;
use plover_algebra::prelude::*;

/// Module for the quadratic extension chip.
pub mod extension;
/// Module for the Goldilocks chip.
pub mod goldilocks;
/// Module for the Poseidon permutation over BN254.
pub mod poseidon_bn254;
/// Module for the Poseidon permutation over Goldilocks.
pub mod poseidon_goldilocks;
/// Module for the TurboPLONK constraint system.
pub mod turbo;

pub use extension::{ExtAlgebraVar, ExtVar};
pub use goldilocks::GoldilocksVar;
pub use poseidon_bn254::NativeHashVar;
pub use poseidon_goldilocks::HashOutVar;
pub use turbo::TurboCS;

/// Variable index
pub type VarIndex = usize;
/// Constraint index
pub type CsIndex = usize;

/// Trait for PLONK constraint systems.
pub trait ConstraintSystem: Sized {
    /// The field of the circuit.
    type Field: Scalar;

    /// Return the number of constraints in the system.
    fn size(&self) -> usize;

    /// Return number of variables in the constrain system
    fn num_vars(&self) -> usize;

    /// Return the wiring of the constrain system
    fn wiring(&self) -> &[Vec<usize>];

    /// Return the number of wires in a single gate.
    fn n_wires_per_gate() -> usize;

    /// Return the number of selectors.
    fn num_selectors(&self) -> usize;

    /// Compute the indices of the constraints related to public inputs.
    fn public_vars_constraint_indices(&self) -> &[usize];

    /// Compute the indices of the witnesses related to public inputs.
    fn public_vars_witness_indices(&self) -> &[usize];

    /// Borrow the (index)-th selector vector.
    fn selector(&self, index: usize) -> Result<&[Self::Field]>;

    /// Evaluate the constraint equation given public input and the values of the wires and the selectors.
    fn eval_gate_func(
        wire_vals: &[&Self::Field],
        sel_vals: &[&Self::Field],
        pub_input: &Self::Field,
    ) -> Result<Self::Field>;
}
