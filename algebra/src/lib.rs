//! The algebra layer of Plover: the native BN254 scalar field used by the
//! host constraint system, and the Goldilocks field (with its quadratic
//! extension) in which Plonky2 proofs live.
#![deny(unused_import_braces, non_shorthand_field_patterns)]
#![deny(unused_attributes, unused_mut, unused_allocation)]
#![deny(unused_comparisons, bare_trait_objects, unused_must_use)]
#![forbid(unsafe_code)]
#![warn(
    unused,
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    rust_2021_compatibility,
    missing_docs
)]
#![allow(clippy::op_ref, clippy::upper_case_acronyms)]

#[macro_use]
extern crate serde_derive;

/// Module for the BN254 scalar field.
pub mod bn254;

/// Module for error handling.
pub mod errors;

/// Module for the Goldilocks field and its quadratic extension.
pub mod goldilocks;

/// Module for the prelude.
pub mod prelude;

/// Module for test rngs.
pub mod rand_helper;

/// Module for serialization of scalars.
pub mod serialization;

/// Module for traits.
pub mod traits;

/// Module for utils.
pub mod utils;

/// Re-export ark_std and num_bigint for the downstream crates.
pub use ark_std::{borrow, fmt, iter, ops, rand};
pub use num_bigint;
pub use num_traits::{One, Zero};
