//! Native (out-of-circuit) primitives of Plover: the width-4 Poseidon
//! permutation over the BN254 scalar field, Merkle cap trees built from it,
//! and the duplex challenger used by Plonky2 transcripts.
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

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_derive;

/// The module for the native duplex challenger.
pub mod challenger;
/// The module for error handling.
pub mod errors;
/// The module for Merkle cap trees.
pub mod merkle_tree;
/// The module for the Poseidon permutation over BN254.
pub mod poseidon_bn254;
