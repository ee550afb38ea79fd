//! Plover verifies Plonky2 proofs inside a BN254 arithmetic circuit.
//!
//! A proof, its verifier-only data and the common circuit data are read from
//! the JSON plonky2 produces, allocated as variables of a [`TurboCS`] and
//! checked there: the Fiat-Shamir transcript is replayed with the Goldilocks
//! Poseidon chip, the Plonk identity is evaluated at `ζ` through the gate
//! library, and every FRI query is verified against Merkle caps hashed with
//! the BN254 Poseidon.
//!
//! [`TurboCS`]: plover_plonk::constraint_system::TurboCS
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
#![allow(clippy::needless_range_loop, clippy::too_many_arguments)]

#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate lazy_static;

/// The in-circuit Fiat-Shamir transcript.
pub mod challenger;
/// Parsing and validation of the JSON artifacts.
pub mod deserializer;
/// Module for error handling.
pub mod errors;
/// The FRI verifier.
pub mod fri;
/// The gate library and its evaluator.
pub mod gates;
/// Merkle cap openings.
pub mod merkle;
/// Constants of the proof system.
pub mod parameters;
/// The Plonk identity check.
pub mod plonk;
/// The proof and circuit data as plonky2 serializes them.
pub mod structs;
/// The proof data allocated as circuit variables.
pub mod vars;
/// The entry points.
pub mod verifier;

pub use errors::PloverError;
pub use verifier::{build_verifier_circuit, verify, verify_proof, verify_proof_json};
