//! The host constraint system of Plover and the field and hash chips that
//! emulate Goldilocks arithmetic on top of it.
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
#![allow(clippy::needless_borrow)]
#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate serde_derive;

/// Module for the constraint system and its chips.
pub mod constraint_system;

/// Module for error handling.
pub mod errors;
