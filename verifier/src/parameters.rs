/// The number of random elements appended to each leaf of a blinded oracle
/// when the FRI parameters are hiding.
pub const SALT_SIZE: usize = 4;

/// The selector value of rows that use no gate of a selector group.
pub const UNUSED_SELECTOR: u64 = u32::MAX as u64;

/// The extension degree of every supported configuration.
pub const D: usize = 2;

/// The number of Plonk oracles opened by FRI: constants and sigmas, wires,
/// Zs and partial products, quotient chunks.
pub const NUM_ORACLES: usize = 4;

/// Whether each oracle is blinded when the proof is zero-knowledge.
pub const ORACLE_BLINDING: [bool; NUM_ORACLES] = [false, true, true, true];

/// The largest FRI arity, in bits, the folding chip supports.
pub const MAX_ARITY_BITS: usize = 4;
