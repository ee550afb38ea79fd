use ark_std::{boxed::Box, error, fmt, format, string::String};
use plover_algebra::prelude::AlgebraError;
use plover_crypto::errors::CryptoError;
use plover_plonk::errors::PlonkError;

pub(crate) type Result<T> = core::result::Result<T, PloverError>;

#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum PloverError {
    Algebra(AlgebraError),
    Crypto(CryptoError),
    Plonk(PlonkError),
    /// The artifacts could not be parsed or do not match the circuit shape.
    Deserialization(String),
    /// The circuit built for the proof is not satisfied.
    VerificationError,
    UnsupportedGate(String),
    UnsupportedLookups,
}

impl fmt::Display for PloverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PloverError::*;
        f.write_str(match self {
            Algebra(e) => Box::leak(format!("Algebra: {}", e).into_boxed_str()),
            Crypto(e) => Box::leak(format!("Crypto: {}", e).into_boxed_str()),
            Plonk(e) => Box::leak(format!("Plonk: {}", e).into_boxed_str()),
            Deserialization(e) => Box::leak(format!("Deserialization: {}", e).into_boxed_str()),
            VerificationError => "The proof does not verify",
            UnsupportedGate(id) => Box::leak(format!("Unsupported gate: {}", id).into_boxed_str()),
            UnsupportedLookups => "Lookup tables are not supported",
        })
    }
}

impl error::Error for PloverError {}

impl From<AlgebraError> for PloverError {
    fn from(e: AlgebraError) -> PloverError {
        PloverError::Algebra(e)
    }
}

impl From<CryptoError> for PloverError {
    fn from(e: CryptoError) -> PloverError {
        PloverError::Crypto(e)
    }
}

impl From<PlonkError> for PloverError {
    fn from(e: PlonkError) -> PloverError {
        PloverError::Plonk(e)
    }
}

impl From<serde_json::Error> for PloverError {
    fn from(e: serde_json::Error) -> PloverError {
        PloverError::Deserialization(e.to_string())
    }
}
