use ark_std::{boxed::Box, error, fmt, format};
use plover_algebra::prelude::AlgebraError;

pub(crate) type Result<T> = core::result::Result<T, CryptoError>;

#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum CryptoError {
    ParameterError,
    MerkleTreeVerificationError,
    Algebra(AlgebraError),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CryptoError::*;
        f.write_str(match self {
            ParameterError => "Unexpected parameter for method or function",
            MerkleTreeVerificationError => "Merkle proof does not match the cap",
            Algebra(e) => Box::leak(format!("Algebra: {}", e).into_boxed_str()),
        })
    }
}

impl error::Error for CryptoError {}

impl From<AlgebraError> for CryptoError {
    fn from(e: AlgebraError) -> CryptoError {
        CryptoError::Algebra(e)
    }
}
