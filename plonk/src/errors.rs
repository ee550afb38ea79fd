use ark_std::{boxed::Box, error, fmt, format, string::String};
use plover_algebra::prelude::AlgebraError;

pub(crate) type Result<T> = core::result::Result<T, PlonkError>;

#[derive(Debug, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum PlonkError {
    /// Algebra error
    Algebra(AlgebraError),
    /// Error with message
    Message(String),
    /// Function params error.
    FuncParamsError,
    /// The witness does not satisfy the constraint system.
    UnsatisfiedWitness(usize),
}

impl fmt::Display for PlonkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use PlonkError::*;
        f.write_str(match self {
            Algebra(e) => Box::leak(format!("Algebra: {}", e).into_boxed_str()),
            Message(e) => Box::leak(e.to_string().into_boxed_str()),
            FuncParamsError => "Function params error",
            UnsatisfiedWitness(i) => {
                Box::leak(format!("Constraint {} is not satisfied", i).into_boxed_str())
            }
        })
    }
}

impl error::Error for PlonkError {}

impl From<AlgebraError> for PlonkError {
    fn from(e: AlgebraError) -> PlonkError {
        PlonkError::Algebra(e)
    }
}
