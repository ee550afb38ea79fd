use ark_std::{error, fmt};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum AlgebraError {
    BitConversionError,
    DeserializationError,
    SerializationError,
    IndexError,
    ParameterError,
    InconsistentStructureError,
    GroupInversionError,
    NonCanonicalGoldilocks,
}

impl fmt::Display for AlgebraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use AlgebraError::*;
        f.write_str(match self {
            BitConversionError => "Bit conversion is not valid",
            DeserializationError => "Could not deserialize object",
            SerializationError => "Could not serialize object",
            IndexError => "Index out of bounds",
            ParameterError => "Unexpected parameter for method or function",
            InconsistentStructureError => "Plover structure is inconsistent",
            GroupInversionError => "Field element not invertible",
            NonCanonicalGoldilocks => "Value is not a canonical Goldilocks element",
        })
    }
}

impl error::Error for AlgebraError {}
