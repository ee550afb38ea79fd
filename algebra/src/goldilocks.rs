use crate::prelude::*;
use num_bigint::BigUint;

pub use plonky2::field::extension::quadratic::QuadraticExtension;
pub use plonky2::field::extension::{Extendable, FieldExtension};
pub use plonky2::field::goldilocks_field::GoldilocksField;
pub use plonky2::field::types::{Field, PrimeField64};

/// The quadratic extension of the Goldilocks field, `F_p[X] / (X^2 - 7)`.
pub type GoldilocksExt = QuadraticExtension<GoldilocksField>;

/// The Goldilocks modulus `2^64 - 2^32 + 1`.
pub const GOLDILOCKS_MODULUS: u64 = 0xFFFF_FFFF_0000_0001;

/// The non-residue `W` with `X^2 = W` in the quadratic extension.
pub const GOLDILOCKS_EXT_W: u64 = 7;

/// The primitive square root of unity, i.e. `p - 1`; it is the Frobenius
/// twist of the quadratic extension.
pub const GOLDILOCKS_DTH_ROOT: u64 = 18446744069414584320;

/// The generator of the multiplicative group of the Goldilocks field.
pub const GOLDILOCKS_MULTIPLICATIVE_GENERATOR: u64 = 7;

/// The two-adicity of `p - 1`.
pub const GOLDILOCKS_TWO_ADICITY: usize = 32;

/// The extension degree used by Plonky2 proofs.
pub const EXTENSION_DEGREE: usize = 2;

/// Return the Goldilocks modulus as a `BigUint`.
pub fn goldilocks_modulus_biguint() -> BigUint {
    BigUint::from(GOLDILOCKS_MODULUS)
}

/// Build a Goldilocks element from a u64, rejecting non-canonical values.
pub fn goldilocks_from_canonical(value: u64) -> Result<GoldilocksField> {
    if value >= GOLDILOCKS_MODULUS {
        return Err(AlgebraError::NonCanonicalGoldilocks);
    }
    Ok(GoldilocksField::from_canonical_u64(value))
}

/// Build an extension element from its two canonical limbs.
pub fn goldilocks_ext_from_canonical(limbs: [u64; 2]) -> Result<GoldilocksExt> {
    Ok(QuadraticExtension([
        goldilocks_from_canonical(limbs[0])?,
        goldilocks_from_canonical(limbs[1])?,
    ]))
}

/// Embed a Goldilocks element into a native scalar field.
pub fn goldilocks_to_scalar<S: Scalar>(value: GoldilocksField) -> S {
    S::from(value.to_canonical_u64())
}

/// Read a native scalar as a Goldilocks element, reducing modulo `p`.
pub fn scalar_to_goldilocks<S: Scalar>(value: &S) -> GoldilocksField {
    let big: BigUint = (*value).into();
    let reduced = big % goldilocks_modulus_biguint();
    GoldilocksField::from_canonical_u64(reduced.iter_u64_digits().next().unwrap_or(0))
}

/// The primitive `2^n_log`-th root of unity of the Goldilocks field.
pub fn goldilocks_root_of_unity(n_log: usize) -> GoldilocksField {
    assert!(
        n_log <= GOLDILOCKS_TWO_ADICITY,
        "no root of unity of order 2^{}",
        n_log
    );
    GoldilocksField::primitive_root_of_unity(n_log)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bn254::BN254Scalar;

    #[test]
    fn goldilocks_constants() {
        let minus_one = GoldilocksField::from_canonical_u64(GOLDILOCKS_DTH_ROOT);
        assert_eq!(minus_one, -GoldilocksField::ONE);
        assert_eq!(
            GoldilocksField::MULTIPLICATIVE_GROUP_GENERATOR,
            GoldilocksField::from_canonical_u64(GOLDILOCKS_MULTIPLICATIVE_GENERATOR)
        );
        assert_eq!(
            <GoldilocksField as Extendable<2>>::W,
            GoldilocksField::from_canonical_u64(GOLDILOCKS_EXT_W)
        );
        let root = goldilocks_root_of_unity(4);
        assert_eq!(root.exp_u64(16), GoldilocksField::ONE);
        assert_ne!(root.exp_u64(8), GoldilocksField::ONE);
    }

    #[test]
    fn goldilocks_canonical_checks() {
        assert!(goldilocks_from_canonical(GOLDILOCKS_MODULUS - 1).is_ok());
        assert!(goldilocks_from_canonical(GOLDILOCKS_MODULUS).is_err());
        assert!(goldilocks_ext_from_canonical([1, u64::MAX]).is_err());
    }

    #[test]
    fn goldilocks_scalar_embedding() {
        let x = GoldilocksField::from_canonical_u64(GOLDILOCKS_MODULUS - 5);
        let s: BN254Scalar = goldilocks_to_scalar(x);
        assert_eq!(scalar_to_goldilocks(&s), x);

        let p = BN254Scalar::from(GOLDILOCKS_MODULUS);
        let wrapped = p.add(&BN254Scalar::from(3u64));
        assert_eq!(
            scalar_to_goldilocks(&wrapped),
            GoldilocksField::from_canonical_u64(3)
        );
    }
}
