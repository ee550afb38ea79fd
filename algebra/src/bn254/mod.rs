/// The number of bytes for a scalar value over BN254.
pub const BN254_SCALAR_LEN: usize = 32;

mod fr;
pub use fr::*;

#[cfg(test)]
mod bn254_scalar_test {
    use crate::{bn254::BN254Scalar, prelude::*};
    use ark_std::str::FromStr;
    use num_bigint::BigUint;

    #[test]
    fn scalar_from_to_bytes() {
        let small_value = BN254Scalar::from(165747u32);
        let small_value_bytes = small_value.to_bytes();
        let expected_small_value_bytes: [u8; 32] = [
            115, 135, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0,
        ];
        assert_eq!(small_value_bytes, expected_small_value_bytes);

        let small_value_from_bytes = BN254Scalar::from_bytes(&small_value_bytes).unwrap();
        assert_eq!(small_value_from_bytes, small_value);
    }

    #[test]
    fn scalar_biguint_and_decimal() {
        let mut prng = test_rng();
        for _ in 0..8 {
            let a = BN254Scalar::random(&mut prng);
            let big: BigUint = a.into();
            assert_eq!(BN254Scalar::from(&big), a);
            let decimal = big.to_str_radix(10);
            assert_eq!(BN254Scalar::from_str(&decimal).unwrap(), a);
        }

        let modulus = BN254Scalar::get_field_size_biguint().to_str_radix(10);
        assert!(BN254Scalar::from_str(&modulus).is_err());
        assert!(BN254Scalar::from_str("12a").is_err());
    }

    #[test]
    fn scalar_inverse_and_pow() {
        let mut prng = test_rng();
        let a = BN254Scalar::random(&mut prng);
        let a_inv = a.inv().unwrap();
        assert_eq!(a.mul(&a_inv), BN254Scalar::one());
        assert!(BN254Scalar::zero().inv().is_err());

        let a5 = a.pow(&[5]);
        assert_eq!(a5, a.square().square().mul(&a));
        assert_eq!(BN254Scalar::from(7u64).to_u64(), Some(7));
    }

    #[test]
    fn scalar_serde_json() {
        let a = BN254Scalar::from(123456789u64);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"123456789\"");
        let b: BN254Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(a, b);
    }
}
