use crate::bn254::BN254Scalar;
use ark_std::{fmt, string::String, vec::Vec};
use serde::de::{Error, Visitor};

/// Implement serde for a scalar type: decimal strings for human-readable
/// formats, little-endian bytes otherwise.
#[macro_export]
macro_rules! serialize_deserialize {
    ($t:ident) => {
        impl serde::Serialize for $t {
            fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                if serializer.is_human_readable() {
                    let big: num_bigint::BigUint = (*self).into();
                    serializer.serialize_str(&big.to_str_radix(10))
                } else {
                    serializer.serialize_bytes(&$crate::traits::Scalar::to_bytes(self))
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                if deserializer.is_human_readable() {
                    let s = deserializer.deserialize_any($crate::serialization::DecimalVisitor)?;
                    <$t as core::str::FromStr>::from_str(&s).map_err(serde::de::Error::custom)
                } else {
                    let bytes = deserializer.deserialize_bytes($crate::serialization::BytesVisitor)?;
                    <$t as $crate::traits::Scalar>::from_bytes(bytes.as_slice())
                        .map_err(serde::de::Error::custom)
                }
            }
        }
    };
}

/// Accepts a decimal string or an unsigned integer and yields its decimal text.
pub struct DecimalVisitor;

impl<'de> Visitor<'de> for DecimalVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a decimal string or an unsigned integer")
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::custom(format!("invalid decimal `{}`", v)));
        }
        Ok(String::from(v))
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }
}

/// Collects raw bytes.
pub struct BytesVisitor;

impl<'de> Visitor<'de> for BytesVisitor {
    type Value = Vec<u8>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a byte array")
    }

    fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(v.to_vec())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut bytes = Vec::new();
        while let Some(b) = seq.next_element::<u8>()? {
            bytes.push(b);
        }
        Ok(bytes)
    }
}

serialize_deserialize!(BN254Scalar);

