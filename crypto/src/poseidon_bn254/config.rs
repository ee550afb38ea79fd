use super::{NativeHash, PoseidonBN254};
use plonky2::hash::poseidon::{PoseidonHash, PoseidonPermutation};
use plonky2::plonk::config::{GenericConfig, GenericHashOut, Hasher};
use plover_algebra::{
    bn254::BN254Scalar,
    goldilocks::{GoldilocksExt, GoldilocksField},
    prelude::*,
};

/// A native digest as a plonky2 hash output.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeHashOut(pub NativeHash);

impl GenericHashOut<GoldilocksField> for NativeHashOut {
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.0.to_bytes();
        bytes.resize(BN254Scalar::bytes_len(), 0);
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        Self(BN254Scalar::from_bytes(bytes).unwrap_or_default())
    }

    fn to_vec(&self) -> Vec<GoldilocksField> {
        PoseidonBN254::to_vec(&self.0).to_vec()
    }
}

/// The width-4 BN254 Poseidon as the hasher of plonky2 Merkle trees and
/// circuit digests. The transcript still runs the Goldilocks permutation.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PoseidonBN254Hash;

impl Hasher<GoldilocksField> for PoseidonBN254Hash {
    const HASH_SIZE: usize = 32;
    type Hash = NativeHashOut;
    type Permutation = PoseidonPermutation<GoldilocksField>;

    fn hash_no_pad(input: &[GoldilocksField]) -> Self::Hash {
        NativeHashOut(PoseidonBN254::hash_no_pad(input))
    }

    fn hash_or_noop(inputs: &[GoldilocksField]) -> Self::Hash {
        NativeHashOut(PoseidonBN254::hash_or_noop(inputs))
    }

    fn two_to_one(left: Self::Hash, right: Self::Hash) -> Self::Hash {
        NativeHashOut(PoseidonBN254::two_to_one(&left.0, &right.0))
    }
}

/// The plonky2 configuration whose proofs are verified over BN254: Goldilocks
/// with its quadratic extension, BN254 Poseidon commitments and the
/// Goldilocks Poseidon for public inputs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PoseidonBN254GoldilocksConfig;

impl GenericConfig<2> for PoseidonBN254GoldilocksConfig {
    type F = GoldilocksField;
    type FE = GoldilocksExt;
    type Hasher = PoseidonBN254Hash;
    type InnerHasher = PoseidonHash;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::merkle_tree::MerkleTree;
    use plonky2::hash::merkle_tree::MerkleTree as PlonkyMerkleTree;
    use plover_algebra::goldilocks::{Field, GOLDILOCKS_MODULUS};

    #[test]
    fn test_hash_out_bytes() {
        let mut rng = test_rng();
        let h = NativeHashOut(BN254Scalar::random(&mut rng));
        let bytes = h.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(NativeHashOut::from_bytes(&bytes), h);
        assert_eq!(h.to_vec().len(), 5);

        let json = serde_json::to_string(&h).unwrap();
        assert!(json.starts_with('"'));
        let back: NativeHashOut = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn test_cap_matches_plonky2_tree() {
        let mut rng = test_rng();
        let leaves = (0..16)
            .map(|_| {
                (0..7)
                    .map(|_| GoldilocksField::from_canonical_u64(rng.next_u64() % GOLDILOCKS_MODULUS))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let ours = MerkleTree::new(leaves.clone(), 2).unwrap();
        let theirs = PlonkyMerkleTree::<GoldilocksField, PoseidonBN254Hash>::new(leaves, 2);
        let theirs_cap = theirs.cap.0.iter().map(|h| h.0).collect::<Vec<_>>();
        assert_eq!(ours.cap().0, theirs_cap);
        let theirs_siblings = theirs.prove(5).siblings.iter().map(|h| h.0).collect::<Vec<_>>();
        assert_eq!(ours.prove(5).unwrap().siblings, theirs_siblings);
    }
}
