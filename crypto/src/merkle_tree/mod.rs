use crate::errors::{CryptoError, Result};
use crate::poseidon_bn254::{NativeHash, PoseidonBN254};
use plover_algebra::{goldilocks::GoldilocksField, prelude::*};

/// The top `2^cap_height` nodes of a Merkle tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleCap(pub Vec<NativeHash>);

impl MerkleCap {
    /// Return the number of cap entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true when the cap is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the cap height.
    pub fn height(&self) -> usize {
        log2_strict(self.len())
    }
}

/// The siblings on the path from a leaf up to the cap.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Siblings, from the leaf level upwards.
    pub siblings: Vec<NativeHash>,
}

/// A Merkle tree over leaves of Goldilocks elements, hashed with the native
/// Poseidon and committed through a cap.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// The leaves.
    pub leaves: Vec<Vec<GoldilocksField>>,
    /// The node layers, `layers[0]` being the leaf digests and the last one
    /// the cap.
    layers: Vec<Vec<NativeHash>>,
    /// The cap.
    pub cap: MerkleCap,
}

impl MerkleTree {
    /// Build a tree; the number of leaves must be a power of two and at least
    /// `2^cap_height`.
    pub fn new(leaves: Vec<Vec<GoldilocksField>>, cap_height: usize) -> Result<Self> {
        if !leaves.len().is_power_of_two() || leaves.len() < (1 << cap_height) {
            return Err(CryptoError::ParameterError);
        }
        let log_n = log2_strict(leaves.len());

        let mut layers = vec![leaves
            .iter()
            .map(|leaf| PoseidonBN254::hash_or_noop(leaf))
            .collect_vec()];
        for _ in 0..log_n - cap_height {
            let prev = layers.last().ok_or(CryptoError::ParameterError)?;
            let next = prev
                .chunks(2)
                .map(|pair| PoseidonBN254::two_to_one(&pair[0], &pair[1]))
                .collect_vec();
            layers.push(next);
        }
        let cap = MerkleCap(layers.last().cloned().unwrap_or_default());

        Ok(Self { leaves, layers, cap })
    }

    /// Return the cap.
    pub fn cap(&self) -> &MerkleCap {
        &self.cap
    }

    /// Produce the path for the leaf at `leaf_index`.
    pub fn prove(&self, leaf_index: usize) -> Result<MerkleProof> {
        if leaf_index >= self.leaves.len() {
            return Err(CryptoError::ParameterError);
        }
        let siblings = self.layers[..self.layers.len() - 1]
            .iter()
            .enumerate()
            .map(|(level, layer)| layer[(leaf_index >> level) ^ 1])
            .collect_vec();
        Ok(MerkleProof { siblings })
    }
}

/// Verify that `leaf` sits at `leaf_index` below `cap`. The low index bits
/// select the path, the remaining high bits the cap entry.
pub fn verify_merkle_proof_to_cap(
    leaf: &[GoldilocksField],
    leaf_index: usize,
    cap: &MerkleCap,
    proof: &MerkleProof,
) -> Result<()> {
    let mut index = leaf_index;
    let mut digest = PoseidonBN254::hash_or_noop(leaf);
    for sibling in proof.siblings.iter() {
        digest = if index & 1 == 1 {
            PoseidonBN254::two_to_one(sibling, &digest)
        } else {
            PoseidonBN254::two_to_one(&digest, sibling)
        };
        index >>= 1;
    }

    match cap.0.get(index) {
        Some(expected) if *expected == digest => Ok(()),
        _ => Err(CryptoError::MerkleTreeVerificationError),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use plover_algebra::goldilocks::Field;

    fn random_leaves(n: usize, leaf_len: usize) -> Vec<Vec<GoldilocksField>> {
        let mut rng = test_rng();
        (0..n)
            .map(|_| {
                (0..leaf_len)
                    .map(|_| GoldilocksField::from_canonical_u64(rng.next_u64() >> 1))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_merkle_tree_prove_and_verify() {
        for (cap_height, leaf_len) in [(0usize, 7usize), (2, 2), (3, 12)] {
            let leaves = random_leaves(16, leaf_len);
            let tree = MerkleTree::new(leaves.clone(), cap_height).unwrap();
            assert_eq!(tree.cap().len(), 1 << cap_height);
            assert_eq!(tree.cap().height(), cap_height);

            for (i, leaf) in leaves.iter().enumerate() {
                let proof = tree.prove(i).unwrap();
                assert_eq!(proof.siblings.len(), 4 - cap_height);
                assert!(verify_merkle_proof_to_cap(leaf, i, tree.cap(), &proof).is_ok());
                assert!(
                    verify_merkle_proof_to_cap(leaf, (i + 1) % 16, tree.cap(), &proof).is_err()
                );
            }

            let mut bad_leaf = leaves[5].clone();
            bad_leaf[0] += GoldilocksField::ONE;
            let proof = tree.prove(5).unwrap();
            assert!(verify_merkle_proof_to_cap(&bad_leaf, 5, tree.cap(), &proof).is_err());
        }
    }

    #[test]
    fn test_merkle_tree_bad_shape() {
        assert!(MerkleTree::new(random_leaves(6, 1), 0).is_err());
        assert!(MerkleTree::new(random_leaves(4, 1), 3).is_err());
        let tree = MerkleTree::new(random_leaves(4, 1), 2).unwrap();
        assert!(tree.prove(0).unwrap().siblings.is_empty());
        assert!(tree.prove(4).is_err());
    }
}
