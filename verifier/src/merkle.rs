use crate::vars::{MerkleCapVar, MerkleProofVar, VerifierCS};
use plover_plonk::constraint_system::{ExtVar, GoldilocksVar, NativeHashVar, VarIndex};

/// Values that can be chosen by boolean variables.
pub trait SelectVar: Copy {
    /// Return `a` if `bit` is 0 and `b` otherwise.
    fn select(cs: &mut VerifierCS, a: &Self, b: &Self, bit: VarIndex) -> Self;

    /// Return `values[b0 + 2·b1]`.
    fn lookup2(cs: &mut VerifierCS, b0: VarIndex, b1: VarIndex, values: &[Self; 4]) -> Self;
}

impl SelectVar for NativeHashVar {
    fn select(cs: &mut VerifierCS, a: &Self, b: &Self, bit: VarIndex) -> Self {
        NativeHashVar(cs.select(a.0, b.0, bit))
    }

    fn lookup2(cs: &mut VerifierCS, b0: VarIndex, b1: VarIndex, values: &[Self; 4]) -> Self {
        NativeHashVar(cs.lookup2(b0, b1, &values.map(|v| v.0)))
    }
}

impl SelectVar for GoldilocksVar {
    fn select(cs: &mut VerifierCS, a: &Self, b: &Self, bit: VarIndex) -> Self {
        GoldilocksVar::select(cs, a, b, bit)
    }

    fn lookup2(cs: &mut VerifierCS, b0: VarIndex, b1: VarIndex, values: &[Self; 4]) -> Self {
        GoldilocksVar::lookup2(cs, b0, b1, values)
    }
}

impl SelectVar for ExtVar {
    fn select(cs: &mut VerifierCS, a: &Self, b: &Self, bit: VarIndex) -> Self {
        ExtVar::select(cs, a, b, bit)
    }

    fn lookup2(cs: &mut VerifierCS, b0: VarIndex, b1: VarIndex, values: &[Self; 4]) -> Self {
        ExtVar::lookup2(cs, b0, b1, values)
    }
}

/// Return `values[Σ bits[i]·2^i]`. Two bits are consumed per `lookup2`
/// level, the least significant first; an odd bit left at the top is a
/// `select`.
pub fn random_access<T: SelectVar>(cs: &mut VerifierCS, values: &[T], bits: &[VarIndex]) -> T {
    assert_eq!(values.len(), 1 << bits.len(), "selection table size");
    let mut values = values.to_vec();
    let mut bits = bits;
    while bits.len() >= 2 {
        values = values
            .chunks(4)
            .map(|c| T::lookup2(cs, bits[0], bits[1], &[c[0], c[1], c[2], c[3]]))
            .collect();
        bits = &bits[2..];
    }
    if let Some(bit) = bits.first() {
        values = vec![T::select(cs, &values[0], &values[1], *bit)];
    }
    values[0]
}

/// Check that `leaf` sits below the cap entry `cap_index_bits` at the path
/// `leaf_index_bits`. Both orders of each compression are computed and the
/// index bit picks one (`1` puts the sibling on the left).
pub fn verify_merkle_proof_to_cap_with_cap_index(
    cs: &mut VerifierCS,
    leaf: &[GoldilocksVar],
    leaf_index_bits: &[VarIndex],
    cap_index_bits: &[VarIndex],
    cap: &MerkleCapVar,
    proof: &MerkleProofVar,
) {
    assert_eq!(
        leaf_index_bits.len(),
        proof.siblings.len(),
        "path length does not match the index"
    );
    let mut digest = cs.poseidon_bn254_hash_or_noop(leaf);
    for (bit, sibling) in leaf_index_bits.iter().zip(proof.siblings.iter()) {
        let left = cs.poseidon_bn254_two_to_one(&digest, sibling);
        let right = cs.poseidon_bn254_two_to_one(sibling, &digest);
        digest = NativeHashVar::select(cs, &left, &right, *bit);
    }
    let expected = random_access(cs, &cap.0, cap_index_bits);
    cs.equal(digest.0, expected.0);
}

/// Check that `leaf` sits at the index of bits `index_bits` below `cap`: the
/// low bits follow the path and the remaining ones pick the cap entry.
pub fn verify_merkle_proof_to_cap(
    cs: &mut VerifierCS,
    leaf: &[GoldilocksVar],
    index_bits: &[VarIndex],
    cap: &MerkleCapVar,
    proof: &MerkleProofVar,
) {
    let (path_bits, cap_bits) = index_bits.split_at(proof.siblings.len());
    verify_merkle_proof_to_cap_with_cap_index(cs, leaf, path_bits, cap_bits, cap, proof);
}

#[cfg(test)]
mod test {
    use super::{random_access, verify_merkle_proof_to_cap};
    use crate::vars::{MerkleCapVar, MerkleProofVar, VerifierCS};
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{Field, GoldilocksField},
        prelude::*,
    };
    use plover_crypto::merkle_tree::MerkleTree;
    use plover_plonk::constraint_system::GoldilocksVar;

    fn random_leaves<R: RngCore>(rng: &mut R, n: usize, leaf_len: usize) -> Vec<Vec<GoldilocksField>> {
        (0..n)
            .map(|_| {
                (0..leaf_len)
                    .map(|_| GoldilocksField::from_canonical_u64(rng.next_u64() >> 1))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_random_access() {
        let mut cs = VerifierCS::new();
        for n_bits in 1..6 {
            let values = (0..1u64 << n_bits)
                .map(|v| GoldilocksVar::alloc_constant(&mut cs, GoldilocksField::from_canonical_u64(v + 100)))
                .collect::<Vec<_>>();
            for index in [0, (1 << n_bits) - 1, (1 << n_bits) / 3] {
                let index_var = cs.new_variable(BN254Scalar::from(index as u64));
                let bits = cs.range_check(index_var, n_bits);
                let selected = random_access(&mut cs, &values, &bits);
                assert_eq!(
                    selected.value(&cs),
                    GoldilocksField::from_canonical_u64(index as u64 + 100)
                );
            }
        }
        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }

    #[test]
    fn test_merkle_proof() {
        let mut rng = test_rng();
        for (log_n, cap_height, leaf_len) in [(4, 0, 2), (5, 1, 7), (6, 3, 12), (4, 4, 3)] {
            let leaves = random_leaves(&mut rng, 1 << log_n, leaf_len);
            let tree = MerkleTree::new(leaves.clone(), cap_height).unwrap();
            let index = (rng.next_u32() as usize) % (1 << log_n);
            let proof = tree.prove(index).unwrap();

            let mut cs = VerifierCS::new();
            let cap = MerkleCapVar::alloc_witness(&mut cs, tree.cap());
            let proof_var = MerkleProofVar {
                siblings: proof
                    .siblings
                    .iter()
                    .map(|h| cs.new_native_hash_variable(*h))
                    .collect(),
            };
            let leaf = leaves[index]
                .iter()
                .map(|e| GoldilocksVar::alloc_witness(&mut cs, *e))
                .collect::<Vec<_>>();
            let index_var = cs.new_variable(BN254Scalar::from(index as u64));
            let bits = cs.range_check(index_var, log_n);
            verify_merkle_proof_to_cap(&mut cs, &leaf, &bits, &cap, &proof_var);

            let mut witness = cs.get_and_clear_witness();
            assert!(cs.verify_witness(&witness, &[]).is_ok());

            witness[leaf[0].var] = witness[leaf[0].var] + BN254Scalar::one();
            assert!(cs.verify_witness(&witness, &[]).is_err());
        }
    }

    #[test]
    fn test_merkle_proof_wrong_index() {
        let mut rng = test_rng();
        let leaves = random_leaves(&mut rng, 16, 4);
        let tree = MerkleTree::new(leaves.clone(), 2).unwrap();
        let proof = tree.prove(5).unwrap();

        let mut cs = VerifierCS::new();
        let cap = MerkleCapVar::alloc_constant(&mut cs, tree.cap());
        let proof_var = MerkleProofVar {
            siblings: proof
                .siblings
                .iter()
                .map(|h| cs.new_native_hash_variable(*h))
                .collect(),
        };
        let leaf = leaves[5]
            .iter()
            .map(|e| GoldilocksVar::alloc_witness(&mut cs, *e))
            .collect::<Vec<_>>();
        let index_var = cs.new_variable(BN254Scalar::from(13u64));
        let bits = cs.range_check(index_var, 4);
        verify_merkle_proof_to_cap(&mut cs, &leaf, &bits, &cap, &proof_var);

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }
}
