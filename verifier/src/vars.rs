use crate::errors::Result;
use crate::structs::{
    FriInitialTreeProof, FriProof, FriQueryRound, FriQueryStep, OpeningSet, PolynomialCoeffs,
    Proof, ProofWithPublicInputs, RawExt, VerifierOnlyCircuitData,
};
use plover_algebra::{
    bn254::BN254Scalar,
    goldilocks::{goldilocks_ext_from_canonical, goldilocks_from_canonical},
};
use plover_crypto::merkle_tree::{MerkleCap, MerkleProof};
use plover_plonk::constraint_system::{ExtVar, GoldilocksVar, NativeHashVar, TurboCS};

/// The builder every verifier variable lives in.
pub type VerifierCS = TurboCS<BN254Scalar>;

fn alloc_ext(cs: &mut VerifierCS, value: &RawExt) -> Result<ExtVar> {
    Ok(ExtVar::alloc_witness(cs, goldilocks_ext_from_canonical(*value)?))
}

fn alloc_exts(cs: &mut VerifierCS, values: &[RawExt]) -> Result<Vec<ExtVar>> {
    values.iter().map(|v| alloc_ext(cs, v)).collect()
}

fn alloc_goldilocks(cs: &mut VerifierCS, values: &[u64]) -> Result<Vec<GoldilocksVar>> {
    values
        .iter()
        .map(|v| Ok(GoldilocksVar::alloc_witness(cs, goldilocks_from_canonical(*v)?)))
        .collect()
}

/// The entries of a Merkle cap.
#[derive(Clone, Debug)]
pub struct MerkleCapVar(pub Vec<NativeHashVar>);

impl MerkleCapVar {
    /// Alloc a cap sent by the prover.
    pub fn alloc_witness(cs: &mut VerifierCS, cap: &MerkleCap) -> Self {
        Self(cap.0.iter().map(|h| cs.new_native_hash_variable(*h)).collect())
    }

    /// Alloc a cap fixed by the circuit.
    pub fn alloc_constant(cs: &mut VerifierCS, cap: &MerkleCap) -> Self {
        Self(
            cap.0
                .iter()
                .map(|h| NativeHashVar(cs.new_constant_variable(*h)))
                .collect(),
        )
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cap has no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The siblings of a Merkle path.
#[derive(Clone, Debug)]
pub struct MerkleProofVar {
    /// Siblings from the leaf upwards.
    pub siblings: Vec<NativeHashVar>,
}

impl MerkleProofVar {
    fn alloc(cs: &mut VerifierCS, proof: &MerkleProof) -> Self {
        Self {
            siblings: proof
                .siblings
                .iter()
                .map(|h| cs.new_native_hash_variable(*h))
                .collect(),
        }
    }
}

/// The openings of the polynomials at `ζ` and `g·ζ`.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct OpeningSetVar {
    pub constants: Vec<ExtVar>,
    pub plonk_sigmas: Vec<ExtVar>,
    pub wires: Vec<ExtVar>,
    pub plonk_zs: Vec<ExtVar>,
    pub plonk_zs_next: Vec<ExtVar>,
    pub partial_products: Vec<ExtVar>,
    pub quotient_polys: Vec<ExtVar>,
}

impl OpeningSetVar {
    fn alloc(cs: &mut VerifierCS, openings: &OpeningSet) -> Result<Self> {
        Ok(Self {
            constants: alloc_exts(cs, &openings.constants)?,
            plonk_sigmas: alloc_exts(cs, &openings.plonk_sigmas)?,
            wires: alloc_exts(cs, &openings.wires)?,
            plonk_zs: alloc_exts(cs, &openings.plonk_zs)?,
            plonk_zs_next: alloc_exts(cs, &openings.plonk_zs_next)?,
            partial_products: alloc_exts(cs, &openings.partial_products)?,
            quotient_polys: alloc_exts(cs, &openings.quotient_polys)?,
        })
    }

    /// The openings at `ζ`, in the order the oracles commit to them.
    pub fn zeta_batch(&self) -> Vec<ExtVar> {
        [
            self.constants.as_slice(),
            &self.plonk_sigmas,
            &self.wires,
            &self.plonk_zs,
            &self.partial_products,
            &self.quotient_polys,
        ]
        .concat()
    }

    /// The openings at `g·ζ`.
    pub fn zeta_next_batch(&self) -> Vec<ExtVar> {
        self.plonk_zs_next.clone()
    }
}

/// The leaves of the four oracles at a query index, with their paths.
#[derive(Clone, Debug)]
pub struct FriInitialTreeProofVar {
    /// One `(leaf, path)` per oracle.
    pub evals_proofs: Vec<(Vec<GoldilocksVar>, MerkleProofVar)>,
}

impl FriInitialTreeProofVar {
    fn alloc(cs: &mut VerifierCS, proof: &FriInitialTreeProof) -> Result<Self> {
        let evals_proofs = proof
            .evals_proofs
            .iter()
            .map(|(leaf, path)| Ok((alloc_goldilocks(cs, leaf)?, MerkleProofVar::alloc(cs, path))))
            .collect::<Result<_>>()?;
        Ok(Self { evals_proofs })
    }

    /// The leaf of `oracle` without its salt.
    pub fn unsalted_evals(&self, oracle: usize, salted: bool, salt_size: usize) -> &[GoldilocksVar] {
        let evals = &self.evals_proofs[oracle].0;
        let end = evals.len() - if salted { salt_size } else { 0 };
        &evals[..end]
    }
}

/// One folding step of a query.
#[derive(Clone, Debug)]
pub struct FriQueryStepVar {
    /// The evaluations on the coset of the query point.
    pub evals: Vec<ExtVar>,
    /// The path of the coset leaf.
    pub merkle_proof: MerkleProofVar,
}

impl FriQueryStepVar {
    fn alloc(cs: &mut VerifierCS, step: &FriQueryStep) -> Result<Self> {
        Ok(Self {
            evals: alloc_exts(cs, &step.evals)?,
            merkle_proof: MerkleProofVar::alloc(cs, &step.merkle_proof),
        })
    }
}

/// The openings answering one query.
#[derive(Clone, Debug)]
pub struct FriQueryRoundVar {
    /// The initial oracles.
    pub initial_trees_proof: FriInitialTreeProofVar,
    /// The folding steps.
    pub steps: Vec<FriQueryStepVar>,
}

impl FriQueryRoundVar {
    fn alloc(cs: &mut VerifierCS, round: &FriQueryRound) -> Result<Self> {
        Ok(Self {
            initial_trees_proof: FriInitialTreeProofVar::alloc(cs, &round.initial_trees_proof)?,
            steps: round
                .steps
                .iter()
                .map(|s| FriQueryStepVar::alloc(cs, s))
                .collect::<Result<_>>()?,
        })
    }
}

/// A polynomial over the extension, lowest coefficient first.
#[derive(Clone, Debug)]
pub struct PolynomialCoeffsExtVar(pub Vec<ExtVar>);

impl PolynomialCoeffsExtVar {
    fn alloc(cs: &mut VerifierCS, poly: &PolynomialCoeffs) -> Result<Self> {
        Ok(Self(alloc_exts(cs, &poly.coeffs)?))
    }

    /// Evaluate at `x` with Horner's rule.
    pub fn eval(&self, cs: &mut VerifierCS, x: &ExtVar) -> ExtVar {
        ExtVar::reduce_with_powers(cs, &self.0, x)
    }
}

/// The FRI proof.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FriProofVar {
    pub commit_phase_merkle_caps: Vec<MerkleCapVar>,
    pub query_round_proofs: Vec<FriQueryRoundVar>,
    pub final_poly: PolynomialCoeffsExtVar,
    pub pow_witness: GoldilocksVar,
}

impl FriProofVar {
    fn alloc(cs: &mut VerifierCS, proof: &FriProof) -> Result<Self> {
        Ok(Self {
            commit_phase_merkle_caps: proof
                .commit_phase_merkle_caps
                .iter()
                .map(|cap| MerkleCapVar::alloc_witness(cs, cap))
                .collect(),
            query_round_proofs: proof
                .query_round_proofs
                .iter()
                .map(|round| FriQueryRoundVar::alloc(cs, round))
                .collect::<Result<_>>()?,
            final_poly: PolynomialCoeffsExtVar::alloc(cs, &proof.final_poly)?,
            pow_witness: alloc_goldilocks(cs, &[proof.pow_witness])?[0],
        })
    }
}

/// The proof without its public inputs.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct ProofVar {
    pub wires_cap: MerkleCapVar,
    pub plonk_zs_partial_products_cap: MerkleCapVar,
    pub quotient_polys_cap: MerkleCapVar,
    pub openings: OpeningSetVar,
    pub opening_proof: FriProofVar,
}

impl ProofVar {
    fn alloc(cs: &mut VerifierCS, proof: &Proof) -> Result<Self> {
        Ok(Self {
            wires_cap: MerkleCapVar::alloc_witness(cs, &proof.wires_cap),
            plonk_zs_partial_products_cap: MerkleCapVar::alloc_witness(
                cs,
                &proof.plonk_zs_partial_products_cap,
            ),
            quotient_polys_cap: MerkleCapVar::alloc_witness(cs, &proof.quotient_polys_cap),
            openings: OpeningSetVar::alloc(cs, &proof.openings)?,
            opening_proof: FriProofVar::alloc(cs, &proof.opening_proof)?,
        })
    }
}

/// A proof and its public inputs as variables. The public inputs are also
/// public inputs of the outer circuit, in the same order.
#[derive(Clone, Debug)]
pub struct ProofWithPublicInputsVar {
    /// The proof.
    pub proof: ProofVar,
    /// The public inputs.
    pub public_inputs: Vec<GoldilocksVar>,
}

impl ProofWithPublicInputsVar {
    /// Alloc every value of the proof as a witness.
    pub fn alloc(cs: &mut VerifierCS, proof: &ProofWithPublicInputs) -> Result<Self> {
        let public_inputs = alloc_goldilocks(cs, &proof.public_inputs)?;
        for input in public_inputs.iter() {
            cs.prepare_pi_variable(input.var);
        }
        Ok(Self {
            proof: ProofVar::alloc(cs, &proof.proof)?,
            public_inputs,
        })
    }
}

/// The verifier-only data, fixed into the circuit as constants.
#[derive(Clone, Debug)]
pub struct VerifierOnlyCircuitDataVar {
    /// The cap of the constants and sigmas oracle.
    pub constants_sigmas_cap: MerkleCapVar,
    /// The digest of the circuit.
    pub circuit_digest: NativeHashVar,
}

impl VerifierOnlyCircuitDataVar {
    /// Alloc the data as constants.
    pub fn alloc_constant(cs: &mut VerifierCS, data: &VerifierOnlyCircuitData) -> Self {
        Self {
            constants_sigmas_cap: MerkleCapVar::alloc_constant(cs, &data.constants_sigmas_cap),
            circuit_digest: NativeHashVar(cs.new_constant_variable(data.circuit_digest)),
        }
    }
}

/// The FRI challenges.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct FriChallengesVar {
    pub fri_alpha: ExtVar,
    pub fri_betas: Vec<ExtVar>,
    pub fri_pow_response: GoldilocksVar,
    pub fri_query_indices: Vec<GoldilocksVar>,
}

/// Every challenge of a proof.
#[allow(missing_docs)]
#[derive(Clone, Debug)]
pub struct ProofChallengesVar {
    pub plonk_betas: Vec<GoldilocksVar>,
    pub plonk_gammas: Vec<GoldilocksVar>,
    pub plonk_alphas: Vec<GoldilocksVar>,
    pub plonk_zeta: ExtVar,
    pub fri_challenges: FriChallengesVar,
}

#[cfg(test)]
mod test {
    use super::{ProofWithPublicInputsVar, VerifierCS};
    use crate::errors::PloverError;
    use crate::structs::ProofWithPublicInputs;
    use plover_algebra::{bn254::BN254Scalar, goldilocks::GOLDILOCKS_MODULUS};

    #[test]
    fn test_public_inputs_are_outer_inputs() {
        let mut cs = VerifierCS::new();
        let proof = ProofWithPublicInputs {
            public_inputs: vec![0, 1, GOLDILOCKS_MODULUS - 1],
            ..Default::default()
        };
        let var = ProofWithPublicInputsVar::alloc(&mut cs, &proof).unwrap();
        assert_eq!(var.public_inputs.len(), 3);

        let online = proof
            .public_inputs
            .iter()
            .map(|v| BN254Scalar::from(*v))
            .collect::<Vec<_>>();
        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &online).is_ok());

        let mut bad_online = online.clone();
        bad_online[1] = BN254Scalar::from(2u64);
        assert!(cs.verify_witness(&witness, &bad_online).is_err());
    }

    #[test]
    fn test_reject_non_canonical() {
        let mut cs = VerifierCS::new();
        let proof = ProofWithPublicInputs {
            public_inputs: vec![GOLDILOCKS_MODULUS],
            ..Default::default()
        };
        assert!(matches!(
            ProofWithPublicInputsVar::alloc(&mut cs, &proof),
            Err(PloverError::Algebra(_))
        ));
    }
}
