use crate::gates::Gate;
use crate::parameters::{NUM_ORACLES, ORACLE_BLINDING, SALT_SIZE};
use ark_std::ops::Range;
use plover_crypto::merkle_tree::{MerkleCap, MerkleProof};
use plover_crypto::poseidon_bn254::NativeHash;

/// A Goldilocks element as plonky2 serializes it.
pub type RawGoldilocks = u64;

/// A quadratic extension element as its two limbs.
pub type RawExt = [u64; 2];

/// The values of the polynomials opened at `ζ` and `g·ζ`.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningSet {
    pub constants: Vec<RawExt>,
    pub plonk_sigmas: Vec<RawExt>,
    pub wires: Vec<RawExt>,
    pub plonk_zs: Vec<RawExt>,
    pub plonk_zs_next: Vec<RawExt>,
    #[serde(default)]
    pub lookup_zs: Vec<RawExt>,
    #[serde(default)]
    pub lookup_zs_next: Vec<RawExt>,
    pub partial_products: Vec<RawExt>,
    pub quotient_polys: Vec<RawExt>,
}

/// The leaves of the four Plonk oracles at a query index, with their paths.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriInitialTreeProof {
    pub evals_proofs: Vec<(Vec<RawGoldilocks>, MerkleProof)>,
}

/// One folding step of a query: the coset evaluations and their path.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FriQueryStepRepr")]
pub struct FriQueryStep {
    pub evals: Vec<RawExt>,
    pub merkle_proof: MerkleProof,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FriQueryStepRepr {
    Object {
        evals: Vec<RawExt>,
        merkle_proof: MerkleProof,
    },
    Pair(Vec<RawExt>, MerkleProof),
}

impl From<FriQueryStepRepr> for FriQueryStep {
    fn from(repr: FriQueryStepRepr) -> Self {
        match repr {
            FriQueryStepRepr::Object {
                evals,
                merkle_proof,
            }
            | FriQueryStepRepr::Pair(evals, merkle_proof) => Self {
                evals,
                merkle_proof,
            },
        }
    }
}

/// The openings answering one FRI query.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriQueryRound {
    pub initial_trees_proof: FriInitialTreeProof,
    pub steps: Vec<FriQueryStep>,
}

/// A polynomial by its coefficients, lowest degree first.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialCoeffs {
    pub coeffs: Vec<RawExt>,
}

/// The FRI low-degree proof.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriProof {
    pub commit_phase_merkle_caps: Vec<MerkleCap>,
    pub query_round_proofs: Vec<FriQueryRound>,
    pub final_poly: PolynomialCoeffs,
    pub pow_witness: RawGoldilocks,
}

/// A plonky2 proof.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub wires_cap: MerkleCap,
    pub plonk_zs_partial_products_cap: MerkleCap,
    pub quotient_polys_cap: MerkleCap,
    pub openings: OpeningSet,
    pub opening_proof: FriProof,
}

/// A plonky2 proof together with the public inputs it was made for.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofWithPublicInputs {
    pub proof: Proof,
    pub public_inputs: Vec<RawGoldilocks>,
}

/// The commitment to the preprocessed polynomials and the digest of the
/// whole circuit.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierOnlyCircuitData {
    pub constants_sigmas_cap: MerkleCap,
    pub circuit_digest: NativeHash,
}

/// How the prover chose the folding arities. The folding itself follows
/// `reduction_arity_bits` of [`FriParams`]; the strategy only enters the
/// transcript.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FriReductionStrategy {
    Fixed(Vec<usize>),
    ConstantArityBits(usize, usize),
    MinSize(Option<usize>),
}

/// The FRI settings of a circuit configuration.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriConfig {
    pub rate_bits: usize,
    pub cap_height: usize,
    pub proof_of_work_bits: u32,
    pub reduction_strategy: FriReductionStrategy,
    pub num_query_rounds: usize,
}

/// The FRI settings of a built circuit.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriParams {
    pub config: FriConfig,
    pub hiding: bool,
    pub degree_bits: usize,
    pub reduction_arity_bits: Vec<usize>,
}

impl FriReductionStrategy {
    /// The tagged encoding observed by the transcript.
    pub fn transcript_elements(&self) -> Vec<RawGoldilocks> {
        match self {
            FriReductionStrategy::Fixed(arity_bits) => core::iter::once(0)
                .chain(arity_bits.iter().map(|&x| x as u64))
                .collect(),
            FriReductionStrategy::ConstantArityBits(arity_bits, final_poly_bits) => {
                vec![1, *arity_bits as u64, *final_poly_bits as u64]
            }
            FriReductionStrategy::MinSize(max_arity_bits) => {
                vec![2, max_arity_bits.unwrap_or(0) as u64]
            }
        }
    }
}

impl FriParams {
    /// The elements the prover observes before the circuit digest: the FRI
    /// configuration, then hiding, the degree and the folding arities.
    pub fn transcript_elements(&self) -> Vec<RawGoldilocks> {
        let config = &self.config;
        let mut elements = vec![
            config.rate_bits as u64,
            config.cap_height as u64,
            config.proof_of_work_bits as u64,
        ];
        elements.extend(config.reduction_strategy.transcript_elements());
        elements.push(config.num_query_rounds as u64);
        elements.push(self.hiding as u64);
        elements.push(self.degree_bits as u64);
        elements.extend(self.reduction_arity_bits.iter().map(|&x| x as u64));
        elements
    }
}

/// The configuration a circuit was built with.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub num_wires: usize,
    pub num_routed_wires: usize,
    pub num_constants: usize,
    pub use_base_arithmetic_gate: bool,
    pub security_bits: usize,
    pub num_challenges: usize,
    pub zero_knowledge: bool,
    pub max_quotient_degree_factor: usize,
    pub fri_config: FriConfig,
}

/// Which constant column selects each gate, and the gate range of each
/// selector group.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorsInfo {
    pub selector_indices: Vec<usize>,
    pub groups: Vec<Range<usize>>,
}

/// The circuit description shared by prover and verifier.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonCircuitData {
    pub config: CircuitConfig,
    pub fri_params: FriParams,
    pub gates: Vec<Gate>,
    pub selectors_info: SelectorsInfo,
    pub quotient_degree_factor: usize,
    pub num_gate_constraints: usize,
    pub num_constants: usize,
    pub num_public_inputs: usize,
    pub k_is: Vec<RawGoldilocks>,
    pub num_partial_products: usize,
    #[serde(default)]
    pub num_lookup_polys: usize,
    #[serde(default)]
    pub num_lookup_selectors: usize,
    #[serde(default)]
    pub luts: Vec<Vec<(u16, u16)>>,
}

impl CommonCircuitData {
    /// The log of the trace length.
    pub fn degree_bits(&self) -> usize {
        self.fri_params.degree_bits
    }

    /// The trace length.
    pub fn degree(&self) -> usize {
        1 << self.degree_bits()
    }

    /// The log of the size of the low-degree extension domain.
    pub fn lde_bits(&self) -> usize {
        self.degree_bits() + self.fri_params.config.rate_bits
    }

    /// The size of the low-degree extension domain.
    pub fn lde_size(&self) -> usize {
        1 << self.lde_bits()
    }

    /// The number of repetitions of each Plonk challenge.
    pub fn num_challenges(&self) -> usize {
        self.config.num_challenges
    }

    /// The number of selector columns.
    pub fn num_selectors(&self) -> usize {
        self.selectors_info.groups.len()
    }

    /// Constants (selectors included) followed by the permutation sigmas.
    pub fn num_preprocessed_polys(&self) -> usize {
        self.num_constants + self.config.num_routed_wires
    }

    /// The number of polynomials of the Zs and partial products oracle.
    pub fn num_zs_partial_products_polys(&self) -> usize {
        self.num_challenges() * (1 + self.num_partial_products)
    }

    /// The number of quotient chunks.
    pub fn num_quotient_polys(&self) -> usize {
        self.num_challenges() * self.quotient_degree_factor
    }

    /// The number of committed polynomials of each oracle.
    pub fn oracle_sizes(&self) -> [usize; NUM_ORACLES] {
        [
            self.num_preprocessed_polys(),
            self.config.num_wires,
            self.num_zs_partial_products_polys(),
            self.num_quotient_polys(),
        ]
    }

    /// Whether the leaves of an oracle end with salt.
    pub fn is_salted(&self, oracle: usize) -> bool {
        self.fri_params.hiding && ORACLE_BLINDING[oracle]
    }

    /// The number of elements of a leaf of an oracle, salt included.
    pub fn leaf_len(&self, oracle: usize) -> usize {
        self.oracle_sizes()[oracle] + if self.is_salted(oracle) { SALT_SIZE } else { 0 }
    }

    /// The number of coefficients of the final FRI polynomial.
    pub fn final_poly_len(&self) -> usize {
        let total_arity_bits: usize = self.fri_params.reduction_arity_bits.iter().sum();
        1 << self.degree_bits().saturating_sub(total_arity_bits)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_query_step_forms() {
        let object = r#"{"evals":[[1,2],[3,4]],"merkle_proof":{"siblings":["5"]}}"#;
        let pair = r#"[[[1,2],[3,4]],{"siblings":["5"]}]"#;
        let a: FriQueryStep = serde_json::from_str(object).unwrap();
        let b: FriQueryStep = serde_json::from_str(pair).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.evals, vec![[1, 2], [3, 4]]);
        assert_eq!(a.merkle_proof.siblings.len(), 1);
    }

    #[test]
    fn test_reduction_strategy_tags() {
        let fixed: FriReductionStrategy = serde_json::from_str(r#"{"Fixed":[1,2]}"#).unwrap();
        assert_eq!(fixed, FriReductionStrategy::Fixed(vec![1, 2]));
        let constant: FriReductionStrategy =
            serde_json::from_str(r#"{"ConstantArityBits":[4,5]}"#).unwrap();
        assert_eq!(constant, FriReductionStrategy::ConstantArityBits(4, 5));
        let min: FriReductionStrategy = serde_json::from_str(r#"{"MinSize":null}"#).unwrap();
        assert_eq!(min, FriReductionStrategy::MinSize(None));
    }

    #[test]
    fn test_fri_params_transcript_elements() {
        let params = FriParams {
            config: FriConfig {
                rate_bits: 3,
                cap_height: 4,
                proof_of_work_bits: 16,
                reduction_strategy: FriReductionStrategy::ConstantArityBits(4, 5),
                num_query_rounds: 28,
            },
            hiding: false,
            degree_bits: 12,
            reduction_arity_bits: vec![4, 4],
        };
        assert_eq!(
            params.transcript_elements(),
            vec![3, 4, 16, 1, 4, 5, 28, 0, 12, 4, 4]
        );

        let fixed = FriReductionStrategy::Fixed(vec![2, 3]);
        assert_eq!(fixed.transcript_elements(), vec![0, 2, 3]);
        let min = FriReductionStrategy::MinSize(None);
        assert_eq!(min.transcript_elements(), vec![2, 0]);
    }
}
