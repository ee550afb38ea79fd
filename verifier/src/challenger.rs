use crate::structs::{CommonCircuitData, FriParams};
use crate::vars::{
    FriChallengesVar, FriProofVar, MerkleCapVar, OpeningSetVar, ProofChallengesVar,
    ProofWithPublicInputsVar, VerifierCS,
};
use plonky2::hash::poseidon::{SPONGE_RATE, SPONGE_WIDTH};
use plover_algebra::{
    goldilocks::{Field, GoldilocksField},
    prelude::*,
};
use plover_plonk::constraint_system::{
    poseidon_goldilocks::HASH_OUT_LEN, ExtVar, GoldilocksVar, HashOutVar, NativeHashVar, TurboCS,
};

/// The duplex Poseidon transcript of plonky2 replayed in-circuit. Every
/// observed element is reduced before it enters the sponge, so challenges
/// are canonical.
#[derive(Clone, Debug)]
pub struct CircuitChallenger {
    sponge_state: [GoldilocksVar; SPONGE_WIDTH],
    input_buffer: Vec<GoldilocksVar>,
    output_buffer: Vec<GoldilocksVar>,
}

impl CircuitChallenger {
    /// Start from the all-zero state.
    pub fn new<F: Scalar>(cs: &TurboCS<F>) -> Self {
        Self {
            sponge_state: [GoldilocksVar::zero(cs); SPONGE_WIDTH],
            input_buffer: Vec::with_capacity(SPONGE_RATE),
            output_buffer: Vec::with_capacity(SPONGE_RATE),
        }
    }

    /// Observe one element.
    pub fn observe_element<F: Scalar>(&mut self, cs: &mut TurboCS<F>, element: &GoldilocksVar) {
        self.output_buffer.clear();
        self.input_buffer.push(*element);
        if self.input_buffer.len() == SPONGE_RATE {
            self.duplexing(cs);
        }
    }

    /// Observe a sequence of elements.
    pub fn observe_elements<F: Scalar>(&mut self, cs: &mut TurboCS<F>, elements: &[GoldilocksVar]) {
        for element in elements {
            self.observe_element(cs, element);
        }
    }

    /// Observe an extension element as its two limbs.
    pub fn observe_extension_element<F: Scalar>(&mut self, cs: &mut TurboCS<F>, element: &ExtVar) {
        self.observe_elements(cs, &element.0);
    }

    /// Observe a sequence of extension elements.
    pub fn observe_extension_elements<F: Scalar>(&mut self, cs: &mut TurboCS<F>, elements: &[ExtVar]) {
        for element in elements {
            self.observe_extension_element(cs, element);
        }
    }

    /// Observe a Goldilocks digest.
    pub fn observe_hash<F: Scalar>(&mut self, cs: &mut TurboCS<F>, hash: &HashOutVar) {
        self.observe_elements(cs, &hash.0);
    }

    /// Observe a native digest through its 56-bit limbs.
    pub fn observe_native_hash(&mut self, cs: &mut VerifierCS, hash: &NativeHashVar) {
        let limbs = cs.poseidon_bn254_to_vec(hash);
        self.observe_elements(cs, &limbs);
    }

    /// Observe every entry of a cap.
    pub fn observe_cap(&mut self, cs: &mut VerifierCS, cap: &MerkleCapVar) {
        for hash in cap.0.iter() {
            self.observe_native_hash(cs, hash);
        }
    }

    /// Observe the FRI parameters of the circuit as constants.
    pub fn observe_fri_params<F: Scalar>(&mut self, cs: &mut TurboCS<F>, params: &FriParams) {
        for x in params.transcript_elements() {
            let element = GoldilocksVar::alloc_constant(cs, GoldilocksField::from_canonical_u64(x));
            self.observe_element(cs, &element);
        }
    }

    /// Observe the openings at `ζ`, then those at `g·ζ`.
    pub fn observe_openings<F: Scalar>(&mut self, cs: &mut TurboCS<F>, openings: &OpeningSetVar) {
        self.observe_extension_elements(cs, &openings.zeta_batch());
        self.observe_extension_elements(cs, &openings.zeta_next_batch());
    }

    /// Squeeze one canonical challenge.
    pub fn get_challenge<F: Scalar>(&mut self, cs: &mut TurboCS<F>) -> GoldilocksVar {
        if !self.input_buffer.is_empty() || self.output_buffer.is_empty() {
            self.duplexing(cs);
        }
        match self.output_buffer.pop() {
            Some(challenge) => challenge,
            None => unreachable!("duplexing refills the output buffer"),
        }
    }

    /// Squeeze `n` challenges.
    pub fn get_n_challenges<F: Scalar>(&mut self, cs: &mut TurboCS<F>, n: usize) -> Vec<GoldilocksVar> {
        (0..n).map(|_| self.get_challenge(cs)).collect()
    }

    /// Squeeze a Goldilocks digest.
    pub fn get_hash<F: Scalar>(&mut self, cs: &mut TurboCS<F>) -> HashOutVar {
        HashOutVar(core::array::from_fn::<_, HASH_OUT_LEN, _>(|_| {
            self.get_challenge(cs)
        }))
    }

    /// Squeeze an extension challenge.
    pub fn get_extension_challenge<F: Scalar>(&mut self, cs: &mut TurboCS<F>) -> ExtVar {
        let a = self.get_challenge(cs);
        let b = self.get_challenge(cs);
        ExtVar([a, b])
    }

    fn duplexing<F: Scalar>(&mut self, cs: &mut TurboCS<F>) {
        assert!(self.input_buffer.len() <= SPONGE_RATE);
        for (i, input) in self.input_buffer.drain(..).enumerate() {
            self.sponge_state[i] = input.reduce(cs);
        }
        self.sponge_state = cs.poseidon_goldilocks_permute(&self.sponge_state);
        self.output_buffer.clear();
        self.output_buffer
            .extend_from_slice(&self.sponge_state[..SPONGE_RATE]);
    }

    /// Derive the FRI challenges: `α`, one `β` per commit-phase cap, the
    /// proof-of-work response and the query indices.
    pub fn get_fri_challenges(
        &mut self,
        cs: &mut VerifierCS,
        proof: &FriProofVar,
        num_query_rounds: usize,
    ) -> FriChallengesVar {
        let fri_alpha = self.get_extension_challenge(cs);
        let fri_betas = proof
            .commit_phase_merkle_caps
            .iter()
            .map(|cap| {
                self.observe_cap(cs, cap);
                self.get_extension_challenge(cs)
            })
            .collect();
        self.observe_extension_elements(cs, &proof.final_poly.0);
        self.observe_element(cs, &proof.pow_witness);
        let fri_pow_response = self.get_challenge(cs);
        let fri_query_indices = self.get_n_challenges(cs, num_query_rounds);
        FriChallengesVar {
            fri_alpha,
            fri_betas,
            fri_pow_response,
            fri_query_indices,
        }
    }
}

/// Replay the transcript of a proof and derive all its challenges.
pub fn get_challenges(
    cs: &mut VerifierCS,
    proof: &ProofWithPublicInputsVar,
    public_inputs_hash: &HashOutVar,
    circuit_digest: &NativeHashVar,
    common: &CommonCircuitData,
) -> ProofChallengesVar {
    let num_challenges = common.num_challenges();
    let proof = &proof.proof;
    let mut challenger = CircuitChallenger::new(cs);

    challenger.observe_fri_params(cs, &common.fri_params);
    challenger.observe_native_hash(cs, circuit_digest);
    challenger.observe_hash(cs, public_inputs_hash);
    challenger.observe_cap(cs, &proof.wires_cap);
    let plonk_betas = challenger.get_n_challenges(cs, num_challenges);
    let plonk_gammas = challenger.get_n_challenges(cs, num_challenges);

    challenger.observe_cap(cs, &proof.plonk_zs_partial_products_cap);
    let plonk_alphas = challenger.get_n_challenges(cs, num_challenges);

    challenger.observe_cap(cs, &proof.quotient_polys_cap);
    let plonk_zeta = challenger.get_extension_challenge(cs);

    challenger.observe_openings(cs, &proof.openings);
    let fri_challenges = challenger.get_fri_challenges(
        cs,
        &proof.opening_proof,
        common.fri_params.config.num_query_rounds,
    );

    ProofChallengesVar {
        plonk_betas,
        plonk_gammas,
        plonk_alphas,
        plonk_zeta,
        fri_challenges,
    }
}

#[cfg(test)]
mod test {
    use super::CircuitChallenger;
    use crate::structs::{FriConfig, FriParams, FriReductionStrategy};
    use crate::vars::VerifierCS;
    use plonky2::fri::reduction_strategies::FriReductionStrategy as NativeReductionStrategy;
    use plonky2::fri::{FriConfig as NativeFriConfig, FriParams as NativeFriParams};
    use plonky2::hash::poseidon::PoseidonHash;
    use plonky2::iop::challenger::Challenger as NativeChallenger;
    use plover_algebra::{
        goldilocks::{Field, GoldilocksField},
        prelude::*,
    };
    use plover_crypto::{challenger::Challenger, poseidon_bn254::PoseidonBN254};
    use plover_plonk::constraint_system::{ExtVar, GoldilocksVar};

    fn random_elements<R: RngCore>(rng: &mut R, n: usize) -> Vec<GoldilocksField> {
        (0..n)
            .map(|_| GoldilocksField::from_canonical_u64(rng.next_u64() >> 1))
            .collect()
    }

    #[test]
    fn test_challenger_matches_native() {
        let mut rng = test_rng();
        let mut cs = VerifierCS::new();
        let mut native = Challenger::new();
        let mut circuit = CircuitChallenger::new(&cs);

        let digest = PoseidonBN254::hash_no_pad(&random_elements(&mut rng, 7));
        native.observe_native_hash(&digest);
        let digest_var = cs.new_native_hash_variable(digest);
        circuit.observe_native_hash(&mut cs, &digest_var);

        let mut expected = vec![];
        let mut challenges = vec![];
        for n in [3, 8, 13] {
            let elements = random_elements(&mut rng, n);
            native.observe_elements(&elements);
            let vars = elements
                .iter()
                .map(|e| GoldilocksVar::alloc_witness(&mut cs, *e))
                .collect::<Vec<_>>();
            circuit.observe_elements(&mut cs, &vars);

            expected.extend(native.get_n_challenges(n % 5 + 1));
            challenges.extend(circuit.get_n_challenges(&mut cs, n % 5 + 1));
            let ext = native.get_extension_challenge();
            let ext_var: ExtVar = circuit.get_extension_challenge(&mut cs);
            assert_eq!(ext_var.value(&cs), ext);
        }
        for (c, e) in challenges.iter().zip(expected.iter()) {
            assert_eq!(c.value(&cs), *e);
        }
        // the squeezed values are canonical
        assert!(challenges.iter().all(|c| c.bits == 64));

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }

    #[test]
    fn test_observation_split() {
        let mut rng = test_rng();
        let elements = random_elements(&mut rng, 11);
        let mut cs = VerifierCS::new();
        let vars = elements
            .iter()
            .map(|e| GoldilocksVar::alloc_witness(&mut cs, *e))
            .collect::<Vec<_>>();

        let mut whole = CircuitChallenger::new(&cs);
        whole.observe_elements(&mut cs, &vars);
        let a = whole.get_challenge(&mut cs);

        let mut split = CircuitChallenger::new(&cs);
        split.observe_elements(&mut cs, &vars[..4]);
        split.observe_elements(&mut cs, &vars[4..]);
        let b = split.get_challenge(&mut cs);
        assert_eq!(a.value(&cs), b.value(&cs));
        assert_ne!(a.value(&cs), GoldilocksField::ZERO);
    }

    #[test]
    fn test_fri_params_observation_matches_plonky2() {
        let cases = [
            (FriReductionStrategy::ConstantArityBits(4, 5), vec![4, 4, 4]),
            (FriReductionStrategy::Fixed(vec![2, 3]), vec![2, 3]),
            (FriReductionStrategy::MinSize(Some(3)), vec![3, 1]),
        ];
        for (strategy, reduction_arity_bits) in cases {
            let native_strategy = match &strategy {
                FriReductionStrategy::Fixed(bits) => NativeReductionStrategy::Fixed(bits.clone()),
                FriReductionStrategy::ConstantArityBits(a, b) => {
                    NativeReductionStrategy::ConstantArityBits(*a, *b)
                }
                FriReductionStrategy::MinSize(m) => NativeReductionStrategy::MinSize(*m),
            };
            let params = FriParams {
                config: FriConfig {
                    rate_bits: 3,
                    cap_height: 4,
                    proof_of_work_bits: 16,
                    reduction_strategy: strategy,
                    num_query_rounds: 28,
                },
                hiding: false,
                degree_bits: 14,
                reduction_arity_bits: reduction_arity_bits.clone(),
            };
            let native_params = NativeFriParams {
                config: NativeFriConfig {
                    rate_bits: 3,
                    cap_height: 4,
                    proof_of_work_bits: 16,
                    reduction_strategy: native_strategy,
                    num_query_rounds: 28,
                },
                hiding: false,
                degree_bits: 14,
                reduction_arity_bits,
            };

            let mut native = NativeChallenger::<GoldilocksField, PoseidonHash>::new();
            native_params.observe(&mut native);
            let expected = native.get_n_challenges(3);

            let mut cs = VerifierCS::new();
            let mut circuit = CircuitChallenger::new(&cs);
            circuit.observe_fri_params(&mut cs, &params);
            let challenges = circuit.get_n_challenges(&mut cs, 3);
            for (c, e) in challenges.iter().zip(expected.iter()) {
                assert_eq!(c.value(&cs), *e);
            }

            let witness = cs.get_and_clear_witness();
            assert!(cs.verify_witness(&witness, &[]).is_ok());
        }
    }
}
