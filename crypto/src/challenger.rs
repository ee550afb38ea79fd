use crate::merkle_tree::MerkleCap;
use crate::poseidon_bn254::{NativeHash, PoseidonBN254};
use plonky2::hash::poseidon::{Poseidon, SPONGE_RATE, SPONGE_WIDTH};
use plover_algebra::{
    goldilocks::{Field, GoldilocksExt, GoldilocksField, QuadraticExtension},
    prelude::*,
};

/// The number of Goldilocks elements in a Goldilocks Poseidon digest.
pub const GOLDILOCKS_HASH_LEN: usize = 4;

/// A Goldilocks Poseidon digest.
pub type GoldilocksHash = [GoldilocksField; GOLDILOCKS_HASH_LEN];

/// Hash with the width-12 Goldilocks Poseidon without padding: each chunk of
/// `SPONGE_RATE` inputs overwrites the front of the state before a
/// permutation.
pub fn hash_no_pad(inputs: &[GoldilocksField]) -> GoldilocksHash {
    let mut state = [GoldilocksField::ZERO; SPONGE_WIDTH];
    for chunk in inputs.chunks(SPONGE_RATE) {
        state[..chunk.len()].copy_from_slice(chunk);
        state = GoldilocksField::poseidon(state);
    }
    let mut out = [GoldilocksField::ZERO; GOLDILOCKS_HASH_LEN];
    out.copy_from_slice(&state[..GOLDILOCKS_HASH_LEN]);
    out
}

/// A duplex sponge transcript over the Goldilocks Poseidon, observing native
/// digests through their 56-bit limb split.
#[derive(Clone, Debug)]
pub struct Challenger {
    sponge_state: [GoldilocksField; SPONGE_WIDTH],
    input_buffer: Vec<GoldilocksField>,
    output_buffer: Vec<GoldilocksField>,
}

impl Default for Challenger {
    fn default() -> Self {
        Self::new()
    }
}

impl Challenger {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self {
            sponge_state: [GoldilocksField::ZERO; SPONGE_WIDTH],
            input_buffer: Vec::with_capacity(SPONGE_RATE),
            output_buffer: Vec::with_capacity(SPONGE_RATE),
        }
    }

    /// Observe one element.
    pub fn observe_element(&mut self, element: GoldilocksField) {
        self.output_buffer.clear();
        self.input_buffer.push(element);
        if self.input_buffer.len() == SPONGE_RATE {
            self.duplexing();
        }
    }

    /// Observe a sequence of elements.
    pub fn observe_elements(&mut self, elements: &[GoldilocksField]) {
        for element in elements {
            self.observe_element(*element);
        }
    }

    /// Observe an extension element as its two limbs.
    pub fn observe_extension_element(&mut self, element: &GoldilocksExt) {
        self.observe_elements(&element.0);
    }

    /// Observe a sequence of extension elements.
    pub fn observe_extension_elements(&mut self, elements: &[GoldilocksExt]) {
        for element in elements {
            self.observe_extension_element(element);
        }
    }

    /// Observe a Goldilocks digest.
    pub fn observe_hash(&mut self, hash: &GoldilocksHash) {
        self.observe_elements(hash);
    }

    /// Observe a native digest.
    pub fn observe_native_hash(&mut self, hash: &NativeHash) {
        self.observe_elements(&PoseidonBN254::to_vec(hash));
    }

    /// Observe every entry of a cap.
    pub fn observe_cap(&mut self, cap: &MerkleCap) {
        for hash in cap.0.iter() {
            self.observe_native_hash(hash);
        }
    }

    /// Squeeze one challenge.
    pub fn get_challenge(&mut self) -> GoldilocksField {
        if !self.input_buffer.is_empty() || self.output_buffer.is_empty() {
            self.duplexing();
        }
        self.output_buffer
            .pop()
            .unwrap_or(GoldilocksField::ZERO)
    }

    /// Squeeze `n` challenges.
    pub fn get_n_challenges(&mut self, n: usize) -> Vec<GoldilocksField> {
        (0..n).map(|_| self.get_challenge()).collect()
    }

    /// Squeeze a Goldilocks digest.
    pub fn get_hash(&mut self) -> GoldilocksHash {
        let mut out = [GoldilocksField::ZERO; GOLDILOCKS_HASH_LEN];
        for o in out.iter_mut() {
            *o = self.get_challenge();
        }
        out
    }

    /// Squeeze an extension challenge.
    pub fn get_extension_challenge(&mut self) -> GoldilocksExt {
        let a = self.get_challenge();
        let b = self.get_challenge();
        QuadraticExtension([a, b])
    }

    /// Squeeze `n` extension challenges.
    pub fn get_n_extension_challenges(&mut self, n: usize) -> Vec<GoldilocksExt> {
        (0..n).map(|_| self.get_extension_challenge()).collect()
    }

    fn duplexing(&mut self) {
        assert!(self.input_buffer.len() <= SPONGE_RATE);
        for (i, input) in self.input_buffer.drain(..).enumerate() {
            self.sponge_state[i] = input;
        }
        self.sponge_state = GoldilocksField::poseidon(self.sponge_state);

        self.output_buffer.clear();
        self.output_buffer
            .extend_from_slice(&self.sponge_state[0..SPONGE_RATE]);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use plonky2::hash::poseidon::PoseidonHash;
    use plonky2::plonk::config::Hasher;
    use plover_algebra::goldilocks::PrimeField64;

    fn gl(v: u64) -> GoldilocksField {
        GoldilocksField::from_canonical_u64(v)
    }

    #[test]
    fn test_hash_no_pad() {
        for n in [0usize, 3, 8, 9, 20] {
            let inputs = (0..n as u64).map(|i| gl(i * 7 + 1)).collect_vec();
            let expected = PoseidonHash::hash_no_pad(&inputs).elements;
            assert_eq!(hash_no_pad(&inputs), expected);
        }

        let pis = [gl(0), gl(1), gl(3736710860384812976)];
        let hash = hash_no_pad(&pis);
        assert_eq!(
            hash.iter().map(|x| x.to_canonical_u64()).collect_vec(),
            vec![
                8416658900775745054,
                12574228347150446423,
                9629056739760131473,
                3119289788404190010
            ]
        );
    }

    #[test]
    fn test_challenger_order() {
        let elements = (0..13).map(|i| gl(i * 3 + 5)).collect_vec();

        let mut c1 = Challenger::new();
        c1.observe_elements(&elements);
        let mut c2 = Challenger::new();
        c2.observe_elements(&elements[..6]);
        c2.observe_elements(&elements[6..]);
        assert_eq!(c1.get_n_challenges(10), c2.get_n_challenges(10));

        let mut c3 = Challenger::new();
        c3.observe_elements(&elements[1..]);
        c3.observe_element(elements[0]);
        let mut c4 = Challenger::new();
        c4.observe_elements(&elements);
        assert_ne!(c3.get_challenge(), c4.get_challenge());
    }

    #[test]
    fn test_challenger_duplexing() {
        let mut challenger = Challenger::new();
        challenger.observe_elements(&[gl(1), gl(2)]);
        let challenges = challenger.get_n_challenges(9);

        let mut state = [GoldilocksField::ZERO; SPONGE_WIDTH];
        state[0] = gl(1);
        state[1] = gl(2);
        let state = GoldilocksField::poseidon(state);
        for i in 0..SPONGE_RATE {
            assert_eq!(challenges[i], state[SPONGE_RATE - 1 - i]);
        }
        let state = GoldilocksField::poseidon(state);
        assert_eq!(challenges[8], state[SPONGE_RATE - 1]);
    }

    #[test]
    fn test_observe_native_hash() {
        let h = plover_algebra::bn254::BN254Scalar::from(123456789u64);
        let mut c1 = Challenger::new();
        c1.observe_native_hash(&h);
        let mut c2 = Challenger::new();
        c2.observe_elements(&[gl(123456789), gl(0), gl(0), gl(0), gl(0)]);
        assert_eq!(c1.get_extension_challenge(), c2.get_extension_challenge());
    }
}
