use num_bigint::BigUint;
use std::collections::VecDeque;
use plover_algebra::prelude::*;

/// The round constants and MDS matrix of a Poseidon instance.
#[derive(Clone, Debug)]
pub struct PoseidonParameters<F: Scalar> {
    /// The state width.
    pub width: usize,
    /// The number of full rounds, split evenly around the partial rounds.
    pub full_rounds: usize,
    /// The number of partial rounds.
    pub partial_rounds: usize,
    /// One row of `width` constants per round.
    pub round_constants: Vec<Vec<F>>,
    /// The Cauchy MDS matrix, row-major.
    pub mds: Vec<Vec<F>>,
}

/// The Grain LFSR of the Poseidon parameter generator, with its output
/// already passed through the self-shrinking step.
struct GrainLfsr {
    state: VecDeque<bool>,
}

impl GrainLfsr {
    fn new(field_bits: usize, width: usize, full_rounds: usize, partial_rounds: usize) -> Self {
        let mut state = VecDeque::with_capacity(80);
        // field = GF(p)
        Self::append_bits(&mut state, 1, 2);
        // S-box = x^alpha
        Self::append_bits(&mut state, 0, 4);
        Self::append_bits(&mut state, field_bits as u64, 12);
        Self::append_bits(&mut state, width as u64, 12);
        Self::append_bits(&mut state, full_rounds as u64, 10);
        Self::append_bits(&mut state, partial_rounds as u64, 10);
        state.extend([true; 30]);
        assert_eq!(state.len(), 80);

        let mut lfsr = Self { state };
        for _ in 0..160 {
            lfsr.clock();
        }
        lfsr
    }

    fn append_bits(state: &mut VecDeque<bool>, value: u64, n_bits: usize) {
        for i in (0..n_bits).rev() {
            state.push_back((value >> i) & 1 == 1);
        }
    }

    fn clock(&mut self) -> bool {
        let s = &self.state;
        let new_bit = s[62] ^ s[51] ^ s[38] ^ s[23] ^ s[13] ^ s[0];
        self.state.pop_front();
        self.state.push_back(new_bit);
        new_bit
    }

    fn next_bit(&mut self) -> bool {
        loop {
            let selector = self.clock();
            let bit = self.clock();
            if selector {
                return bit;
            }
        }
    }

    /// Read `n_bits` bits as an integer, most significant bit first.
    fn next_biguint(&mut self, n_bits: usize) -> BigUint {
        let mut acc = BigUint::zero();
        for _ in 0..n_bits {
            acc <<= 1;
            if self.next_bit() {
                acc += 1u32;
            }
        }
        acc
    }

    /// Rejection-sample a field element.
    fn next_field_element<F: Scalar>(&mut self, n_bits: usize, modulus: &BigUint) -> F {
        loop {
            let candidate = self.next_biguint(n_bits);
            if &candidate < modulus {
                return F::from(&candidate);
            }
        }
    }
}

/// Generate the round constants and the Cauchy MDS matrix of a Poseidon
/// instance over `F` with the `x^alpha` S-box.
pub fn generate_parameters<F: Scalar>(
    width: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> PoseidonParameters<F> {
    let modulus = F::get_field_size_biguint();
    let n_bits = F::field_size_bits();
    let mut grain = GrainLfsr::new(n_bits, width, full_rounds, partial_rounds);

    let round_constants = (0..full_rounds + partial_rounds)
        .map(|_| {
            (0..width)
                .map(|_| grain.next_field_element::<F>(n_bits, &modulus))
                .collect_vec()
        })
        .collect_vec();

    let mds = loop {
        let mut values = (0..2 * width)
            .map(|_| F::from(&grain.next_biguint(n_bits)))
            .collect_vec();
        while !values.iter().map(|v| v.to_bytes()).all_unique() {
            values = (0..2 * width)
                .map(|_| F::from(&grain.next_biguint(n_bits)))
                .collect_vec();
        }
        let (xs, ys) = values.split_at(width);

        let mut mds = Vec::with_capacity(width);
        let mut invertible = true;
        for x in xs {
            let mut row = Vec::with_capacity(width);
            for y in ys {
                match x.add(y).inv() {
                    Ok(v) => row.push(v),
                    Err(_) => invertible = false,
                }
            }
            mds.push(row);
        }
        if invertible {
            break mds;
        }
    };

    PoseidonParameters {
        width,
        full_rounds,
        partial_rounds,
        round_constants,
        mds,
    }
}
