use crate::constraint_system::{TurboCS, VarIndex};
use num_bigint::BigUint;
use num_integer::Integer;
use plover_algebra::{
    goldilocks::{
        goldilocks_modulus_biguint, goldilocks_to_scalar, scalar_to_goldilocks, Field,
        GoldilocksField, PrimeField64, GOLDILOCKS_MODULUS,
    },
    prelude::*,
};
use std::cmp::max;

/// The bit length of a canonical Goldilocks element.
pub const GOLDILOCKS_BITS: usize = 64;

/// The largest bit length an unreduced value may reach.
pub const MAX_UNREDUCED_BITS: usize = 250;

const HALF_BITS: usize = 32;

/// `GoldilocksVar` is a Goldilocks element held in a single native variable,
/// together with an upper bound on the bit length of its native value. The
/// native value is congruent to the element modulo `p` but may exceed `p`
/// until it is reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoldilocksVar {
    /// the native variable.
    pub var: VarIndex,
    /// the value is smaller than `2^bits`.
    pub bits: usize,
}

fn checked_bits(bits: usize) -> usize {
    assert!(
        bits <= MAX_UNREDUCED_BITS,
        "unreduced Goldilocks value may reach {} bits",
        bits
    );
    bits
}

fn biguint_to_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

/// `(q, lo, hi)` with `value = q·p + lo + 2^32·hi`.
fn split_quotient<F: Scalar>(value: &F) -> Vec<F> {
    let x: BigUint = (*value).into();
    let (q, r) = x.div_rem(&goldilocks_modulus_biguint());
    let r = biguint_to_u64(&r);
    vec![
        F::from(&q),
        F::from(r & 0xFFFF_FFFF),
        F::from(r >> HALF_BITS),
    ]
}

fn bits_of_constant(c: u64) -> usize {
    (64 - c.leading_zeros()) as usize
}

impl GoldilocksVar {
    /// The zero element.
    pub fn zero<F: Scalar>(cs: &TurboCS<F>) -> Self {
        Self {
            var: cs.zero_var(),
            bits: 0,
        }
    }

    /// The one element.
    pub fn one<F: Scalar>(cs: &TurboCS<F>) -> Self {
        Self {
            var: cs.one_var(),
            bits: 1,
        }
    }

    /// Alloc a constant gate.
    pub fn alloc_constant<F: Scalar>(cs: &mut TurboCS<F>, value: GoldilocksField) -> Self {
        let v = value.to_canonical_u64();
        match v {
            0 => Self::zero(cs),
            1 => Self::one(cs),
            _ => Self {
                var: cs.new_constant_variable(F::from(v)),
                bits: bits_of_constant(v),
            },
        }
    }

    /// Alloc a witness variable, checked to be canonical.
    pub fn alloc_witness<F: Scalar>(cs: &mut TurboCS<F>, value: GoldilocksField) -> Self {
        let var = cs.new_variable(goldilocks_to_scalar(value));
        Self {
            var,
            bits: GOLDILOCKS_BITS,
        }
        .range_check(cs)
    }

    /// Return the element this variable currently holds.
    pub fn value<F: Scalar>(&self, cs: &TurboCS<F>) -> GoldilocksField {
        scalar_to_goldilocks(&cs.witness[self.var])
    }

    /// the Add operation without reduction.
    pub fn add_no_reduce<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self {
            var: cs.add(self.var, other.var),
            bits: checked_bits(max(self.bits, other.bits) + 1),
        }
    }

    /// Add a constant without reduction.
    pub fn add_const_no_reduce<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        constant: GoldilocksField,
    ) -> Self {
        let c = constant.to_canonical_u64();
        if c == 0 {
            return *self;
        }
        Self {
            var: cs.add_constant(self.var, &F::from(c)),
            bits: checked_bits(max(self.bits, bits_of_constant(c)) + 1),
        }
    }

    /// the Sub operation without reduction. A multiple of `p` larger than any
    /// value `other` can hold is added so that the native value stays
    /// non-negative.
    pub fn sub_no_reduce<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        let pad = goldilocks_modulus_biguint() << other.bits.saturating_sub(GOLDILOCKS_BITS - 1);
        let pad_bits = pad.bits() as usize;
        let zero = F::zero();
        let one = F::one();
        let var = cs.linear_combine_with_constant(
            &[self.var, other.var, 0, 0],
            [one, one.neg(), zero, zero],
            F::from(&pad),
        );
        Self {
            var,
            bits: checked_bits(max(self.bits, pad_bits) + 1),
        }
    }

    /// the Mul operation without reduction.
    pub fn mul_no_reduce<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self {
            var: cs.mul(self.var, other.var),
            bits: checked_bits(self.bits + other.bits),
        }
    }

    /// Multiply by a constant without reduction.
    pub fn mul_const_no_reduce<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        constant: GoldilocksField,
    ) -> Self {
        let c = constant.to_canonical_u64();
        match c {
            0 => Self::zero(cs),
            1 => *self,
            _ => Self {
                var: cs.mul_constant(self.var, &F::from(c)),
                bits: checked_bits(self.bits + bits_of_constant(c)),
            },
        }
    }

    /// Return `Σ c_i·x_i` without reduction, three terms per gate.
    pub fn weighted_sum_no_reduce<F: Scalar>(
        cs: &mut TurboCS<F>,
        terms: &[(Self, GoldilocksField)],
    ) -> Self {
        let terms = terms
            .iter()
            .map(|(x, c)| (*x, c.to_canonical_u64()))
            .filter(|(_, c)| *c != 0)
            .collect_vec();
        if terms.is_empty() {
            return Self::zero(cs);
        }
        let bits = terms
            .iter()
            .map(|(x, c)| x.bits + bits_of_constant(*c))
            .max()
            .unwrap_or(0)
            + log2_ceil(terms.len());

        let zero_var = cs.zero_var();
        let zero = F::zero();
        let mut acc = zero_var;
        for chunk in terms.chunks(3) {
            let mut wires = [acc, zero_var, zero_var, zero_var];
            let mut coefs = [F::one(), zero, zero, zero];
            for (i, (x, c)) in chunk.iter().enumerate() {
                wires[i + 1] = x.var;
                coefs[i + 1] = F::from(*c);
            }
            acc = cs.linear_combine(&wires, coefs[0], coefs[1], coefs[2], coefs[3]);
        }
        Self {
            var: acc,
            bits: checked_bits(bits),
        }
    }

    /// `self * other + addend` without reduction.
    pub fn mul_add_no_reduce<F: Scalar>(
        &self,
        cs: &mut TurboCS<F>,
        other: &Self,
        addend: &Self,
    ) -> Self {
        Self {
            var: cs.mul_add(self.var, other.var, addend.var),
            bits: checked_bits(max(self.bits + other.bits, addend.bits) + 1),
        }
    }

    /// Constrain `lo` and `hi` to 32 bits each, excluding `hi = 2^32 - 1`
    /// unless `lo = 0`, and return `lo + 2^32·hi`.
    fn canonical_from_halves<F: Scalar>(cs: &mut TurboCS<F>, lo: VarIndex, hi: VarIndex) -> Self {
        cs.range_check(lo, HALF_BITS);
        cs.range_check(hi, HALF_BITS);

        let max_half = F::from(u32::MAX);
        let hi_minus_max = cs.add_constant(hi, &max_half.neg());
        let hi_is_max = cs.is_zero(hi_minus_max);
        let zero_var = cs.zero_var();
        cs.insert_mul_gate(hi_is_max, lo, zero_var);

        let zero = F::zero();
        let var = cs.linear_combine(
            &[lo, hi, 0, 0],
            F::one(),
            F::from(1u64 << HALF_BITS),
            zero,
            zero,
        );
        Self {
            var,
            bits: GOLDILOCKS_BITS,
        }
    }

    /// Reduce to the canonical representative. The quotient is range-checked
    /// to the bits left over by the bound.
    pub fn reduce<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        assert!(F::capacity() >= MAX_UNREDUCED_BITS);
        let parts = cs.new_hint(&[self.var], 3, |v| split_quotient(&v[0]));
        let (q, lo, hi) = (parts[0], parts[1], parts[2]);
        cs.range_check(q, self.bits.saturating_sub(GOLDILOCKS_BITS - 1));
        let zero = F::zero();
        let one = F::one();
        cs.insert_lc_gate(
            &[q, lo, hi, 0],
            self.var,
            F::from(GOLDILOCKS_MODULUS),
            one,
            F::from(1u64 << HALF_BITS),
            zero,
        );
        Self::canonical_from_halves(cs, lo, hi)
    }

    /// Check that the native value is a canonical Goldilocks element.
    pub fn range_check<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        let parts = cs.new_hint(&[self.var], 2, |v| {
            let x: BigUint = v[0].into();
            let x = biguint_to_u64(&x);
            vec![F::from(x & 0xFFFF_FFFF), F::from(x >> HALF_BITS)]
        });
        let res = Self::canonical_from_halves(cs, parts[0], parts[1]);
        cs.equal(res.var, self.var);
        Self {
            var: self.var,
            bits: GOLDILOCKS_BITS,
        }
    }

    /// the Add operation.
    pub fn add<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        self.add_no_reduce(cs, other).reduce(cs)
    }

    /// the Sub operation.
    pub fn sub<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        self.sub_no_reduce(cs, other).reduce(cs)
    }

    /// the Mul operation.
    pub fn mul<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        self.mul_no_reduce(cs, other).reduce(cs)
    }

    /// the Square operation.
    pub fn square<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        self.mul(cs, self)
    }

    /// Return `self * other + addend` reduced; the quotient, the remainder and
    /// the product share a single gate.
    pub fn mul_add<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self, addend: &Self) -> Self {
        let bits = checked_bits(max(self.bits + other.bits, addend.bits) + 1);
        let parts = cs.new_hint(&[self.var, other.var, addend.var], 3, |v| {
            split_quotient(&v[0].mul(&v[1]).add(&v[2]))
        });
        let (q, lo, hi) = (parts[0], parts[1], parts[2]);
        cs.range_check(q, bits.saturating_sub(GOLDILOCKS_BITS - 1));
        let res = Self::canonical_from_halves(cs, lo, hi);

        // self * other + addend - p * q = res
        let zero = F::zero();
        let one = F::one();
        cs.push_add_selectors(zero, zero, one, F::from(GOLDILOCKS_MODULUS).neg());
        cs.push_mul_selectors(one, zero);
        cs.push_constant_selector(zero);
        cs.push_power_five_selectors(zero, zero, zero, zero);
        cs.push_out_selector(one);
        cs.wiring[0].push(self.var);
        cs.wiring[1].push(other.var);
        cs.wiring[2].push(addend.var);
        cs.wiring[3].push(q);
        cs.wiring[4].push(res.var);
        cs.finish_new_gate();
        res
    }

    /// Multiply by a constant and reduce.
    pub fn mul_const<F: Scalar>(&self, cs: &mut TurboCS<F>, constant: GoldilocksField) -> Self {
        self.mul_const_no_reduce(cs, constant).reduce(cs)
    }

    /// Return the inverse, constrained by `self * inv ≡ 1`.
    pub fn inverse<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        let a = self.reduce(cs);
        let inv = cs.new_hint(&[a.var], 1, |v| {
            let x: BigUint = v[0].into();
            assert!(
                x < goldilocks_modulus_biguint(),
                "hint input out of Goldilocks range"
            );
            let x = GoldilocksField::from_canonical_u64(biguint_to_u64(&x));
            vec![goldilocks_to_scalar(x.try_inverse().unwrap_or(GoldilocksField::ZERO))]
        })[0];
        let inv = Self {
            var: inv,
            bits: GOLDILOCKS_BITS,
        }
        .range_check(cs);
        let prod = a.mul(cs, &inv);
        cs.insert_constant_gate(prod.var, F::one());
        inv
    }

    /// Return `self / other`.
    pub fn div<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        let inv = other.inverse(cs);
        self.mul(cs, &inv)
    }

    /// Raise to a constant power by square-and-multiply.
    pub fn exp<F: Scalar>(&self, cs: &mut TurboCS<F>, power: u64) -> Self {
        let mut res = Self::one(cs);
        for i in (0..bits_of_constant(power)).rev() {
            res = res.square(cs);
            if (power >> i) & 1 == 1 {
                res = res.mul(cs, self);
            }
        }
        res
    }

    /// Raise to the power `2^power_log` by repeated squaring.
    pub fn exp_power_of_2<F: Scalar>(&self, cs: &mut TurboCS<F>, power_log: usize) -> Self {
        let mut res = *self;
        for _ in 0..power_log {
            res = res.square(cs);
        }
        res
    }

    /// Return a boolean variable that equals 1 iff the element is zero.
    pub fn is_zero<F: Scalar>(&self, cs: &mut TurboCS<F>) -> VarIndex {
        let a = self.reduce(cs);
        cs.is_zero(a.var)
    }

    /// Return `var0` if `bit` is 0 and `var1` otherwise.
    pub fn select<F: Scalar>(cs: &mut TurboCS<F>, var0: &Self, var1: &Self, bit: VarIndex) -> Self {
        Self {
            var: cs.select(var0.var, var1.var, bit),
            bits: max(var0.bits, var1.bits),
        }
    }

    /// Return `values[b0 + 2·b1]`.
    pub fn lookup2<F: Scalar>(
        cs: &mut TurboCS<F>,
        b0: VarIndex,
        b1: VarIndex,
        values: &[Self; 4],
    ) -> Self {
        let vars = [values[0].var, values[1].var, values[2].var, values[3].var];
        Self {
            var: cs.lookup2(b0, b1, &vars),
            bits: values.iter().map(|v| v.bits).max().unwrap_or(0),
        }
    }

    /// Assert that both sides represent the same element.
    pub fn assert_is_equal<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) {
        let diff = self.sub(cs, other);
        cs.insert_constant_gate(diff.var, F::zero());
    }

    /// Assert that the element equals a constant.
    pub fn assert_equal_constant<F: Scalar>(&self, cs: &mut TurboCS<F>, constant: GoldilocksField) {
        let a = self.reduce(cs);
        cs.insert_constant_gate(a.var, goldilocks_to_scalar(constant));
    }

    /// Reduce and decompose into 64 little-endian bits.
    pub fn to_bits<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Vec<VarIndex> {
        let a = self.reduce(cs);
        cs.range_check(a.var, GOLDILOCKS_BITS)
    }
}
