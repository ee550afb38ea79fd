use crate::constraint_system::{GoldilocksVar, TurboCS, VarIndex};
use plover_algebra::{
    goldilocks::{
        Field, GoldilocksExt, GoldilocksField, QuadraticExtension, EXTENSION_DEGREE,
        GOLDILOCKS_EXT_W,
    },
    prelude::*,
};

fn ext_w() -> GoldilocksField {
    GoldilocksField::from_canonical_u64(GOLDILOCKS_EXT_W)
}

/// `ExtVar` is an element `a0 + a1·X` of the quadratic extension
/// `F_p[X] / (X^2 - 7)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtVar(pub [GoldilocksVar; EXTENSION_DEGREE]);

impl ExtVar {
    /// The zero element.
    pub fn zero<F: Scalar>(cs: &TurboCS<F>) -> Self {
        let zero = GoldilocksVar::zero(cs);
        Self([zero, zero])
    }

    /// The one element.
    pub fn one<F: Scalar>(cs: &TurboCS<F>) -> Self {
        Self([GoldilocksVar::one(cs), GoldilocksVar::zero(cs)])
    }

    /// Embed a base field element.
    pub fn from_base<F: Scalar>(cs: &TurboCS<F>, value: GoldilocksVar) -> Self {
        Self([value, GoldilocksVar::zero(cs)])
    }

    /// Alloc a constant.
    pub fn alloc_constant<F: Scalar>(cs: &mut TurboCS<F>, value: GoldilocksExt) -> Self {
        let [a0, a1] = value.0;
        Self([
            GoldilocksVar::alloc_constant(cs, a0),
            GoldilocksVar::alloc_constant(cs, a1),
        ])
    }

    /// Alloc a witness, both limbs checked to be canonical.
    pub fn alloc_witness<F: Scalar>(cs: &mut TurboCS<F>, value: GoldilocksExt) -> Self {
        let [a0, a1] = value.0;
        Self([
            GoldilocksVar::alloc_witness(cs, a0),
            GoldilocksVar::alloc_witness(cs, a1),
        ])
    }

    /// Return the element this variable currently holds.
    pub fn value<F: Scalar>(&self, cs: &TurboCS<F>) -> GoldilocksExt {
        QuadraticExtension([self.0[0].value(cs), self.0[1].value(cs)])
    }

    /// Reduce both limbs.
    pub fn reduce<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        Self([self.0[0].reduce(cs), self.0[1].reduce(cs)])
    }

    /// the Add operation without reduction.
    pub fn add_no_reduce<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self([
            self.0[0].add_no_reduce(cs, &other.0[0]),
            self.0[1].add_no_reduce(cs, &other.0[1]),
        ])
    }

    /// the Sub operation without reduction.
    pub fn sub_no_reduce<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self([
            self.0[0].sub_no_reduce(cs, &other.0[0]),
            self.0[1].sub_no_reduce(cs, &other.0[1]),
        ])
    }

    /// the Add operation.
    pub fn add<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self([
            self.0[0].add(cs, &other.0[0]),
            self.0[1].add(cs, &other.0[1]),
        ])
    }

    /// the Sub operation.
    pub fn sub<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self([
            self.0[0].sub(cs, &other.0[0]),
            self.0[1].sub(cs, &other.0[1]),
        ])
    }

    /// Return `self * other + addend`, with one reduction per limb:
    /// `(a0b0 + 7·a1b1 + c0, a0b1 + a1b0 + c1)`.
    pub fn mul_add<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self, addend: &Self) -> Self {
        let [a0, a1] = self.0;
        let [b0, b1] = other.0;
        let [c0, c1] = addend.0;

        let t0 = a1
            .mul_no_reduce(cs, &b1)
            .mul_const_no_reduce(cs, ext_w())
            .add_no_reduce(cs, &c0);
        let r0 = a0.mul_add(cs, &b0, &t0);

        let t1 = a0.mul_add_no_reduce(cs, &b1, &c1);
        let r1 = a1.mul_add(cs, &b0, &t1);
        Self([r0, r1])
    }

    /// the Mul operation.
    pub fn mul<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        let zero = Self::zero(cs);
        self.mul_add(cs, other, &zero)
    }

    /// the Square operation.
    pub fn square<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        self.mul(cs, self)
    }

    /// Multiply by a base field element.
    pub fn scalar_mul<F: Scalar>(&self, cs: &mut TurboCS<F>, scalar: &GoldilocksVar) -> Self {
        Self([self.0[0].mul(cs, scalar), self.0[1].mul(cs, scalar)])
    }

    /// Multiply by an extension constant.
    pub fn mul_const<F: Scalar>(&self, cs: &mut TurboCS<F>, constant: GoldilocksExt) -> Self {
        let [k0, k1] = constant.0;
        let [a0, a1] = self.0;

        let t = a0.mul_const_no_reduce(cs, k0);
        let u = a1.mul_const_no_reduce(cs, k1 * ext_w());
        let r0 = t.add_no_reduce(cs, &u).reduce(cs);

        let t = a0.mul_const_no_reduce(cs, k1);
        let u = a1.mul_const_no_reduce(cs, k0);
        let r1 = t.add_no_reduce(cs, &u).reduce(cs);
        Self([r0, r1])
    }

    /// Return the inverse. The norm `a0^2 - 7·a1^2` is inverted in the base
    /// field and scales the conjugate `(a0, -a1)`; a zero input makes the
    /// witness unsatisfiable.
    pub fn inverse<F: Scalar>(&self, cs: &mut TurboCS<F>) -> Self {
        let [a0, a1] = self.0;
        let minus_w = -ext_w();
        let t = a1.mul_no_reduce(cs, &a1).mul_const_no_reduce(cs, minus_w);
        let norm = a0.mul_add(cs, &a0, &t);
        let norm_inv = norm.inverse(cs);
        let r0 = a0.mul(cs, &norm_inv);
        let r1 = a1.mul_const_no_reduce(cs, -GoldilocksField::ONE);
        let r1 = r1.mul(cs, &norm_inv);
        Self([r0, r1])
    }

    /// Return `self / other`.
    pub fn div<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        let inv = other.inverse(cs);
        self.mul(cs, &inv)
    }

    /// Return a boolean variable that equals 1 iff both limbs are zero.
    pub fn is_zero<F: Scalar>(&self, cs: &mut TurboCS<F>) -> VarIndex {
        let z0 = self.0[0].is_zero(cs);
        let z1 = self.0[1].is_zero(cs);
        cs.mul(z0, z1)
    }

    /// Return `var0` if `bit` is 0 and `var1` otherwise.
    pub fn select<F: Scalar>(cs: &mut TurboCS<F>, var0: &Self, var1: &Self, bit: VarIndex) -> Self {
        Self([
            GoldilocksVar::select(cs, &var0.0[0], &var1.0[0], bit),
            GoldilocksVar::select(cs, &var0.0[1], &var1.0[1], bit),
        ])
    }

    /// Return `values[b0 + 2·b1]`.
    pub fn lookup2<F: Scalar>(
        cs: &mut TurboCS<F>,
        b0: VarIndex,
        b1: VarIndex,
        values: &[Self; 4],
    ) -> Self {
        let limb = |i: usize| [values[0].0[i], values[1].0[i], values[2].0[i], values[3].0[i]];
        let (l0, l1) = (limb(0), limb(1));
        Self([
            GoldilocksVar::lookup2(cs, b0, b1, &l0),
            GoldilocksVar::lookup2(cs, b0, b1, &l1),
        ])
    }

    /// Raise to a constant power by square-and-multiply.
    pub fn exp_u64<F: Scalar>(&self, cs: &mut TurboCS<F>, power: u64) -> Self {
        let mut res = Self::one(cs);
        let n_bits = 64 - power.leading_zeros() as usize;
        for i in (0..n_bits).rev() {
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

    /// Return `Σ terms[i]·alpha^i`, evaluated Horner-style from the last term.
    pub fn reduce_with_powers<F: Scalar>(cs: &mut TurboCS<F>, terms: &[Self], alpha: &Self) -> Self {
        let mut acc = Self::zero(cs);
        for term in terms.iter().rev() {
            acc = acc.mul_add(cs, alpha, term);
        }
        acc
    }

    /// Return `Σ a_i·b_i`.
    pub fn inner_product<F: Scalar>(cs: &mut TurboCS<F>, pairs: &[(Self, Self)]) -> Self {
        let mut acc = Self::zero(cs);
        for (a, b) in pairs.iter() {
            acc = a.mul_add(cs, b, &acc);
        }
        acc
    }

    /// Assert that both sides represent the same element.
    pub fn assert_is_equal<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) {
        self.0[0].assert_is_equal(cs, &other.0[0]);
        self.0[1].assert_is_equal(cs, &other.0[1]);
    }
}

/// `ExtAlgebraVar` is an element `b0 + b1·Y` of `F_{p^2}[Y] / (Y^2 - 7)`,
/// the algebra extension gates evaluate their constraints in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtAlgebraVar(pub [ExtVar; EXTENSION_DEGREE]);

impl ExtAlgebraVar {
    /// The zero element.
    pub fn zero<F: Scalar>(cs: &TurboCS<F>) -> Self {
        let zero = ExtVar::zero(cs);
        Self([zero, zero])
    }

    /// The one element.
    pub fn one<F: Scalar>(cs: &TurboCS<F>) -> Self {
        Self([ExtVar::one(cs), ExtVar::zero(cs)])
    }

    /// Embed an extension element.
    pub fn from_ext<F: Scalar>(cs: &TurboCS<F>, value: ExtVar) -> Self {
        Self([value, ExtVar::zero(cs)])
    }

    /// Return the coordinates over the extension.
    pub fn to_basefield_array(&self) -> [ExtVar; EXTENSION_DEGREE] {
        self.0
    }

    /// the Add operation.
    pub fn add<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self([self.0[0].add(cs, &other.0[0]), self.0[1].add(cs, &other.0[1])])
    }

    /// the Sub operation.
    pub fn sub<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        Self([self.0[0].sub(cs, &other.0[0]), self.0[1].sub(cs, &other.0[1])])
    }

    /// the Mul operation: `(a0b0 + 7·a1b1) + (a0b1 + a1b0)·Y`.
    pub fn mul<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self) -> Self {
        let [a0, a1] = self.0;
        let [b0, b1] = other.0;
        let w = GoldilocksVar::alloc_constant(cs, ext_w());
        let t = a1.mul(cs, &b1).scalar_mul(cs, &w);
        let r0 = a0.mul_add(cs, &b0, &t);
        let t = a0.mul(cs, &b1);
        let r1 = a1.mul_add(cs, &b0, &t);
        Self([r0, r1])
    }

    /// Return `self * other + addend`.
    pub fn mul_add<F: Scalar>(&self, cs: &mut TurboCS<F>, other: &Self, addend: &Self) -> Self {
        let prod = self.mul(cs, other);
        prod.add(cs, addend)
    }

    /// Multiply by an extension element.
    pub fn scalar_mul<F: Scalar>(&self, cs: &mut TurboCS<F>, scalar: &ExtVar) -> Self {
        Self([self.0[0].mul(cs, scalar), self.0[1].mul(cs, scalar)])
    }
}

#[cfg(test)]
mod test {
    use crate::constraint_system::{ExtAlgebraVar, ExtVar, GoldilocksVar, TurboCS};
    use plover_algebra::{
        bn254::BN254Scalar,
        goldilocks::{Field, FieldExtension, GoldilocksExt, GoldilocksField, QuadraticExtension, GOLDILOCKS_MODULUS},
        prelude::*,
    };

    type F = BN254Scalar;

    fn random_ext<R: RngCore>(rng: &mut R) -> GoldilocksExt {
        QuadraticExtension([
            GoldilocksField::from_canonical_u64(rng.next_u64() % GOLDILOCKS_MODULUS),
            GoldilocksField::from_canonical_u64(rng.next_u64() % GOLDILOCKS_MODULUS),
        ])
    }

    #[test]
    fn test_ext_arithmetic() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let a = random_ext(&mut rng);
        let b = random_ext(&mut rng);
        let c = random_ext(&mut rng);
        let a_var = ExtVar::alloc_witness(&mut cs, a);
        let b_var = ExtVar::alloc_witness(&mut cs, b);
        let c_var = ExtVar::alloc_witness(&mut cs, c);

        assert_eq!(a_var.add(&mut cs, &b_var).value(&cs), a + b);
        assert_eq!(a_var.sub(&mut cs, &b_var).value(&cs), a - b);
        assert_eq!(a_var.mul(&mut cs, &b_var).value(&cs), a * b);
        assert_eq!(a_var.square(&mut cs).value(&cs), a * a);
        assert_eq!(a_var.mul_add(&mut cs, &b_var, &c_var).value(&cs), a * b + c);
        assert_eq!(a_var.mul_const(&mut cs, c).value(&cs), a * c);
        assert_eq!(a_var.div(&mut cs, &b_var).value(&cs), a / b);
        assert_eq!(a_var.exp_u64(&mut cs, 13).value(&cs), a.exp_u64(13));
        assert_eq!(a_var.exp_power_of_2(&mut cs, 4).value(&cs), a.exp_u64(16));

        let s = GoldilocksField::from_canonical_u64(rng.next_u64() % GOLDILOCKS_MODULUS);
        let s_var = GoldilocksVar::alloc_witness(&mut cs, s);
        assert_eq!(a_var.scalar_mul(&mut cs, &s_var).value(&cs), a * QuadraticExtension([s, GoldilocksField::ZERO]));

        let inv = a_var.inverse(&mut cs);
        assert_eq!(inv.value(&cs) * a, GoldilocksExt::ONE);
        let prod = inv.mul(&mut cs, &a_var);
        let one = ExtVar::one(&cs);
        prod.assert_is_equal(&mut cs, &one);

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        witness[inv.0[1].var].add_assign(&F::one());
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }

    #[test]
    fn test_reduce_with_powers_and_inner_product() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let terms = (0..5).map(|_| random_ext(&mut rng)).collect::<Vec<_>>();
        let alpha = random_ext(&mut rng);
        let term_vars = terms
            .iter()
            .map(|t| ExtVar::alloc_witness(&mut cs, *t))
            .collect::<Vec<_>>();
        let alpha_var = ExtVar::alloc_witness(&mut cs, alpha);

        let reduced = ExtVar::reduce_with_powers(&mut cs, &term_vars, &alpha_var);
        let mut expected = GoldilocksExt::ZERO;
        let mut power = GoldilocksExt::ONE;
        for t in terms.iter() {
            expected += *t * power;
            power *= alpha;
        }
        assert_eq!(reduced.value(&cs), expected);

        let pairs = term_vars
            .iter()
            .map(|t| (*t, alpha_var))
            .collect::<Vec<_>>();
        let ip = ExtVar::inner_product(&mut cs, &pairs);
        let expected: GoldilocksExt = terms.iter().map(|t| *t * alpha).sum();
        assert_eq!(ip.value(&cs), expected);

        let mut witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
        witness[reduced.0[0].var].add_assign(&F::one());
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }

    #[test]
    fn test_ext_zero_and_selection() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let values = [0, 1, 2, 3].map(|_| random_ext(&mut rng));
        let vars = values.map(|v| ExtVar::alloc_witness(&mut cs, v));
        let zero_var = cs.zero_var();
        let one_var = cs.one_var();

        let picked = ExtVar::lookup2(&mut cs, one_var, one_var, &vars);
        assert_eq!(picked.value(&cs), values[3]);
        let picked = ExtVar::select(&mut cs, &vars[0], &vars[1], zero_var);
        assert_eq!(picked.value(&cs), values[0]);

        let zero = ExtVar::alloc_witness(&mut cs, GoldilocksExt::ZERO);
        let is_zero = zero.is_zero(&mut cs);
        assert_eq!(cs.witness[is_zero], F::one());
        let half_zero = ExtVar::alloc_witness(
            &mut cs,
            QuadraticExtension([GoldilocksField::ZERO, GoldilocksField::ONE]),
        );
        let is_zero = half_zero.is_zero(&mut cs);
        assert_eq!(cs.witness[is_zero], F::zero());

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }

    #[test]
    fn test_inverse_of_zero_is_unsatisfiable() {
        let mut cs = TurboCS::<F>::new();
        let zero = ExtVar::alloc_witness(&mut cs, GoldilocksExt::ZERO);
        zero.inverse(&mut cs);
        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_err());
    }

    #[test]
    fn test_ext_algebra_mul() {
        let mut rng = test_rng();
        let mut cs = TurboCS::<F>::new();
        let a = [random_ext(&mut rng), random_ext(&mut rng)];
        let b = [random_ext(&mut rng), random_ext(&mut rng)];
        let a_var = ExtAlgebraVar([
            ExtVar::alloc_witness(&mut cs, a[0]),
            ExtVar::alloc_witness(&mut cs, a[1]),
        ]);
        let b_var = ExtAlgebraVar([
            ExtVar::alloc_witness(&mut cs, b[0]),
            ExtVar::alloc_witness(&mut cs, b[1]),
        ]);

        let w = GoldilocksField::from_canonical_u64(7);
        let prod = a_var.mul(&mut cs, &b_var).to_basefield_array();
        assert_eq!(prod[0].value(&cs), a[0] * b[0] + FieldExtension::<2>::scalar_mul(&(a[1] * b[1]), w));
        assert_eq!(prod[1].value(&cs), a[0] * b[1] + a[1] * b[0]);

        let sum = a_var.add(&mut cs, &b_var).to_basefield_array();
        assert_eq!(sum[1].value(&cs), a[1] + b[1]);
        let diff = a_var.sub(&mut cs, &b_var).to_basefield_array();
        assert_eq!(diff[0].value(&cs), a[0] - b[0]);

        let s = random_ext(&mut rng);
        let s_var = ExtVar::alloc_witness(&mut cs, s);
        let scaled = a_var.scalar_mul(&mut cs, &s_var).to_basefield_array();
        assert_eq!(scaled[1].value(&cs), a[1] * s);

        let embedded = ExtAlgebraVar::from_ext(&cs, s_var);
        let one = ExtAlgebraVar::one(&cs);
        let zero = ExtAlgebraVar::zero(&cs);
        let e = embedded.mul_add(&mut cs, &one, &zero);
        assert_eq!(e.0[0].value(&cs), s);

        let witness = cs.get_and_clear_witness();
        assert!(cs.verify_witness(&witness, &[]).is_ok());
    }
}
