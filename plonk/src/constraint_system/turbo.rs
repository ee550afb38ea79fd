//! The TurboPLONK-style host constraint system. Every gate has five wires and
//! twelve selectors; on top of arithmetic, boolean and range gates it offers
//! selections, lookups, hinted witnesses and a fifth-power gate used by the
//! BN254 Poseidon chip.
use super::{ConstraintSystem, CsIndex, VarIndex};
use crate::errors::{PlonkError, Result};
use plover_algebra::prelude::*;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The wires number of a gate in Turbo CS.
pub const N_WIRES_PER_GATE: usize = 5;

/// The selectors number in Turbo CS.
pub const N_SELECTORS: usize = 12;

/// Turbo PLONK Constraint System.
#[derive(Serialize, Deserialize)]
pub struct TurboCS<F> {
    /// the selectors of the circuit.
    pub selectors: Vec<Vec<F>>,
    /// the wiring of the circuit.
    pub wiring: [Vec<VarIndex>; N_WIRES_PER_GATE],
    /// the number of variable.
    pub num_vars: usize,
    /// the size of circuit.
    pub size: usize,
    /// the public constraint variables indices.
    pub public_vars_constraint_indices: Vec<CsIndex>,
    /// the public witness variables indices.
    pub public_vars_witness_indices: Vec<VarIndex>,
    /// the gates with boolean constraint.
    pub boolean_constraint_indices: Vec<CsIndex>,
    /// A private witness for the circuit, cleared after computing a proof.
    pub witness: Vec<F>,
    /// record witness backtracking info for checking dangling witness
    #[cfg(all(feature = "debug", nightly))]
    #[serde(skip)]
    pub witness_backtrace: HashMap<VarIndex, std::backtrace::Backtrace>,
}

#[inline]
fn pow5<F: Scalar>(x: &F) -> F {
    x.square().square().mul(x)
}

impl<F: Scalar> ConstraintSystem for TurboCS<F> {
    type Field = F;

    fn size(&self) -> usize {
        self.size
    }

    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn wiring(&self) -> &[Vec<usize>] {
        &self.wiring[..]
    }

    fn n_wires_per_gate() -> usize {
        N_WIRES_PER_GATE
    }

    fn num_selectors(&self) -> usize {
        N_SELECTORS
    }

    fn public_vars_constraint_indices(&self) -> &[CsIndex] {
        &self.public_vars_constraint_indices
    }

    fn public_vars_witness_indices(&self) -> &[VarIndex] {
        &self.public_vars_witness_indices
    }

    fn selector(&self, index: usize) -> Result<&[F]> {
        if index >= self.selectors.len() {
            return Err(PlonkError::FuncParamsError);
        }
        Ok(&self.selectors[index])
    }

    /// The equation is
    /// ```text
    ///     q1*w1 + q2*w2 + q3*w3 + q4*w4 + qm1(w1*w2) + qm2(w3*w4) + qc + PI
    ///     + q_hash_1 * w1^5 + q_hash_2 * w2^5 + q_hash_3 * w3^5 + q_hash_4 * w4^5
    ///     - qo * wo = 0
    /// ```
    fn eval_gate_func(wire_vals: &[&F], sel_vals: &[&F], pub_input: &F) -> Result<F> {
        if wire_vals.len() != N_WIRES_PER_GATE || sel_vals.len() != N_SELECTORS {
            return Err(PlonkError::FuncParamsError);
        }
        let mut r = sel_vals[6].add(pub_input);
        for i in 0..4 {
            if !sel_vals[i].is_zero() {
                r.add_assign(&sel_vals[i].mul(wire_vals[i]));
            }
            if !sel_vals[7 + i].is_zero() {
                r.add_assign(&sel_vals[7 + i].mul(&pow5(wire_vals[i])));
            }
        }
        if !sel_vals[4].is_zero() {
            r.add_assign(&sel_vals[4].mul(&wire_vals[0].mul(wire_vals[1])));
        }
        if !sel_vals[5].is_zero() {
            r.add_assign(&sel_vals[5].mul(&wire_vals[2].mul(wire_vals[3])));
        }
        r.sub_assign(&sel_vals[11].mul(wire_vals[4]));
        Ok(r)
    }
}

/// A helper function that computes the little-endian binary
/// representation of a value. Each bit is represented as a field
/// element.
fn compute_binary_le<F: Scalar>(bytes: &[u8]) -> Vec<F> {
    let mut res = vec![];
    for byte in bytes.iter() {
        let mut tmp = *byte;
        for _ in 0..8 {
            if (tmp & 1) == 0 {
                res.push(F::zero());
            } else {
                res.push(F::one());
            }
            tmp >>= 1;
        }
    }
    res
}

impl<F: Scalar> Default for TurboCS<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Scalar> TurboCS<F> {
    /// Create a TurboPLONK constraint system with a certain field size.
    /// With default witness [F::zero(), F::one()].
    pub fn new() -> TurboCS<F> {
        let selectors: Vec<Vec<F>> = std::iter::repeat(vec![]).take(N_SELECTORS).collect();
        TurboCS {
            selectors,
            wiring: [vec![], vec![], vec![], vec![], vec![]],
            num_vars: 2,
            size: 0,
            public_vars_constraint_indices: vec![],
            public_vars_witness_indices: vec![],
            boolean_constraint_indices: vec![],
            witness: vec![F::zero(), F::one()],

            #[cfg(all(feature = "debug", nightly))]
            witness_backtrace: HashMap::new(),
        }
    }

    /// 0-index is Zero
    pub fn zero_var(&self) -> VarIndex {
        0
    }

    /// 1-index is One
    pub fn one_var(&self) -> VarIndex {
        1
    }

    /// Add a linear combination gate: wo = w1 * q1 + w2 * q2 + w3 * q3 + w4 * q4.
    pub fn insert_lc_gate(
        &mut self,
        wires_in: &[VarIndex; 4],
        wire_out: VarIndex,
        q1: F,
        q2: F,
        q3: F,
        q4: F,
    ) {
        self.insert_lc_gate_with_constant(wires_in, wire_out, [q1, q2, q3, q4], F::zero());
    }

    /// Add a linear combination gate with a constant term:
    /// wo = w1 * q1 + w2 * q2 + w3 * q3 + w4 * q4 + qc.
    pub fn insert_lc_gate_with_constant(
        &mut self,
        wires_in: &[VarIndex; 4],
        wire_out: VarIndex,
        coefs: [F; 4],
        constant: F,
    ) {
        assert!(
            wires_in.iter().all(|&x| x < self.num_vars),
            "input wire index out of bound"
        );
        assert!(wire_out < self.num_vars, "wire_out index out of bound");
        let zero = F::zero();
        self.push_add_selectors(coefs[0], coefs[1], coefs[2], coefs[3]);
        self.push_mul_selectors(zero, zero);
        self.push_constant_selector(constant);
        self.push_power_five_selectors(zero, zero, zero, zero);
        self.push_out_selector(F::one());
        for (i, wire) in wires_in.iter().enumerate() {
            self.wiring[i].push(*wire);
        }
        self.wiring[4].push(wire_out);
        self.finish_new_gate();
    }

    /// Add an Add gate. (left, right, out).
    pub fn insert_add_gate(&mut self, left_var: VarIndex, right_var: VarIndex, out_var: VarIndex) {
        self.insert_lc_gate(
            &[left_var, right_var, 0, 0],
            out_var,
            F::one(),
            F::one(),
            F::zero(),
            F::zero(),
        );
    }

    /// Add a Sub gate. (left, right, out).
    pub fn insert_sub_gate(&mut self, left_var: VarIndex, right_var: VarIndex, out_var: VarIndex) {
        self.insert_lc_gate(
            &[left_var, right_var, 0, 0],
            out_var,
            F::one(),
            F::one().neg(),
            F::zero(),
            F::zero(),
        );
    }

    /// Add a Mul gate. (left, right, out).
    pub fn insert_mul_gate(&mut self, left_var: VarIndex, right_var: VarIndex, out_var: VarIndex) {
        assert!(left_var < self.num_vars, "left_var index out of bound");
        assert!(right_var < self.num_vars, "right_var index out of bound");
        assert!(out_var < self.num_vars, "out_var index out of bound");
        let zero = F::zero();
        self.push_add_selectors(zero, zero, zero, zero);
        self.push_mul_selectors(F::one(), zero);
        self.push_constant_selector(zero);
        self.push_power_five_selectors(zero, zero, zero, zero);
        self.push_out_selector(F::one());
        self.wiring[0].push(left_var);
        self.wiring[1].push(right_var);
        self.wiring[2].push(0);
        self.wiring[3].push(0);
        self.wiring[4].push(out_var);
        self.finish_new_gate();
    }

    /// Add a gate `wo = Σ q_i·w_i + Σ qh_i·w_i^5 + qc`, the round gate of the
    /// BN254 Poseidon permutation.
    pub fn insert_power_five_gate(
        &mut self,
        wires_in: &[VarIndex; 4],
        wire_out: VarIndex,
        linear: &[F; 4],
        power_five: &[F; 4],
        constant: F,
    ) {
        assert!(
            wires_in.iter().all(|&x| x < self.num_vars),
            "input wire index out of bound"
        );
        assert!(wire_out < self.num_vars, "wire_out index out of bound");
        let zero = F::zero();
        self.push_add_selectors(linear[0], linear[1], linear[2], linear[3]);
        self.push_mul_selectors(zero, zero);
        self.push_constant_selector(constant);
        self.push_power_five_selectors(power_five[0], power_five[1], power_five[2], power_five[3]);
        self.push_out_selector(F::one());
        for (i, wire) in wires_in.iter().enumerate() {
            self.wiring[i].push(*wire);
        }
        self.wiring[4].push(wire_out);
        self.finish_new_gate();
    }

    /// Create an output variable and insert a fifth-power gate.
    pub fn power_five_combine(
        &mut self,
        wires_in: &[VarIndex; 4],
        linear: &[F; 4],
        power_five: &[F; 4],
        constant: F,
    ) -> VarIndex {
        let mut out = constant;
        for i in 0..4 {
            let w = &self.witness[wires_in[i]];
            if !linear[i].is_zero() {
                out.add_assign(&linear[i].mul(w));
            }
            if !power_five[i].is_zero() {
                out.add_assign(&power_five[i].mul(&pow5(w)));
            }
        }
        let out_var = self.new_variable(out);
        self.insert_power_five_gate(wires_in, out_var, linear, power_five, constant);
        out_var
    }

    /// Add a variable (with actual value `value`) into the constraint system.
    pub fn new_variable(&mut self, value: F) -> VarIndex {
        self.num_vars += 1;
        self.witness.push(value);

        #[cfg(all(feature = "debug", nightly))]
        {
            self.witness_backtrace
                .insert(self.num_vars - 1, std::backtrace::Backtrace::capture());
        }

        self.num_vars - 1
    }

    /// Add a variable fixed to `value` by a constant gate.
    pub fn new_constant_variable(&mut self, value: F) -> VarIndex {
        let var = self.new_variable(value);
        self.insert_constant_gate(var, value);
        var
    }

    /// Allocate the outputs of a hint: `hint` receives the current values of
    /// `inputs` and must return `n_outputs` values. The caller constrains
    /// the outputs.
    pub fn new_hint<H>(&mut self, inputs: &[VarIndex], n_outputs: usize, hint: H) -> Vec<VarIndex>
    where
        H: FnOnce(&[F]) -> Vec<F>,
    {
        assert!(
            inputs.iter().all(|&x| x < self.num_vars),
            "hint input index out of bound"
        );
        let values = inputs.iter().map(|&v| self.witness[v]).collect_vec();
        let outputs = hint(&values);
        assert_eq!(
            outputs.len(),
            n_outputs,
            "the hint returned a wrong number of outputs"
        );
        outputs
            .into_iter()
            .map(|value| self.new_variable(value))
            .collect()
    }

    /// Check if the gate is satisfied.
    #[cfg(feature = "debug")]
    pub fn finish_new_gate(&mut self) {
        self.size += 1;
        let cs_index = self.size - 1;
        let wire_vals = (0..N_WIRES_PER_GATE)
            .map(|i| self.witness[self.wiring[i][cs_index]])
            .collect_vec();
        let sel_vals = (0..N_SELECTORS)
            .map(|i| self.selectors[i][cs_index])
            .collect_vec();
        let r = Self::eval_gate_func(
            &wire_vals.iter().collect_vec(),
            &sel_vals.iter().collect_vec(),
            &F::zero(),
        );

        if !matches!(r, Ok(v) if v.is_zero()) {
            #[cfg(nightly)]
            {
                println!("{}", std::backtrace::Backtrace::capture());
            }
            println!("cs constraint {} not satisfied.", cs_index);
        }

        #[cfg(nightly)]
        for i in 0..N_WIRES_PER_GATE {
            let var = self.wiring[i][cs_index];
            self.witness_backtrace.remove(&var);
        }
    }

    #[cfg(not(feature = "debug"))]
    #[inline]
    /// Increase the gate count without checking.
    pub fn finish_new_gate(&mut self) {
        self.size += 1;
    }

    /// Create an output variable and insert a linear combination gate.
    pub fn linear_combine(
        &mut self,
        wires_in: &[VarIndex; 4],
        q1: F,
        q2: F,
        q3: F,
        q4: F,
    ) -> VarIndex {
        self.linear_combine_with_constant(wires_in, [q1, q2, q3, q4], F::zero())
    }

    /// Create an output variable and insert a linear combination gate with a
    /// constant term.
    pub fn linear_combine_with_constant(
        &mut self,
        wires_in: &[VarIndex; 4],
        coefs: [F; 4],
        constant: F,
    ) -> VarIndex {
        assert!(
            wires_in.iter().all(|&x| x < self.num_vars),
            "input wire index out of bound"
        );
        let mut lc = constant;
        for (w, q) in wires_in.iter().zip(coefs.iter()) {
            if !q.is_zero() {
                lc.add_assign(&self.witness[*w].mul(q));
            }
        }
        let wire_out = self.new_variable(lc);
        self.insert_lc_gate_with_constant(wires_in, wire_out, coefs, constant);
        wire_out
    }

    /// Create an output variable and insert an addition gate.
    pub fn add(&mut self, left_var: VarIndex, right_var: VarIndex) -> VarIndex {
        assert!(left_var < self.num_vars, "left_var index out of bound");
        assert!(right_var < self.num_vars, "right_var index out of bound");
        let out_var = self.new_variable(self.witness[left_var].add(&self.witness[right_var]));
        self.insert_add_gate(left_var, right_var, out_var);
        out_var
    }

    /// Create an output variable and insert a subraction gate.
    pub fn sub(&mut self, left_var: VarIndex, right_var: VarIndex) -> VarIndex {
        assert!(left_var < self.num_vars, "left_var index out of bound");
        assert!(right_var < self.num_vars, "right_var index out of bound");
        let out_var = self.new_variable(self.witness[left_var].sub(&self.witness[right_var]));
        self.insert_sub_gate(left_var, right_var, out_var);
        out_var
    }

    /// Create an output variable `var + constant`.
    pub fn add_constant(&mut self, var: VarIndex, constant: &F) -> VarIndex {
        self.linear_combine_with_constant(&[var, 0, 0, 0], [F::one(), F::zero(), F::zero(), F::zero()], *constant)
    }

    /// Create an output variable `var * constant`.
    pub fn mul_constant(&mut self, var: VarIndex, constant: &F) -> VarIndex {
        let zero = F::zero();
        self.linear_combine(&[var, 0, 0, 0], *constant, zero, zero, zero)
    }

    /// Add a constraint that `left_var` and `right_var` have the same value.
    pub fn equal(&mut self, left_var: VarIndex, right_var: VarIndex) {
        let zero_var = self.zero_var();
        self.insert_sub_gate(left_var, right_var, zero_var);
    }

    /// Create an output variable and insert a multiplication gate.
    pub fn mul(&mut self, left_var: VarIndex, right_var: VarIndex) -> VarIndex {
        assert!(left_var < self.num_vars, "left_var index out of bound");
        assert!(right_var < self.num_vars, "right_var index out of bound");
        let out_var = self.new_variable(self.witness[left_var].mul(&self.witness[right_var]));
        self.insert_mul_gate(left_var, right_var, out_var);
        out_var
    }

    /// Create an output variable `left * right + addend` with one gate.
    pub fn mul_add(&mut self, left_var: VarIndex, right_var: VarIndex, addend: VarIndex) -> VarIndex {
        assert!(left_var < self.num_vars, "left_var index out of bound");
        assert!(right_var < self.num_vars, "right_var index out of bound");
        assert!(addend < self.num_vars, "addend index out of bound");
        let value = self.witness[left_var]
            .mul(&self.witness[right_var])
            .add(&self.witness[addend]);
        let out_var = self.new_variable(value);
        let zero = F::zero();
        let one = F::one();
        self.push_add_selectors(zero, zero, one, zero);
        self.push_mul_selectors(one, zero);
        self.push_constant_selector(zero);
        self.push_power_five_selectors(zero, zero, zero, zero);
        self.push_out_selector(one);
        self.wiring[0].push(left_var);
        self.wiring[1].push(right_var);
        self.wiring[2].push(addend);
        self.wiring[3].push(0);
        self.wiring[4].push(out_var);
        self.finish_new_gate();
        out_var
    }

    /// Add a Boolean constrain `var` by adding a multiplication gate:
    /// `witness[var] * witness[var] = witness[var]`
    pub fn insert_boolean_gate(&mut self, var: VarIndex) {
        self.insert_mul_gate(var, var, var);
    }

    /// Enforce a range constraint: `0 <= witness[var] < 2^n_bits`:
    /// 1. Transform `witness[var]` into a binary vector and boolean
    ///    constrain the binary vector.
    /// 2. Add a set of linear combination constraints showing that
    ///    the binary vector is a binary representation of
    ///    `witness[var]`.
    /// 3. Return witness indices of the binary vector. The binary
    ///    vector is in little endian form.
    pub fn range_check(&mut self, var: VarIndex, n_bits: usize) -> Vec<VarIndex> {
        assert!(var < self.num_vars, "var index out of bound");
        match n_bits {
            0 => {
                self.insert_constant_gate(var, F::zero());
                return vec![];
            }
            1 => {
                self.insert_boolean_gate(var);
                return vec![var];
            }
            _ => {}
        }
        let witness_bytes = self.witness[var].to_bytes();
        let mut binary_repr = compute_binary_le::<F>(&witness_bytes);
        while binary_repr.len() < n_bits {
            binary_repr.push(F::zero());
        }

        let b: Vec<VarIndex> = binary_repr
            .into_iter()
            .take(n_bits)
            .map(|val| self.new_variable(val))
            .collect();

        let one = F::one();
        let two = one.add(&one);
        let four = two.add(&two);
        let eight = four.add(&four);
        let bin = vec![one, two, four, eight];

        let mut acc = b[n_bits - 1];
        self.insert_boolean_gate(b[n_bits - 1]);
        let m = (n_bits - 2) / 3;
        for i in 0..m {
            acc = self.linear_combine(
                &[
                    acc,
                    b[n_bits - 1 - i * 3 - 1],
                    b[n_bits - 1 - i * 3 - 2],
                    b[n_bits - 1 - i * 3 - 3],
                ],
                bin[3],
                bin[2],
                bin[1],
                bin[0],
            );
            self.attach_boolean_constraint_to_gate();
        }
        let zero = F::zero();
        match (n_bits - 1) - 3 * m {
            1 => self.insert_lc_gate(&[acc, b[0], 0, 0], var, bin[1], bin[0], zero, zero),
            2 => self.insert_lc_gate(&[acc, b[1], b[0], 0], var, bin[2], bin[1], bin[0], zero),
            _ => self.insert_lc_gate(
                &[acc, b[2], b[1], b[0]],
                var,
                bin[3],
                bin[2],
                bin[1],
                bin[0],
            ),
        }
        self.attach_boolean_constraint_to_gate();
        b
    }

    /// Decompose `var` into `n_bits` little-endian bits, constrained to
    /// recompose to `var`.
    pub fn to_binary(&mut self, var: VarIndex, n_bits: usize) -> Vec<VarIndex> {
        self.range_check(var, n_bits)
    }

    /// Recompose little-endian bits into a variable. The bits are assumed to
    /// be boolean-constrained already.
    pub fn from_binary(&mut self, bits: &[VarIndex]) -> VarIndex {
        let zero_var = self.zero_var();
        let one = F::one();
        let two = one.add(&one);
        let mut acc = zero_var;
        let mut coef = one;
        for chunk in bits.chunks(3) {
            let mut wires = [acc, zero_var, zero_var, zero_var];
            let mut coefs = [one, F::zero(), F::zero(), F::zero()];
            for (i, bit) in chunk.iter().enumerate() {
                wires[i + 1] = *bit;
                coefs[i + 1] = coef;
                coef = coef.mul(&two);
            }
            acc = self.linear_combine(&wires, coefs[0], coefs[1], coefs[2], coefs[3]);
        }
        acc
    }

    /// Given two variables `var0` and `var1` and a boolean variable `bit`, return var_bit.
    /// var_bit = (1-bit) * var0 + bit * var1 = - bit * var0 + bit * var1 + var0
    /// Wires: (w1, w2, w3 , w4) = (bit, var0, bit, var1)
    /// Selectors: q2 = qm2 = qo = 1, qm1 = -1
    pub fn select(&mut self, var0: VarIndex, var1: VarIndex, bit: VarIndex) -> VarIndex {
        assert!(var0 < self.num_vars, "var0 index out of bound");
        assert!(var1 < self.num_vars, "var1 index out of bound");
        assert!(bit < self.num_vars, "bit var index out of bound");
        let zero = F::zero();
        let one = F::one();
        self.push_add_selectors(zero, one, zero, zero);
        self.push_mul_selectors(one.neg(), one);
        self.push_constant_selector(zero);
        self.push_power_five_selectors(zero, zero, zero, zero);
        self.push_out_selector(one);
        let out = if self.witness[bit] == zero {
            self.witness[var0]
        } else {
            self.witness[var1]
        };
        let out_var = self.new_variable(out);
        self.wiring[0].push(bit);
        self.wiring[1].push(var0);
        self.wiring[2].push(bit);
        self.wiring[3].push(var1);
        self.wiring[4].push(out_var);
        self.finish_new_gate();
        out_var
    }

    /// Select `values[b0 + 2·b1]` with two boolean variables.
    pub fn lookup2(&mut self, b0: VarIndex, b1: VarIndex, values: &[VarIndex; 4]) -> VarIndex {
        let low = self.select(values[0], values[1], b0);
        let high = self.select(values[2], values[3], b0);
        self.select(low, high, b1)
    }

    /// Return a boolean variable that equals 1 if and
    /// only if `left_var` == `right_var`.
    pub fn is_equal(&mut self, left_var: VarIndex, right_var: VarIndex) -> VarIndex {
        let (is_equal, _) = self.is_equal_or_not_equal(left_var, right_var);
        is_equal
    }

    /// Return a boolean variable that equals 1 if and
    /// only if `left_var` != `right_var`.
    pub fn is_not_equal(&mut self, left_var: VarIndex, right_var: VarIndex) -> VarIndex {
        let (_, is_not_equal) = self.is_equal_or_not_equal(left_var, right_var);
        is_not_equal
    }

    /// Return a boolean variable that equals 1 if and only if `var` is zero.
    pub fn is_zero(&mut self, var: VarIndex) -> VarIndex {
        let zero_var = self.zero_var();
        self.is_equal(var, zero_var)
    }

    /// Return two boolean variables that equals (1, 0) if and
    /// only if `left_var` == `right_var` and (0, 1) otherwise.
    pub fn is_equal_or_not_equal(
        &mut self,
        left_var: VarIndex,
        right_var: VarIndex,
    ) -> (VarIndex, VarIndex) {
        let diff = self.sub(left_var, right_var);
        // `inv_diff` is arbitrary when `diff` == 0
        let inv_diff_scalar = self.witness[diff].inv().unwrap_or_else(|_| F::zero());
        let inv_diff = self.new_variable(inv_diff_scalar);

        // `diff_is_zero` = 1 - `diff` * `inv_diff`
        let mul_var = self.mul(diff, inv_diff);
        let one_var = self.one_var();
        let diff_is_zero = self.sub(one_var, mul_var);

        // `diff` * `diff_is_zero` == 0
        let zero_var = self.zero_var();
        self.insert_mul_gate(diff, diff_is_zero, zero_var);

        (diff_is_zero, mul_var)
    }

    /// Return the inverse of `var`, constrained by `var * inv = 1`. A zero
    /// input yields an unsatisfiable witness.
    pub fn inverse(&mut self, var: VarIndex) -> VarIndex {
        let inv = self.new_hint(&[var], 1, |v| vec![v[0].inv().unwrap_or_else(|_| F::zero())])[0];
        let one_var = self.one_var();
        self.insert_mul_gate(var, inv, one_var);
        inv
    }

    /// Add a constant constraint: wo = constant.
    pub fn insert_constant_gate(&mut self, var: VarIndex, constant: F) {
        assert!(var < self.num_vars, "variable index out of bound");
        let zero = F::zero();
        self.push_add_selectors(zero, zero, zero, zero);
        self.push_mul_selectors(zero, zero);
        self.push_constant_selector(constant);
        self.push_power_five_selectors(zero, zero, zero, zero);
        self.push_out_selector(F::one());
        for i in 0..N_WIRES_PER_GATE {
            self.wiring[i].push(var);
        }

        #[cfg(all(feature = "debug", nightly))]
        let backtrace = { self.witness_backtrace.remove(&var) };

        self.finish_new_gate();

        #[cfg(all(feature = "debug", nightly))]
        {
            match backtrace {
                Some(v) => self.witness_backtrace.insert(var, v),
                None => None,
            };
        }
    }

    /// Add a constant constraint: wo = constant, for prepare_pi_variable.
    pub fn insert_constant_gate_for_input(&mut self, var: VarIndex, constant: F) {
        assert!(var < self.num_vars, "variable index out of bound");
        let zero = F::zero();
        self.push_add_selectors(zero, zero, zero, zero);
        self.push_mul_selectors(zero, zero);
        self.push_constant_selector(constant);
        self.push_power_five_selectors(zero, zero, zero, zero);
        self.push_out_selector(F::one());
        for i in 0..N_WIRES_PER_GATE {
            self.wiring[i].push(var);
        }
        self.size += 1;
    }

    /// Add constraint of a public IO value to be decided online.
    pub fn prepare_pi_variable(&mut self, var: VarIndex) {
        self.public_vars_witness_indices.push(var);
        self.public_vars_constraint_indices.push(self.size);
        self.insert_constant_gate_for_input(var, F::zero());
    }

    /// Add constraint that certain values must be one or zero.
    pub fn attach_boolean_constraint_to_gate(&mut self) {
        self.boolean_constraint_indices.push(self.size - 1);
    }

    /// Pad the number of constraints to a power of two.
    pub fn pad(&mut self) {
        let n = self.size.next_power_of_two();
        let diff = n - self.size();
        for selector in self.selectors.iter_mut() {
            selector.extend(vec![F::zero(); diff]);
        }
        for wire in self.wiring.iter_mut() {
            wire.extend(vec![0; diff]);
        }
        self.size += diff;

        #[cfg(all(feature = "debug", nightly))]
        {
            if let Some(v) = self.witness_backtrace.values().next() {
                panic!("dangling witness:\n{}", v);
            }
        }
    }

    /// Add a Add selectors.
    pub fn push_add_selectors(&mut self, q1: F, q2: F, q3: F, q4: F) {
        self.selectors[0].push(q1);
        self.selectors[1].push(q2);
        self.selectors[2].push(q3);
        self.selectors[3].push(q4);
    }

    /// Add a Mul selectors.
    pub fn push_mul_selectors(&mut self, q_mul12: F, q_mul34: F) {
        self.selectors[4].push(q_mul12);
        self.selectors[5].push(q_mul34);
    }

    /// Add a constant selectors.
    pub fn push_constant_selector(&mut self, q_c: F) {
        self.selectors[6].push(q_c);
    }

    /// Add the fifth-power selectors.
    pub fn push_power_five_selectors(&mut self, q_pow_1: F, q_pow_2: F, q_pow_3: F, q_pow_4: F) {
        self.selectors[7].push(q_pow_1);
        self.selectors[8].push(q_pow_2);
        self.selectors[9].push(q_pow_3);
        self.selectors[10].push(q_pow_4);
    }

    /// Add an Out selectors.
    pub fn push_out_selector(&mut self, q_out: F) {
        self.selectors[11].push(q_out);
    }

    /// Return the witness index for given wire and cs index.
    fn get_witness_index(&self, wire_index: usize, cs_index: CsIndex) -> VarIndex {
        assert!(wire_index < N_WIRES_PER_GATE, "wire index out of bound");
        assert!(cs_index < self.size, "constraint index out of bound");
        self.wiring[wire_index][cs_index]
    }

    fn check_gate(
        &self,
        witness: &[F],
        cs_index: CsIndex,
        public_online: &HashMap<CsIndex, F>,
        boolean_gates: &HashSet<CsIndex>,
    ) -> Result<()> {
        let pub_input = public_online.get(&cs_index).copied().unwrap_or_else(F::zero);
        let wire_vals = (0..N_WIRES_PER_GATE)
            .map(|i| &witness[self.get_witness_index(i, cs_index)])
            .collect_vec();
        let sel_vals: Vec<&F> = (0..N_SELECTORS)
            .map(|i| &self.selectors[i][cs_index])
            .collect();
        let eval_gate = Self::eval_gate_func(&wire_vals, &sel_vals, &pub_input)?;
        if !eval_gate.is_zero() {
            return Err(PlonkError::UnsatisfiedWitness(cs_index));
        }
        // the bits of a range check sit on wires 2, 3 and 4
        if boolean_gates.contains(&cs_index)
            && wire_vals[1..4]
                .iter()
                .any(|w| !w.mul(*w).sub(*w).is_zero())
        {
            return Err(PlonkError::UnsatisfiedWitness(cs_index));
        }
        Ok(())
    }

    /// Verify the given witness and publics.
    pub fn verify_witness(&self, witness: &[F], online_vars: &[F]) -> Result<()> {
        if witness.len() != self.num_vars {
            return Err(PlonkError::Message(format!(
                "witness len = {}, num_vars = {}",
                witness.len(),
                self.num_vars
            )));
        }
        if online_vars.len() != self.public_vars_witness_indices.len()
            || online_vars.len() != self.public_vars_constraint_indices.len()
        {
            return Err(PlonkError::Message(
                "wrong number of online variables".to_string(),
            ));
        }
        let mut public_online = HashMap::new();
        for ((c_i, w_i), online_var) in self
            .public_vars_constraint_indices
            .iter()
            .zip(self.public_vars_witness_indices.iter())
            .zip(online_vars.iter())
        {
            if witness[*w_i] != *online_var {
                return Err(PlonkError::Message(format!(
                    "cs index {}: online var {:?} does not match witness {:?}",
                    c_i, *online_var, witness[*w_i]
                )));
            }
            public_online.insert(*c_i, *online_var);
        }
        let boolean_gates: HashSet<CsIndex> =
            self.boolean_constraint_indices.iter().copied().collect();

        #[cfg(feature = "parallel")]
        {
            (0..self.size())
                .into_par_iter()
                .try_for_each(|cs_index| self.check_gate(witness, cs_index, &public_online, &boolean_gates))
        }

        #[cfg(not(feature = "parallel"))]
        {
            (0..self.size())
                .try_for_each(|cs_index| self.check_gate(witness, cs_index, &public_online, &boolean_gates))
        }
    }

    /// Extract and clear the entire witness of the circuit. The witness consists of
    /// secret inputs, public inputs, and the values of intermediate variables.
    pub fn get_and_clear_witness(&mut self) -> Vec<F> {
        let res = self.witness.clone();
        self.witness.clear();
        res
    }
}
